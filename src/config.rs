//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rxtree/rxtree.toml`
//! 3. Local config: an explicit file handed in by the compiler driver
//! 4. Environment variables: `RXTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{AstLimits, MAX_SEQUENCE_LEN};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("environment: {0}")]
    Environment(#[from] config::ConfigError),

    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Tree-context limits and checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AstSettings {
    /// Maximum number of nodes in one tree context
    pub max_nodes: usize,
    /// Maximum number of terms in one sequence (at most 65536)
    pub max_sequence_len: usize,
    /// Maximum number of copies produced when unrolling one quantifier
    pub max_unroll: usize,
    /// Verify structural invariants when freezing the tree
    pub verify_on_freeze: bool,
}

impl Default for AstSettings {
    fn default() -> Self {
        let limits = AstLimits::default();
        Self {
            max_nodes: limits.max_nodes,
            max_sequence_len: limits.max_sequence_len,
            max_unroll: limits.max_unroll,
            verify_on_freeze: limits.verify_on_freeze,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawAstSettings {
    pub max_nodes: Option<usize>,
    pub max_sequence_len: Option<usize>,
    pub max_unroll: Option<usize>,
    pub verify_on_freeze: Option<bool>,
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rxtree").map(|dirs| dirs.config_dir().join("rxtree.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawAstSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl AstSettings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawAstSettings) -> Self {
        Self {
            max_nodes: overlay.max_nodes.unwrap_or(self.max_nodes),
            max_sequence_len: overlay.max_sequence_len.unwrap_or(self.max_sequence_len),
            max_unroll: overlay.max_unroll.unwrap_or(self.max_unroll),
            verify_on_freeze: overlay.verify_on_freeze.unwrap_or(self.verify_on_freeze),
        }
    }

    /// Load settings with layered precedence, using the XDG global config.
    pub fn load(local: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_from(global_config_path().as_deref(), local)
    }

    /// Load settings from explicit global and local files; missing files are
    /// skipped, environment variables are applied last.
    #[instrument(level = "debug")]
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, SettingsError> {
        let mut current = Self::default();

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
                debug!(path = %path.display(), "merged config file");
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply RXTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RXTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        if let Ok(val) = config.get::<usize>("max_nodes") {
            settings.max_nodes = val;
        }
        if let Ok(val) = config.get::<usize>("max_sequence_len") {
            settings.max_sequence_len = val;
        }
        if let Ok(val) = config.get::<usize>("max_unroll") {
            settings.max_unroll = val;
        }
        if let Ok(val) = config.get_bool("verify_on_freeze") {
            settings.verify_on_freeze = val;
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_nodes == 0 {
            return Err(SettingsError::Invalid {
                key: "max_nodes",
                message: "must be positive".into(),
            });
        }
        if self.max_sequence_len == 0 || self.max_sequence_len > MAX_SEQUENCE_LEN {
            return Err(SettingsError::Invalid {
                key: "max_sequence_len",
                message: format!("must be within 1..={}", MAX_SEQUENCE_LEN),
            });
        }
        Ok(())
    }

    pub fn limits(&self) -> AstLimits {
        AstLimits {
            max_nodes: self.max_nodes,
            max_sequence_len: self.max_sequence_len,
            max_unroll: self.max_unroll,
            verify_on_freeze: self.verify_on_freeze,
        }
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
