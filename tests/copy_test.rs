//! Tests for deep copies used by quantifier unrolling

use std::collections::HashSet;

use rxtree::util::testing::init_test_setup;
use rxtree::{
    AstError, AstLimits, CharacterClass, LoopBounds, NodeId, NodeKind, RegexAst, SubtreeRootKind,
};

/// group(1){1,3} -> [seq [a, b, c], seq [(?=) -> group -> seq [d]]]
fn quantified_group(ast: &mut RegexAst) -> NodeId {
    let group = ast.new_capture_group(1).unwrap();
    ast.set_loop(group, Some(LoopBounds::new(1, Some(3)))).unwrap();

    let first = ast.new_sequence().unwrap();
    for c in ['a', 'b', 'c'] {
        let t = ast.new_character_class(CharacterClass::single(c)).unwrap();
        ast.append_term(first, t).unwrap();
    }
    ast.add_alternative(group, first).unwrap();

    let second = ast.new_sequence().unwrap();
    let look = ast
        .new_subtree_root(SubtreeRootKind::LookAhead { negated: true })
        .unwrap();
    let look_group = ast.new_group().unwrap();
    let look_seq = ast.new_sequence().unwrap();
    let d = ast.new_character_class(CharacterClass::single('d')).unwrap();
    ast.set_root_group(look, look_group).unwrap();
    ast.add_alternative(look_group, look_seq).unwrap();
    ast.append_term(look_seq, d).unwrap();
    ast.append_term(second, look).unwrap();
    ast.add_alternative(group, second).unwrap();
    group
}

fn subtree(ast: &RegexAst, node: NodeId) -> Vec<NodeId> {
    let mut out = vec![node];
    for &child in ast.children(node) {
        out.extend(subtree(ast, child));
    }
    out
}

/// Structural equality ignoring identities, parents and liveness.
fn assert_same_shape(ast: &RegexAst, left: NodeId, right: NodeId) {
    let l = ast.node(left).unwrap();
    let r = ast.node(right).unwrap();
    match (l.kind(), r.kind()) {
        (NodeKind::Sequence(_), NodeKind::Sequence(_)) => {}
        (NodeKind::Term(lt), NodeKind::Term(rt)) => {
            assert_eq!(lt.seq_index(), rt.seq_index());
            assert_eq!(l.kind_name(), r.kind_name());
            assert_eq!(l.as_group().map(|g| g.loop_bounds()), r.as_group().map(|g| g.loop_bounds()));
            assert_eq!(l.as_group().map(|g| g.capture_group()), r.as_group().map(|g| g.capture_group()));
        }
        _ => panic!("{} and {} differ in kind", left, right),
    }
    let lc = ast.children(left);
    let rc = ast.children(right);
    assert_eq!(lc.len(), rc.len());
    for (&lchild, &rchild) in lc.iter().zip(rc) {
        assert_eq!(ast.parent(rchild), Some(right));
        assert_same_shape(ast, lchild, rchild);
    }
}

#[test]
fn given_group_when_copying_then_copy_is_detached_deep_and_fresh() {
    init_test_setup();
    let mut ast = RegexAst::new();
    let group = quantified_group(&mut ast);
    let before = ast.len();

    let copy = ast.copy(group).unwrap();

    assert_ne!(copy, group);
    assert_eq!(ast.parent(copy), None);
    assert_eq!(ast.len(), before * 2);
    assert_same_shape(&ast, group, copy);

    let originals: HashSet<NodeId> = subtree(&ast, group).into_iter().collect();
    let copies: Vec<NodeId> = subtree(&ast, copy);
    assert!(copies.iter().all(|n| !originals.contains(n)));

    let original_ids: HashSet<u32> = originals.iter().map(|&n| ast.node(n).unwrap().id()).collect();
    assert!(copies
        .iter()
        .all(|&n| !original_ids.contains(&ast.node(n).unwrap().id())));
}

#[test]
fn given_terms_when_copying_sequence_then_order_and_seq_index_preserved() {
    let mut ast = RegexAst::new();
    let seq = ast.new_sequence().unwrap();
    let terms: Vec<NodeId> = ['x', 'y', 'z']
        .into_iter()
        .map(|c| {
            let t = ast.new_character_class(CharacterClass::single(c)).unwrap();
            ast.append_term(seq, t).unwrap();
            t
        })
        .collect();

    let copy = ast.copy(seq).unwrap();
    let copied = ast.children(copy).to_vec();
    assert_eq!(copied.len(), 3);
    for (i, (&orig, &dup)) in terms.iter().zip(&copied).enumerate() {
        assert_eq!(ast.seq_index(dup).unwrap(), i);
        assert_eq!(ast.seq_index(orig).unwrap(), i);
        let orig_cc = ast.node(orig).unwrap().as_term().unwrap().kind().clone();
        let dup_cc = ast.node(dup).unwrap().as_term().unwrap().kind().clone();
        assert_eq!(orig_cc, dup_cc);
    }
}

#[test]
fn given_dead_subtree_when_copying_then_copy_is_alive_and_original_stays_dead() {
    let mut ast = RegexAst::new();
    let group = quantified_group(&mut ast);
    ast.mark_as_dead(group);

    let copy = ast.copy(group).unwrap();
    assert!(subtree(&ast, copy).iter().all(|&n| !ast.is_dead(n)));
    assert!(subtree(&ast, group).iter().all(|&n| ast.is_dead(n)));
}

#[test]
fn given_copy_when_marking_dead_then_original_unaffected() {
    let mut ast = RegexAst::new();
    let root = ast.new_subtree_root(SubtreeRootKind::Root).unwrap();
    let top = ast.new_group().unwrap();
    let seq = ast.new_sequence().unwrap();
    ast.set_root_group(root, top).unwrap();
    ast.add_alternative(top, seq).unwrap();
    let group = quantified_group(&mut ast);
    ast.append_term(seq, group).unwrap();

    let copy = ast.copy(group).unwrap();
    let copy_leaf = *subtree(&ast, copy).last().unwrap();
    ast.mark_as_dead(copy_leaf);

    assert!(ast.is_dead(copy));
    assert!(subtree(&ast, group).iter().all(|&n| !ast.is_dead(n)));
    assert!(!ast.is_dead(root));
}

#[test]
fn given_look_ahead_copy_when_resolving_then_inner_terms_find_copied_boundary() {
    let mut ast = RegexAst::new();
    let look = ast
        .new_subtree_root(SubtreeRootKind::LookAhead { negated: false })
        .unwrap();
    let g = ast.new_group().unwrap();
    let s = ast.new_sequence().unwrap();
    let t = ast.new_back_reference(1).unwrap();
    ast.set_root_group(look, g).unwrap();
    ast.add_alternative(g, s).unwrap();
    ast.append_term(s, t).unwrap();

    let copy = ast.copy(look).unwrap();
    let copied_term = *subtree(&ast, copy).last().unwrap();
    assert_eq!(ast.subtree_root_parent(copied_term), Some(copy));
    assert_eq!(ast.subtree_root_parent(t), Some(look));
    assert!(ast.is_in_look_around(copied_term));
    assert!(!ast.is_in_look_behind(copied_term));
}

#[test]
fn given_node_limit_when_copying_then_error_and_nothing_allocated() {
    init_test_setup();
    let mut ast = RegexAst::with_limits(AstLimits {
        max_nodes: 8,
        ..AstLimits::default()
    });
    let root = ast.new_subtree_root(SubtreeRootKind::Root).unwrap();
    let top = ast.new_group().unwrap();
    let seq = ast.new_sequence().unwrap();
    ast.set_root_group(root, top).unwrap();
    ast.add_alternative(top, seq).unwrap();
    let group = ast.new_group().unwrap();
    let body = ast.new_sequence().unwrap();
    let x = ast.new_character_class(CharacterClass::single('x')).unwrap();
    ast.append_term(body, x).unwrap();
    ast.add_alternative(group, body).unwrap();
    ast.append_term(seq, group).unwrap();
    assert_eq!(ast.len(), 6);

    let err = ast.copy(group).unwrap_err();

    assert_eq!(err, AstError::NodeLimit { limit: 8 });
    assert_eq!(ast.len(), 6);
    assert!(ast.verify().is_ok());
    assert!(ast.nodes().all(|(_, n)| !n.is_dead()));
}
