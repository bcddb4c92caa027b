//! Integration tests: every mutation is one undo step, history is bounded,
//! and share codes round-trip through the editor.

use bubble_core::{BubbleColor, LayoutKind, MemoryStore, Vec2};
use bubble_editor::*;
use pretty_assertions::assert_eq;

fn editor_with(config: EditorConfig) -> MindMap {
    let _ = env_logger::builder().is_test(true).try_init();
    MindMap::new(config, Box::new(MemoryStore::new()))
}

fn editor() -> MindMap {
    editor_with(EditorConfig::default())
}

fn key(m: &mut MindMap, key: &str, bits: u8) -> bool {
    m.handle_input(&InputEvent::Key {
        key: key.into(),
        modifiers: Modifiers::from_bits(bits),
    })
    .unwrap()
}

#[test]
fn undo_walks_back_and_redo_forward() {
    let mut m = editor();
    let root = m.create_root("root").unwrap();
    let child = m.create_branch(root, "child").unwrap();
    m.set_text(child, "renamed").unwrap();
    let done = m.graph().to_records();

    assert_eq!(m.undo().unwrap().as_deref(), Some("edit text"));
    assert_eq!(m.graph().get_by_id(child).unwrap().text(), "child");
    m.undo().unwrap();
    m.undo().unwrap();
    assert!(m.graph().is_empty());
    assert_eq!(m.undo().unwrap(), None);

    for _ in 0..3 {
        m.redo().unwrap();
    }
    assert_eq!(m.graph().to_records(), done);
    assert!(!m.can_redo());
}

#[test]
fn new_mutation_drops_redo() {
    let mut m = editor();
    let root = m.create_root("root").unwrap();
    m.set_color(root, BubbleColor::Custom("#ff0000".into())).unwrap();
    m.undo().unwrap();
    assert!(m.can_redo());
    m.set_radius(root, 90.0).unwrap();
    assert!(!m.can_redo());
    assert_eq!(m.graph().get_by_id(root).unwrap().radius(), 90.0);
}

#[test]
fn history_is_bounded() {
    let mut m = editor_with(EditorConfig {
        undo_depth: 3,
        ..EditorConfig::default()
    });
    for i in 0..5 {
        m.create_root(&format!("n{i}")).unwrap();
    }
    let mut undone = 0;
    while m.undo().unwrap().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(m.graph().len(), 2);
}

#[test]
fn refused_mutations_leave_history_alone() {
    let mut m = editor();
    let root = m.create_root("root").unwrap();
    let child = m.create_branch(root, "child").unwrap();
    m.undo().unwrap();
    m.redo().unwrap();

    assert!(matches!(m.connect(root, child), Err(EditError::Graph(_))));
    assert!(matches!(m.set_text(root, "  "), Err(EditError::EmptyText)));
    assert!(matches!(m.import("not a code"), Err(EditError::Codec(_))));
    assert!(!m.can_redo());
    assert_eq!(m.undo().unwrap().as_deref(), Some("create"));
}

#[test]
fn keyboard_shortcuts_drive_history() {
    let mut m = editor();
    m.create_root("root").unwrap();
    assert!(key(&mut m, "z", 1));
    assert!(m.graph().is_empty());
    assert!(key(&mut m, "Z", 1 | 2));
    assert_eq!(m.graph().len(), 1);
    assert!(!key(&mut m, "q", 1));
}

#[test]
fn clear_all_is_one_step() {
    let mut m = editor();
    let root = m.create_root("root").unwrap();
    m.create_branch(root, "a").unwrap();
    m.create_branch(root, "b").unwrap();

    m.clear_all().unwrap();
    assert!(m.graph().is_empty());
    m.undo().unwrap();
    assert_eq!(m.graph().len(), 3);
}

#[test]
fn share_code_imports_a_nudged_copy() {
    let mut m = editor();
    let root = m.create_root("root").unwrap();
    m.create_branch(root, "leaf").unwrap();
    let code = m.export(root).unwrap();

    let copies = m.import(&code).unwrap();
    assert_eq!(copies.len(), 2);
    assert_eq!(m.graph().len(), 4);
    assert!(!copies.contains(&root));

    let original = m.graph().get_by_id(root).unwrap().position;
    let copy = m.graph().get_by_id(copies[0]).unwrap().position;
    let shift = copy - original;
    assert!((shift.x - 40.0).abs() <= 0.5 && (shift.y - 40.0).abs() <= 0.5, "{shift:?}");

    let copy_root = m.graph().index_of(copies[0]).unwrap();
    let copy_leaf = m.graph().index_of(copies[1]).unwrap();
    assert_eq!(m.graph().parent(copy_leaf), Some(copy_root));

    m.undo().unwrap();
    assert_eq!(m.graph().len(), 2);
}

#[test]
fn arrange_moves_targets_then_physics_follows() {
    let mut m = editor();
    let root = m.create_root("root").unwrap();
    let kids: Vec<_> = (0..3).map(|i| m.create_branch(root, &format!("k{i}")).unwrap()).collect();
    let before: Vec<Vec2> = kids.iter().map(|k| m.graph().get_by_id(*k).unwrap().position).collect();

    assert_eq!(m.arrange(root, LayoutKind::Tree).unwrap(), 3);
    for (k, p) in kids.iter().zip(&before) {
        assert_eq!(m.graph().get_by_id(*k).unwrap().position, *p);
    }

    for frame in 0..2000 {
        m.frame(frame as f64 * 16.0);
    }
    for k in &kids {
        let b = m.graph().get_by_id(*k).unwrap();
        assert_eq!(b.position, b.target);
    }
}
