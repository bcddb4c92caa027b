//! Integration tests: export a subtree to a share code and import it back.

use bubble_core::*;
use pretty_assertions::assert_eq;

fn decorated_tree() -> (SceneGraph, BubbleId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut sg = SceneGraph::new();
    let root = sg
        .insert(Bubble::new(BubbleId(10), "Plan", BubbleKind::Root, Vec2::new(400.0, 300.0)))
        .unwrap();

    let mut styled = Bubble::new(BubbleId(11), "Styled", BubbleKind::Branch, Vec2::new(600.0, 300.0));
    styled.set_color(BubbleColor::Custom("#f97316".into()));
    styled.set_radius(64.0);
    styled.set_line_style(LineStyle {
        color: "#111827".into(),
        width: 4.0,
        style: LineDash::Dotted,
    });
    styled.set_content(Some(Content {
        title: "Notes".into(),
        body: "line one\nline two".into(),
    }));
    let styled = sg.insert_child(root, styled).unwrap();

    let note = Bubble::new(BubbleId(12), "free text", BubbleKind::Textbox, Vec2::new(700.0, 420.0));
    sg.insert_child(styled, note).unwrap();

    let jump = Bubble::new(
        BubbleId(13),
        "docs",
        BubbleKind::Hyper {
            link: Hyperlink::Url("https://example.com/docs".into()),
        },
        Vec2::new(300.0, 200.0),
    );
    sg.insert_child(root, jump).unwrap();

    // not part of the exported subtree
    sg.insert(Bubble::new(BubbleId(20), "Other", BubbleKind::Root, Vec2::ZERO))
        .unwrap();
    (sg, BubbleId(10))
}

/// Attribute tuple compared across the round trip.
fn attrs(b: &Bubble) -> (String, &'static str, Option<Content>, BubbleColor, Option<f32>, LineStyle, Option<Hyperlink>) {
    (
        b.text().to_string(),
        b.kind.tag(),
        b.content.clone(),
        b.color.clone(),
        b.radius_override(),
        b.line_style.clone(),
        b.hyperlink().cloned(),
    )
}

#[test]
fn round_trip_preserves_attributes_and_shape() {
    let (mut sg, root) = decorated_tree();
    let code = export_subtree(&sg, root).unwrap();
    let before = sg.len();

    let created = import_code(&mut sg, &code, IMPORT_NUDGE).unwrap();
    assert_eq!(created.len(), 4);
    assert_eq!(sg.len(), before + 4);

    let originals = [10, 11, 13, 12].map(|id| sg.index_of(BubbleId(id)).unwrap());
    for (orig, copy) in originals.iter().zip(&created) {
        let (o, c) = (sg.get(*orig).unwrap(), sg.get(*copy).unwrap());
        assert_eq!(attrs(o), attrs(c));
        assert_ne!(o.id, c.id);
        assert_eq!(c.position, o.position + IMPORT_NUDGE);
        assert_eq!(c.target, c.position);
    }

    // isomorphic structure: same parent positions in BFS order
    let shape = |idxs: &[NodeIndex]| -> Vec<Option<usize>> {
        idxs.iter()
            .map(|i| sg.parent(*i).and_then(|p| idxs.iter().position(|x| *x == p)))
            .collect()
    };
    assert_eq!(shape(&originals), shape(&created));
    assert_eq!(shape(&created), vec![None, Some(0), Some(0), Some(1)]);
}

#[test]
fn exporting_a_branch_makes_it_a_root_on_import() {
    let (mut sg, _) = decorated_tree();
    let code = export_subtree(&sg, BubbleId(11)).unwrap();
    let created = import_code(&mut sg, &code, Vec2::ZERO).unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(sg.parent(created[0]), None);
    assert_eq!(sg.parent(created[1]), Some(created[0]));
}

#[test]
fn failed_import_leaves_graph_unchanged() {
    let (mut sg, _) = decorated_tree();
    let before = sg.to_records();
    for code in ["", "not base64!", "H4sIAAAAAAAA"] {
        assert!(import_code(&mut sg, code, IMPORT_NUDGE).is_err(), "{code:?}");
    }
    assert_eq!(sg.to_records(), before);
}
