//! Scene graph → display list.
//!
//! The display list is backend-agnostic: a host walks the items in order and
//! paints them with whatever 2D API it has. Links come first so bubbles sit on
//! top of them, then fading bubbles, then live bubbles in index order.

use crate::outline::{OUTLINE_SEGMENTS, blob_path, link_line, textbox_rect, to_point};
use bubble_core::model::{Bubble, BubbleColor, SceneGraph};
use bubble_core::BubbleId;
use kurbo::{BezPath, Line, Point, RoundedRect};

/// Colors for one appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: &'static str,
    pub grid: &'static str,
    /// Fill of bubbles whose color is `Default`.
    pub bubble_fill: &'static str,
    pub bubble_text: &'static str,
    pub textbox_fill: &'static str,
    pub textbox_border: &'static str,
    /// Ring around the selected bubble.
    pub active_ring: &'static str,
    /// Ring around descendants of the selected bubble.
    pub highlight_ring: &'static str,
    /// Stroke of links into highlighted bubbles.
    pub highlight_link: &'static str,
    pub highlight_link_width: f64,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.05)",
            bubble_fill: "#DBEAFE",
            bubble_text: "#1F2937",
            textbox_fill: "#FFFFFF",
            textbox_border: "#D1D5DB",
            active_ring: "#2563EB",
            highlight_ring: "rgba(96, 165, 250, 0.8)",
            highlight_link: "rgba(96, 165, 250, 0.8)",
            highlight_link_width: 3.0,
        }
    }

    pub fn dark() -> Self {
        Self {
            background: "#1C1C1E",
            grid: "rgba(255, 255, 255, 0.04)",
            bubble_fill: "#1E3A5F",
            bubble_text: "#F9FAFB",
            textbox_fill: "#2C2C2E",
            textbox_border: "#48484A",
            active_ring: "#60A5FA",
            highlight_ring: "rgba(96, 165, 250, 0.6)",
            highlight_link: "rgba(96, 165, 250, 0.8)",
            highlight_link_width: 3.0,
        }
    }
}

/// Fill for a bubble under `theme`.
pub fn fill_color<'a>(color: &'a BubbleColor, theme: &'a Theme) -> &'a str {
    match color {
        BubbleColor::Default => theme.bubble_fill,
        BubbleColor::Custom(c) => c,
    }
}

/// One paint operation.
#[derive(Debug, Clone)]
pub enum DrawItem {
    Link {
        line: Line,
        color: String,
        width: f64,
        dash: Vec<f64>,
    },
    Blob {
        id: BubbleId,
        path: BezPath,
        fill: String,
        ring: Option<String>,
        label: String,
        center: Point,
        font_size: f64,
        opacity: f64,
    },
    TextBox {
        id: BubbleId,
        shape: RoundedRect,
        fill: String,
        border: String,
        ring: Option<String>,
        text: String,
        font_size: f64,
        opacity: f64,
    },
}

impl DrawItem {
    pub fn bubble_id(&self) -> Option<BubbleId> {
        match self {
            DrawItem::Link { .. } => None,
            DrawItem::Blob { id, .. } | DrawItem::TextBox { id, .. } => Some(*id),
        }
    }
}

/// Build the display list for one frame.
///
/// `fading` holds bubbles already removed from the graph with their current
/// opacity in `[0, 1]`.
pub fn build_display_list(
    graph: &SceneGraph,
    fading: &[(&Bubble, f32)],
    time: f32,
    theme: &Theme,
) -> Vec<DrawItem> {
    let mut items = Vec::with_capacity(graph.len() * 2 + fading.len());

    for (_, child, link) in graph.links() {
        let Some(bubble) = graph.get(child) else {
            continue;
        };
        let style = &bubble.line_style;
        let (color, width) = if bubble.highlighted {
            (theme.highlight_link.to_string(), theme.highlight_link_width)
        } else {
            (style.color.clone(), style.width as f64)
        };
        items.push(DrawItem::Link {
            line: link_line(link),
            color,
            width,
            dash: style.style.pattern(style.width).iter().map(|d| *d as f64).collect(),
        });
    }

    for (bubble, opacity) in fading {
        items.push(bubble_item(bubble, time, theme, opacity.clamp(0.0, 1.0) as f64));
    }
    for (_, bubble) in graph.iter() {
        items.push(bubble_item(bubble, time, theme, 1.0));
    }
    log::trace!("display list: {} items", items.len());
    items
}

fn bubble_item(bubble: &Bubble, time: f32, theme: &Theme, opacity: f64) -> DrawItem {
    let ring = if bubble.active {
        Some(theme.active_ring.to_string())
    } else if bubble.highlighted {
        Some(theme.highlight_ring.to_string())
    } else {
        None
    };
    let fill = fill_color(&bubble.color, theme).to_string();
    let r = bubble.radius() as f64;

    if bubble.is_circular() {
        DrawItem::Blob {
            id: bubble.id,
            path: blob_path(bubble, time, OUTLINE_SEGMENTS),
            fill,
            ring,
            label: bubble.text().to_string(),
            center: to_point(bubble.position),
            font_size: (r * 0.3).clamp(10.0, 20.0),
            opacity,
        }
    } else {
        let fill = match bubble.color {
            BubbleColor::Default => theme.textbox_fill.to_string(),
            BubbleColor::Custom(_) => fill,
        };
        DrawItem::TextBox {
            id: bubble.id,
            shape: textbox_rect(bubble),
            fill,
            border: theme.textbox_border.to_string(),
            ring,
            text: bubble.text().to_string(),
            font_size: r * 0.4,
            opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::model::{BubbleKind, LineDash, LineStyle, Vec2};
    use pretty_assertions::assert_eq;

    fn sample() -> SceneGraph {
        let mut sg = SceneGraph::new();
        let root = sg
            .insert(Bubble::new(BubbleId(1), "root", BubbleKind::Root, Vec2::ZERO))
            .unwrap();
        let mut child = Bubble::new(BubbleId(2), "child", BubbleKind::Branch, Vec2::new(200.0, 0.0));
        child.set_line_style(LineStyle {
            color: "#ff0000".into(),
            width: 2.0,
            style: LineDash::Dashed,
        });
        sg.insert_child(root, child).unwrap();
        sg.insert(Bubble::new(BubbleId(3), "memo", BubbleKind::Textbox, Vec2::new(0.0, 300.0)))
            .unwrap();
        sg
    }

    #[test]
    fn links_paint_before_bubbles() {
        let items = build_display_list(&sample(), &[], 0.0, &Theme::light());
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], DrawItem::Link { .. }));
        let ids: Vec<_> = items.iter().filter_map(DrawItem::bubble_id).collect();
        assert_eq!(ids, vec![BubbleId(1), BubbleId(2), BubbleId(3)]);
        assert!(matches!(items[3], DrawItem::TextBox { .. }));
    }

    #[test]
    fn link_uses_child_style_unless_highlighted() {
        let mut sg = sample();
        let theme = Theme::light();
        let items = build_display_list(&sg, &[], 0.0, &theme);
        let DrawItem::Link { color, width, dash, .. } = &items[0] else {
            panic!("expected a link first");
        };
        assert_eq!((color.as_str(), *width), ("#ff0000", 2.0));
        assert_eq!(dash, &vec![8.0, 6.0]);

        sg.get_by_id_mut(BubbleId(2)).unwrap().highlighted = true;
        let items = build_display_list(&sg, &[], 0.0, &theme);
        let DrawItem::Link { color, width, .. } = &items[0] else {
            panic!("expected a link first");
        };
        assert_eq!((color.as_str(), *width), (theme.highlight_link, 3.0));
    }

    #[test]
    fn fading_bubbles_keep_their_opacity() {
        let sg = SceneGraph::new();
        let gone = Bubble::new(BubbleId(9), "gone", BubbleKind::Branch, Vec2::ZERO);
        let items = build_display_list(&sg, &[(&gone, 0.25)], 0.0, &Theme::dark());
        let DrawItem::Blob { opacity, fill, .. } = &items[0] else {
            panic!("expected a blob");
        };
        assert_eq!(*opacity, 0.25);
        assert_eq!(fill, Theme::dark().bubble_fill);
    }
}
