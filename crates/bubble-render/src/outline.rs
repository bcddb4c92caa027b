//! Bubble shapes as kurbo geometry.
//!
//! Circular bubbles become a closed smooth path through their deformed
//! outline samples; textboxes are plain rounded rectangles.

use bubble_core::model::{Bubble, Link, Vec2};
use bubble_core::physics::outline_points;
use kurbo::{BezPath, Line, Point, Rect, RoundedRect};

/// Outline samples per circular bubble.
pub const OUTLINE_SEGMENTS: usize = 60;

/// Corner radius of textboxes.
pub const TEXTBOX_CORNER: f64 = 8.0;

pub fn to_point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

/// Closed blob path for a circular bubble at `time` seconds.
///
/// Quadratic segments run between sample midpoints with the samples as
/// control points, which keeps the curve smooth at every sample.
/// Returns an empty path for textboxes.
pub fn blob_path(bubble: &Bubble, time: f32, segments: usize) -> BezPath {
    let points: Vec<Point> = outline_points(bubble, time, segments)
        .into_iter()
        .map(to_point)
        .collect();
    let mut path = BezPath::new();
    let n = points.len();
    if n < 3 {
        return path;
    }

    let mid = |a: Point, b: Point| a.midpoint(b);
    path.move_to(mid(points[n - 1], points[0]));
    for i in 0..n {
        let next = points[(i + 1) % n];
        path.quad_to(points[i], mid(points[i], next));
    }
    path.close_path();
    path
}

/// Resting box of a textbox bubble (`2r × r`, centred on its position).
pub fn textbox_rect(bubble: &Bubble) -> RoundedRect {
    let (w, h) = bubble.textbox_size();
    let center = to_point(bubble.position);
    Rect::from_center_size(center, (w as f64, h as f64)).to_rounded_rect(TEXTBOX_CORNER)
}

/// Segment for a parent → child link at its last refreshed endpoints.
pub fn link_line(link: &Link) -> Line {
    Line::new(to_point(link.from), to_point(link.to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::{BubbleId, BubbleKind};
    use kurbo::Shape;

    #[test]
    fn blob_encloses_its_centre() {
        let b = Bubble::new(BubbleId(3), "hello", BubbleKind::Branch, Vec2::new(200.0, 100.0));
        let path = blob_path(&b, 1.25, OUTLINE_SEGMENTS);
        assert!(path.contains(Point::new(200.0, 100.0)));
        assert!(!path.contains(Point::new(200.0 + 80.0, 100.0)));
        let bbox = path.bounding_box();
        assert!(bbox.width() > 100.0 && bbox.width() < 140.0, "{bbox:?}");
    }

    #[test]
    fn textbox_has_no_blob() {
        let b = Bubble::new(BubbleId(1), "note", BubbleKind::Textbox, Vec2::ZERO);
        assert!(blob_path(&b, 0.0, OUTLINE_SEGMENTS).elements().is_empty());
        let rect = textbox_rect(&b).rect();
        assert_eq!((rect.width(), rect.height()), (150.0, 75.0));
        assert_eq!(rect.center(), Point::ORIGIN);
    }
}
