//! Canvas2D painter.
//!
//! Replays a display list onto an HTML `<canvas>`. Items are in world
//! coordinates; the viewport becomes the context transform, so only the
//! background and dot grid are drawn in screen space.

use bubble_editor::Viewport;
use bubble_render::{DrawItem, Theme};
use kurbo::{PathEl, Shape};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";
const GRID_SPACING: f64 = 20.0;

/// Paint one frame.
pub fn render_scene(ctx: &CanvasRenderingContext2d, items: &[DrawItem], viewport: &Viewport, theme: &Theme) {
    let (width, height) = (viewport.width as f64, viewport.height as f64);

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_global_alpha(1.0);
    ctx.set_fill_style_str(theme.background);
    ctx.fill_rect(0.0, 0.0, width, height);
    draw_grid(ctx, viewport, theme);

    let scale = viewport.scale as f64;
    let _ = ctx.set_transform(scale, 0.0, 0.0, scale, viewport.pan.x as f64, viewport.pan.y as f64);
    for item in items {
        match item {
            DrawItem::Link {
                line,
                color,
                width,
                dash,
            } => {
                ctx.save();
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(*width);
                set_dash(ctx, dash);
                ctx.begin_path();
                ctx.move_to(line.p0.x, line.p0.y);
                ctx.line_to(line.p1.x, line.p1.y);
                ctx.stroke();
                ctx.restore();
            }
            DrawItem::Blob {
                path,
                fill,
                ring,
                label,
                center,
                font_size,
                opacity,
                ..
            } => {
                ctx.save();
                ctx.set_global_alpha(*opacity);
                trace(ctx, path);
                ctx.set_fill_style_str(fill);
                ctx.fill();
                if let Some(ring) = ring {
                    ctx.set_stroke_style_str(ring);
                    ctx.set_line_width(3.0);
                    ctx.stroke();
                }
                ctx.set_fill_style_str(theme.bubble_text);
                ctx.set_font(&format!("{font_size}px {FONT_FAMILY}"));
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                let _ = ctx.fill_text(label, center.x, center.y);
                ctx.restore();
            }
            DrawItem::TextBox {
                shape,
                fill,
                border,
                ring,
                text,
                font_size,
                opacity,
                ..
            } => {
                ctx.save();
                ctx.set_global_alpha(*opacity);
                trace(ctx, shape);
                ctx.set_fill_style_str(fill);
                ctx.fill();
                ctx.set_stroke_style_str(ring.as_deref().unwrap_or(border));
                ctx.set_line_width(if ring.is_some() { 3.0 } else { 1.0 });
                ctx.stroke();
                draw_lines(ctx, text, shape.rect().center(), *font_size, theme);
                ctx.restore();
            }
        }
    }
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
}

/// Build the current path from any kurbo shape.
fn trace(ctx: &CanvasRenderingContext2d, shape: &impl Shape) {
    ctx.begin_path();
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: &[f64]) {
    let pattern: js_sys::Array = dash.iter().map(|d| JsValue::from_f64(*d)).collect();
    let _ = ctx.set_line_dash(&pattern);
}

/// Multi-line text centred on `center`.
fn draw_lines(ctx: &CanvasRenderingContext2d, text: &str, center: kurbo::Point, font_size: f64, theme: &Theme) {
    let lines: Vec<&str> = text.lines().collect();
    let line_height = font_size * 1.3;
    let top = center.y - line_height * (lines.len().saturating_sub(1)) as f64 / 2.0;

    ctx.set_fill_style_str(theme.bubble_text);
    ctx.set_font(&format!("{font_size}px {FONT_FAMILY}"));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for (i, line) in lines.iter().enumerate() {
        let _ = ctx.fill_text(line, center.x, top + line_height * i as f64);
    }
}

/// Dot grid that scrolls and scales with the viewport.
fn draw_grid(ctx: &CanvasRenderingContext2d, viewport: &Viewport, theme: &Theme) {
    let spacing = GRID_SPACING * viewport.scale as f64;
    if spacing < 4.0 {
        return;
    }
    let (width, height) = (viewport.width as f64, viewport.height as f64);
    ctx.set_fill_style_str(theme.grid);
    let mut x = (viewport.pan.x as f64).rem_euclid(spacing);
    while x < width {
        let mut y = (viewport.pan.y as f64).rem_euclid(spacing);
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}
