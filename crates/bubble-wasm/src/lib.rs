//! WASM bridge for the bubble mind map: exposes the editor engine to
//! JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the canvas,
//! the animation loop and the text input; everything else happens here.
//! Calls that can be refused return a JSON string `{"ok":true,...}` or
//! `{"ok":false,"error":"..."}`. Bubble ids cross the boundary as numbers,
//! with `-1` meaning "none".

mod render2d;

use bubble_core::{
    BubbleColor, BubbleId, BubbleKind, BubbleRecord, Content, Hyperlink, KeyValueStore, LayoutKind, LineStyle,
};
use bubble_editor::{
    EditError, EditorConfig, InputEvent, LinkAction, MindMap, Modifiers, PointerButton, SearchField,
};
use bubble_render::Theme;
use serde_json::json;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// `localStorage`, when the page has one.
struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage is unavailable, the map will not be saved");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match &self.storage {
            Some(storage) => storage.set_item(key, value).map_err(|e| format!("{e:?}")),
            None => Err("localStorage is unavailable".to_string()),
        }
    }
}

/// The canvas controller handed to JavaScript.
#[wasm_bindgen]
pub struct BubbleCanvas {
    map: MindMap,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[wasm_bindgen]
impl BubbleCanvas {
    /// Create a controller backed by `localStorage`. `config_json` may be
    /// empty or any subset of the editor settings.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: &str) -> Self {
        console_error_panic_hook_setup();
        let config = EditorConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("ignoring bad editor config: {e}");
            EditorConfig::default()
        });
        let mut canvas = Self::with_store(config, Box::new(LocalStorage::open()));
        canvas.resize(width, height);
        canvas
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.map.resize(width as f32, height as f32);
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    /// Advance the simulation. Returns `true` when the canvas needs a repaint.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        let info = self.map.frame(now_ms);
        info.moving > 0 || info.fading > 0 || info.dirty > 0 || self.map.is_deleting()
    }

    /// Paint the current state.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode { Theme::dark() } else { Theme::light() };
        let items = self.map.display_list(&theme);
        render2d::render_scene(ctx, &items, self.map.viewport(), &theme);
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// `button` is the DOM `MouseEvent.button`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.input(&InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: Modifiers {
                ctrl,
                shift,
                alt,
                meta,
            },
        })
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.input(&InputEvent::PointerMove { x, y })
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.input(&InputEvent::PointerUp { x, y })
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.input(&InputEvent::Wheel { x, y, delta_y })
    }

    /// `key` is the DOM `KeyboardEvent.key`.
    pub fn handle_key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.input(&InputEvent::Key {
            key: key.to_string(),
            modifiers: Modifiers {
                ctrl,
                shift,
                alt,
                meta,
            },
        })
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select the bubble under a screen point. Returns its id or `-1`.
    pub fn select_at(&mut self, x: f32, y: f32) -> f64 {
        id_to_js(self.map.select_at(bubble_core::Vec2::new(x, y)))
    }

    pub fn select_by_id(&mut self, id: f64) -> bool {
        let id = id_from_js(id).filter(|id| self.map.graph().contains_id(*id));
        self.map.select(id);
        id.is_some()
    }

    pub fn get_selected_id(&self) -> f64 {
        id_to_js(self.map.selection())
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// The text input's submit action: `{"ok":true,"id":n}`.
    pub fn submit_text(&mut self, text: &str) -> String {
        created(self.map.submit_text(text))
    }

    /// Create a `root`, `branch`, `textbox` or `hyper` bubble. Non-root
    /// kinds go under the selection when there is one.
    pub fn create_bubble(&mut self, kind: &str, text: &str) -> String {
        let kind = BubbleKind::from_tag(kind, Hyperlink::None);
        let parent = match kind {
            BubbleKind::Root => None,
            _ => self.map.selection(),
        };
        created(self.map.create(kind, parent, text))
    }

    /// Make `child` a branch of `parent`.
    pub fn connect(&mut self, child: f64, parent: f64) -> String {
        let result = match (id_from_js(child), id_from_js(parent)) {
            (Some(child), Some(parent)) => self.map.connect(child, parent),
            _ => Err(EditError::UnknownBubble(BubbleId(0))),
        };
        done(result)
    }

    pub fn disconnect(&mut self, child: f64) -> String {
        done(self.with_id(child, |map, id| map.disconnect(id)))
    }

    /// Start the staged delete of the selection and its subtree.
    pub fn delete_selected(&mut self) -> bool {
        let had = self.map.selection().is_some();
        had && self.map.delete_selected().is_ok()
    }

    /// Layers of a running staged delete still to be removed, `0` when idle.
    pub fn pending_delete_layers(&self) -> u32 {
        self.map.pending_delete_layers() as u32
    }

    pub fn clear_all(&mut self) -> bool {
        self.map.clear_all().is_ok()
    }

    /// Set one attribute of a bubble.
    ///
    /// | key | value |
    /// |-----|-------|
    /// | `text` | label |
    /// | `color` | `#RRGGBB`, or `default` |
    /// | `radius` | number |
    /// | `line` | JSON `{"color","width","style"}` |
    /// | `link` | URL, `#<id>` for a bubble, or empty |
    /// | `content` | JSON `{"title","body"}`, or empty to clear |
    pub fn set_node_prop(&mut self, id: f64, key: &str, value: &str) -> String {
        let result = self.with_id(id, |map, id| match key {
            "text" => map.set_text(id, value),
            "color" => map.set_color(id, BubbleColor::from(value.trim().to_string())),
            "radius" => match value.trim().parse::<f32>() {
                Ok(r) if r.is_finite() && r > 0.0 => map.set_radius(id, r),
                _ => Err(EditError::InvalidValue(format!("radius {value:?}"))),
            },
            "line" => match serde_json::from_str::<LineStyle>(value) {
                Ok(style) => map.set_line_style(id, style),
                Err(e) => Err(EditError::InvalidValue(format!("line style: {e}"))),
            },
            "link" => map.set_hyperlink(id, parse_link(value)),
            "content" if value.trim().is_empty() => map.clear_content(id),
            "content" => match serde_json::from_str::<Content>(value) {
                Ok(content) => map.set_content(id, content),
                Err(e) => Err(EditError::InvalidValue(format!("content: {e}"))),
            },
            _ => Err(EditError::InvalidValue(format!("unknown property {key:?}"))),
        });
        done(result)
    }

    /// The bubble as a storage record, or `null`.
    pub fn get_node_json(&self, id: f64) -> String {
        let graph = self.map.graph();
        let record = id_from_js(id).and_then(|id| {
            let idx = graph.index_of(id)?;
            let parent = graph.parent(idx).and_then(|p| graph.id_of(p));
            Some(BubbleRecord::from_bubble(graph.get(idx)?, parent))
        });
        serde_json::to_string(&record).unwrap_or_else(|_| "null".to_string())
    }

    /// Rearrange the subtree under `id` with `mindmap`, `tree` or `orbit`.
    pub fn arrange(&mut self, id: f64, kind: &str) -> String {
        let Some(kind) = LayoutKind::parse(kind) else {
            return failure(&format!("unknown layout {kind:?}"));
        };
        match self.with_id(id, |map, id| map.arrange(id, kind)) {
            Ok(moved) => json!({ "ok": true, "moved": moved }).to_string(),
            Err(e) => failure(&e.to_string()),
        }
    }

    pub fn undo(&mut self) -> bool {
        matches!(self.map.undo(), Ok(Some(_)))
    }

    pub fn redo(&mut self) -> bool {
        matches!(self.map.redo(), Ok(Some(_)))
    }

    pub fn can_undo(&self) -> bool {
        self.map.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.map.can_redo()
    }

    // ─── Share codes ─────────────────────────────────────────────────────

    /// `{"ok":true,"code":"..."}` for the selected subtree.
    pub fn export_selected(&self) -> String {
        let Some(id) = self.map.selection() else {
            return failure("nothing is selected");
        };
        match self.map.export(id) {
            Ok(code) => json!({ "ok": true, "code": code }).to_string(),
            Err(e) => failure(&e.to_string()),
        }
    }

    /// `{"ok":true,"ids":[...]}` with the new bubbles.
    pub fn import_code(&mut self, code: &str) -> String {
        match self.map.import(code) {
            Ok(ids) => {
                let ids: Vec<u64> = ids.iter().map(|id| id.get()).collect();
                json!({ "ok": true, "ids": ids }).to_string()
            }
            Err(e) => failure(&e.to_string()),
        }
    }

    // ─── Search & navigation ─────────────────────────────────────────────

    /// Search `name`, `title`, `body` or `any`. Returns the match count and
    /// focuses the nearest match.
    pub fn search(&mut self, query: &str, field: &str) -> u32 {
        self.map.search(query, SearchField::parse(field)) as u32
    }

    pub fn search_next(&mut self) -> f64 {
        id_to_js(self.map.search_next())
    }

    pub fn search_previous(&mut self) -> f64 {
        id_to_js(self.map.search_previous())
    }

    pub fn clear_search(&mut self) {
        self.map.clear_search();
    }

    /// Follow a hyper bubble: `{"ok":true,"url":"..."}` for the page to
    /// open, or `{"ok":true,"focused":n}` after jumping to a bubble.
    pub fn follow_link(&mut self, id: f64) -> String {
        match self.with_id(id, |map, id| map.follow_link(id)) {
            Ok(LinkAction::OpenUrl(url)) => json!({ "ok": true, "url": url }).to_string(),
            Ok(LinkAction::Focused(target)) => json!({ "ok": true, "focused": target.get() }).to_string(),
            Err(e) => failure(&e.to_string()),
        }
    }
}

impl BubbleCanvas {
    /// Create a controller over any store.
    pub fn with_store(config: EditorConfig, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            map: MindMap::new(config, store),
            dark_mode: false,
        }
    }

    pub fn map(&self) -> &MindMap {
        &self.map
    }

    fn input(&mut self, event: &InputEvent) -> bool {
        match self.map.handle_input(event) {
            Ok(changed) => changed,
            Err(e) => {
                log::warn!("input refused: {e}");
                false
            }
        }
    }

    fn with_id<T>(
        &mut self,
        id: f64,
        f: impl FnOnce(&mut MindMap, BubbleId) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        match id_from_js(id) {
            Some(id) => f(&mut self.map, id),
            None => Err(EditError::UnknownBubble(BubbleId(0))),
        }
    }
}

// ─── JS value helpers ────────────────────────────────────────────────────

fn id_from_js(id: f64) -> Option<BubbleId> {
    (id.is_finite() && id >= 0.0 && id.fract() == 0.0).then(|| BubbleId::new(id as u64))
}

fn id_to_js(id: Option<BubbleId>) -> f64 {
    id.map_or(-1.0, |id| id.get() as f64)
}

/// `#12` links to bubble 12, empty clears, anything else is a URL.
fn parse_link(value: &str) -> Hyperlink {
    let value = value.trim();
    if value.is_empty() {
        return Hyperlink::None;
    }
    match value.strip_prefix('#').and_then(BubbleId::parse) {
        Some(id) => Hyperlink::Bubble(id),
        None => Hyperlink::Url(value.to_string()),
    }
}

fn failure(error: &str) -> String {
    json!({ "ok": false, "error": error }).to_string()
}

fn done(result: Result<(), EditError>) -> String {
    match result {
        Ok(()) => json!({ "ok": true }).to_string(),
        Err(e) => failure(&e.to_string()),
    }
}

fn created(result: Result<BubbleId, EditError>) -> String {
    match result {
        Ok(id) => json!({ "ok": true, "id": id.get() }).to_string(),
        Err(e) => failure(&e.to_string()),
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("bubble wasm panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
