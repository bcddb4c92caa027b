//! The editor engine.
//!
//! `MindMap` owns the scene graph, the viewport and all editor state. The
//! host drives it with two kinds of calls from one thread:
//!
//! - **Input** (`handle_input`, `submit_text`, `delete`, …) mutates the graph
//!   synchronously between frames.
//! - **Frames** (`frame`) advance the clock: staged deletes progress, fades
//!   expire, every bubble's spring and outline is stepped, link endpoints are
//!   refreshed and observers are notified.
//!
//! Every successful mutation pushes an undo snapshot first and persists the
//! graph afterwards. Refused mutations leave both untouched.

use crate::cascade::Cascade;
use crate::commands::UndoStack;
use crate::config::EditorConfig;
use crate::error::EditError;
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::placement::{branch_position, root_position};
use crate::search::{SearchField, SearchState, find_matches};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{AngleSnap, Gesture, NodeDrag};
use crate::viewport::Viewport;
use bubble_core::physics::{is_at_rest, step_bubble};
use bubble_core::{
    Bubble, BubbleColor, BubbleId, BubbleKind, Content, Hyperlink, Interaction, KeyValueStore, LayoutKind, LineStyle,
    NodeIndex, PointerMotion, SceneGraph, Vec2, apply_targets, compute_targets, decode_share_code, export_subtree,
    import_records, load_records, save_records,
};
use bubble_render::{DrawItem, Theme, build_display_list};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Summary of one frame, handed to observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub frame: u64,
    pub now_ms: f64,
    /// Bubbles that have not settled on their target.
    pub moving: usize,
    /// Bubbles still fading out.
    pub fading: usize,
    /// Bubbles whose appearance changed since the previous frame.
    pub dirty: usize,
}

/// Notified after every frame, once physics and links are up to date.
pub trait RenderObserver {
    fn on_frame(&mut self, graph: &SceneGraph, info: &FrameInfo);
}

/// Result of following a hyper bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// The host should open this URL.
    OpenUrl(String),
    /// The viewport now shows this bubble, which is selected.
    Focused(BubbleId),
}

/// A removed bubble kept around for its fade-out.
#[derive(Debug, Clone)]
struct Fading {
    bubble: Bubble,
    removed_at_ms: f64,
}

pub struct MindMap {
    graph: SceneGraph,
    viewport: Viewport,
    config: EditorConfig,
    undo: UndoStack,
    rng: StdRng,
    store: Box<dyn KeyValueStore>,

    selection: Option<BubbleId>,
    search: SearchState,
    cascade: Option<Cascade>,
    fading: Vec<Fading>,

    gesture: Gesture,
    /// Pointer in screen space, this frame and last frame.
    pointer: Vec2,
    last_pointer: Vec2,
    last_pan: Vec2,

    now_ms: f64,
    frame_count: u64,
    was_moving: bool,
    observers: Vec<Box<dyn RenderObserver>>,
}

impl MindMap {
    /// Create an editor over `store`, loading whatever map it holds.
    pub fn new(config: EditorConfig, store: Box<dyn KeyValueStore>) -> Self {
        let records = load_records(store.as_ref());
        let graph = SceneGraph::from_records(&records);
        log::debug!("loaded {} bubbles", graph.len());

        let mut viewport = Viewport::default();
        viewport.min_scale = config.min_scale;
        viewport.max_scale = config.max_scale;

        Self {
            graph,
            viewport,
            undo: UndoStack::new(config.undo_depth),
            rng: StdRng::seed_from_u64(config.rng_seed),
            config,
            store,
            selection: None,
            search: SearchState::default(),
            cascade: None,
            fading: Vec::new(),
            gesture: Gesture::Idle,
            pointer: Vec2::ZERO,
            last_pointer: Vec2::ZERO,
            last_pan: Vec2::ZERO,
            now_ms: 0.0,
            frame_count: 0,
            was_moving: false,
            observers: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn selection(&self) -> Option<BubbleId> {
        self.selection
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Whether a staged delete is still running.
    pub fn is_deleting(&self) -> bool {
        self.cascade.is_some()
    }

    /// Layers of the running staged delete not yet removed.
    pub fn pending_delete_layers(&self) -> usize {
        self.cascade.as_ref().map_or(0, Cascade::remaining_layers)
    }

    /// Whether `id` is waiting in a running staged delete.
    pub fn is_locked(&self, id: BubbleId) -> bool {
        self.cascade.as_ref().is_some_and(|c| c.is_doomed(id))
    }

    /// Removed bubbles still fading out, with their opacity.
    pub fn fading(&self) -> Vec<(&Bubble, f32)> {
        let fade_ms = self.config.fade_ms.max(1.0);
        self.fading
            .iter()
            .map(|f| {
                let t = ((self.now_ms - f.removed_at_ms) / fade_ms).clamp(0.0, 1.0);
                (&f.bubble, (1.0 - t) as f32)
            })
            .collect()
    }

    pub fn add_observer(&mut self, observer: Box<dyn RenderObserver>) {
        self.observers.push(observer);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.resize(width, height);
    }

    /// Display list for the current state.
    pub fn display_list(&self, theme: &Theme) -> Vec<DrawItem> {
        build_display_list(&self.graph, &self.fading(), (self.now_ms / 1000.0) as f32, theme)
    }

    // ─── Frame loop ──────────────────────────────────────────────────────

    /// Advance to `now_ms` (host clock, milliseconds).
    pub fn frame(&mut self, now_ms: f64) -> FrameInfo {
        self.now_ms = now_ms.max(self.now_ms);
        self.frame_count += 1;

        self.advance_cascade();
        let fade_ms = self.config.fade_ms;
        let now = self.now_ms;
        self.fading.retain(|f| now - f.removed_at_ms < fade_ms);

        let inv_scale = 1.0 / self.viewport.scale;
        let interaction = Interaction {
            pointer: PointerMotion {
                world: self.viewport.to_world(self.pointer),
                velocity: (self.pointer - self.last_pointer) * inv_scale,
            },
            pan_velocity: (self.viewport.pan - self.last_pan) * inv_scale,
        };
        self.last_pointer = self.pointer;
        self.last_pan = self.viewport.pan;

        let (mut moving, mut dirty) = (0, 0);
        for bubble in self.graph.bubbles_mut() {
            step_bubble(bubble, &interaction, &self.config.physics);
            if !is_at_rest(bubble) {
                moving += 1;
            }
            if bubble.take_dirty() {
                dirty += 1;
            }
        }
        self.graph.refresh_links();

        // Positions are persisted, so save once motion has died down.
        if self.was_moving && moving == 0 && self.gesture.is_idle() {
            self.persist();
        }
        self.was_moving = moving > 0;

        let info = FrameInfo {
            frame: self.frame_count,
            now_ms: self.now_ms,
            moving,
            fading: self.fading.len(),
            dirty,
        };
        for observer in &mut self.observers {
            observer.on_frame(&self.graph, &info);
        }
        info
    }

    fn advance_cascade(&mut self) {
        let delay = self.config.cascade_layer_delay_ms;
        let layer = match self.cascade.as_mut() {
            Some(cascade) => cascade.due_layer(self.now_ms, delay),
            None => None,
        };
        if let Some(layer) = layer {
            log::debug!("cascade: removing layer of {}", layer.len());
            self.remove_bubbles(&layer);
            self.persist();
        }
        if self.cascade.as_ref().is_some_and(Cascade::is_finished)
            && let Some(done) = self.cascade.take()
        {
            log::debug!("cascade from {} finished", done.root());
        }
    }

    /// Remove every remaining layer of a running cascade immediately.
    fn finish_cascade(&mut self) {
        if let Some(mut cascade) = self.cascade.take() {
            let rest = cascade.drain();
            if !rest.is_empty() {
                self.remove_bubbles(&rest);
                self.persist();
            }
        }
    }

    fn remove_bubbles(&mut self, ids: &[BubbleId]) {
        for &id in ids {
            let Some(idx) = self.graph.index_of(id) else {
                continue;
            };
            if let Some(bubble) = self.graph.remove(idx) {
                self.forget(id);
                self.fading.push(Fading {
                    bubble,
                    removed_at_ms: self.now_ms,
                });
            }
        }
    }

    /// Drop editor references to a bubble that left the graph.
    fn forget(&mut self, id: BubbleId) {
        if self.selection == Some(id) {
            self.selection = None;
        }
        if self.gesture.dragged() == Some(id) {
            self.gesture = Gesture::Idle;
            if let Err(e) = self.undo.end_batch(&self.graph) {
                log::warn!("could not close drag of removed {id}: {e}");
            }
        }
        self.search.forget(id);
    }

    fn persist(&mut self) -> bool {
        save_records(self.store.as_mut(), &self.graph.to_records())
    }

    // ─── Lookup & guards ─────────────────────────────────────────────────

    fn index(&self, id: BubbleId) -> Result<NodeIndex, EditError> {
        self.graph.index_of(id).ok_or(EditError::UnknownBubble(id))
    }

    fn ensure_unlocked(&self, id: BubbleId) -> Result<(), EditError> {
        if self.is_locked(id) {
            log::warn!("refusing to edit {id}: it is being deleted");
            return Err(EditError::Locked(id));
        }
        Ok(())
    }

    /// Look up an editable bubble.
    fn editable(&self, id: BubbleId) -> Result<NodeIndex, EditError> {
        let idx = self.index(id)?;
        self.ensure_unlocked(id)?;
        Ok(idx)
    }

    fn branch_limit(&self, parent: &Bubble) -> usize {
        match parent.kind {
            BubbleKind::Root => self.config.max_root_branches,
            _ => self.config.max_branch_branches,
        }
    }

    // ─── Creation ────────────────────────────────────────────────────────

    /// Create a bubble, optionally under `parent`.
    ///
    /// A `Root` kind given a parent is created as a `Branch`, and a `Branch`
    /// without one as a `Root`. Parents enforce their branch ceiling.
    pub fn create(&mut self, kind: BubbleKind, parent: Option<BubbleId>, text: &str) -> Result<BubbleId, EditError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EditError::EmptyText);
        }
        let kind = match (kind, parent) {
            (BubbleKind::Root, Some(_)) => BubbleKind::Branch,
            (BubbleKind::Branch, None) => BubbleKind::Root,
            (kind, _) => kind,
        };

        let parent_idx = match parent {
            Some(pid) => {
                let idx = self.editable(pid)?;
                let parent_bubble = self.graph.get(idx).ok_or(EditError::UnknownBubble(pid))?;
                let limit = self.branch_limit(parent_bubble);
                if self.graph.children(idx).len() >= limit {
                    log::warn!("{pid} already has {limit} branches");
                    return Err(EditError::BranchLimit { parent: pid, limit });
                }
                Some((idx, parent_bubble.position))
            }
            None => None,
        };

        let position = match parent_idx {
            Some((_, at)) => branch_position(&self.graph, at, &self.viewport, &mut self.rng, &self.config),
            None => root_position(&self.graph, &self.viewport, &mut self.rng, &self.config),
        };

        self.undo.record(&self.graph, "create")?;
        let id = self.graph.allocate_id();
        let bubble = Bubble::new(id, text, kind, position);
        match parent_idx {
            Some((idx, _)) => self.graph.insert_child(idx, bubble)?,
            None => self.graph.insert(bubble)?,
        };
        log::debug!("created {id} under {parent:?}");

        self.select(Some(id));
        self.persist();
        Ok(id)
    }

    pub fn create_root(&mut self, text: &str) -> Result<BubbleId, EditError> {
        self.create(BubbleKind::Root, None, text)
    }

    pub fn create_branch(&mut self, parent: BubbleId, text: &str) -> Result<BubbleId, EditError> {
        self.create(BubbleKind::Branch, Some(parent), text)
    }

    pub fn create_textbox(&mut self, parent: Option<BubbleId>, text: &str) -> Result<BubbleId, EditError> {
        self.create(BubbleKind::Textbox, parent, text)
    }

    pub fn create_hyper(
        &mut self,
        parent: Option<BubbleId>,
        text: &str,
        link: Hyperlink,
    ) -> Result<BubbleId, EditError> {
        self.create(BubbleKind::Hyper { link }, parent, text)
    }

    /// The text-input submit action: a root with nothing selected, else a
    /// branch under the selection.
    pub fn submit_text(&mut self, text: &str) -> Result<BubbleId, EditError> {
        match self.selection {
            None => self.create_root(text),
            Some(parent) => self.create_branch(parent, text),
        }
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Move `child` under `parent`.
    pub fn connect(&mut self, child: BubbleId, parent: BubbleId) -> Result<(), EditError> {
        let child_idx = self.editable(child)?;
        let parent_idx = self.editable(parent)?;
        if self.graph.parent(child_idx) == Some(parent_idx) {
            return Ok(());
        }
        if child_idx == parent_idx || self.graph.is_ancestor_of(child_idx, parent_idx) {
            log::warn!("refusing to link {child} under its own descendant {parent}");
            return Err(bubble_core::GraphError::Cycle { child, parent }.into());
        }
        self.undo.record(&self.graph, "connect")?;
        self.graph.set_parent(child_idx, Some(parent_idx))?;
        self.refresh_highlight();
        self.persist();
        Ok(())
    }

    /// Cut `child` loose from its parent.
    pub fn disconnect(&mut self, child: BubbleId) -> Result<(), EditError> {
        let idx = self.editable(child)?;
        if self.graph.parent(idx).is_none() {
            return Ok(());
        }
        self.undo.record(&self.graph, "disconnect")?;
        self.graph.set_parent(idx, None)?;
        self.refresh_highlight();
        self.persist();
        Ok(())
    }

    /// Delete `id` and its subtree, one layer per cascade step.
    ///
    /// The bubble itself is removed right away; deeper layers follow on
    /// later frames. A cascade already running is completed first.
    pub fn delete(&mut self, id: BubbleId) -> Result<(), EditError> {
        self.editable(id)?;
        self.finish_cascade();
        let idx = self.index(id)?;
        self.undo.record(&self.graph, "delete")?;
        self.cascade = Cascade::plan(&self.graph, idx, self.now_ms);
        self.advance_cascade();
        Ok(())
    }

    pub fn delete_selected(&mut self) -> Result<(), EditError> {
        match self.selection {
            Some(id) => self.delete(id),
            None => Ok(()),
        }
    }

    /// Remove every bubble in one undo step.
    pub fn clear_all(&mut self) -> Result<(), EditError> {
        if self.graph.is_empty() {
            return Ok(());
        }
        self.cascade = None;
        self.undo.record(&self.graph, "clear")?;
        let ids: Vec<BubbleId> = self.graph.iter().map(|(_, b)| b.id).collect();
        self.remove_bubbles(&ids);
        self.search.clear();
        self.persist();
        Ok(())
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    fn edit(&mut self, id: BubbleId, description: &str, f: impl FnOnce(&mut Bubble)) -> Result<(), EditError> {
        let idx = self.editable(id)?;
        self.undo.record(&self.graph, description)?;
        if let Some(bubble) = self.graph.get_mut(idx) {
            f(bubble);
        }
        self.persist();
        Ok(())
    }

    pub fn set_text(&mut self, id: BubbleId, text: &str) -> Result<(), EditError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EditError::EmptyText);
        }
        self.edit(id, "edit text", |b| b.set_text(text))
    }

    pub fn set_radius(&mut self, id: BubbleId, radius: f32) -> Result<(), EditError> {
        self.edit(id, "resize", |b| b.set_radius(radius))
    }

    pub fn set_color(&mut self, id: BubbleId, color: BubbleColor) -> Result<(), EditError> {
        self.edit(id, "color", |b| b.set_color(color))
    }

    pub fn set_line_style(&mut self, id: BubbleId, style: LineStyle) -> Result<(), EditError> {
        self.edit(id, "line style", |b| b.set_line_style(style))
    }

    pub fn set_content(&mut self, id: BubbleId, content: Content) -> Result<(), EditError> {
        self.edit(id, "content", |b| b.set_content(Some(content)))
    }

    pub fn clear_content(&mut self, id: BubbleId) -> Result<(), EditError> {
        self.edit(id, "clear content", |b| b.set_content(None))
    }

    pub fn set_hyperlink(&mut self, id: BubbleId, link: Hyperlink) -> Result<(), EditError> {
        let idx = self.editable(id)?;
        if self.graph.get(idx).and_then(Bubble::hyperlink).is_none() {
            return Err(EditError::NotHyper(id));
        }
        self.edit(id, "hyperlink", |b| {
            b.set_hyperlink(link);
        })
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    /// Rearrange the subtree under `anchor`. Returns how many targets moved.
    pub fn arrange(&mut self, anchor: BubbleId, kind: LayoutKind) -> Result<usize, EditError> {
        let idx = self.editable(anchor)?;
        let targets = compute_targets(&self.graph, idx, kind, &self.config.layout);
        if targets.is_empty() {
            return Ok(0);
        }
        self.undo.record(&self.graph, "arrange")?;
        let moved = apply_targets(&mut self.graph, &targets);
        log::debug!("arranged {anchor} as {kind:?}: {moved} bubbles moving");
        Ok(moved)
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Undo the last mutation. A running staged delete is cancelled.
    pub fn undo(&mut self) -> Result<Option<String>, EditError> {
        self.settle_for_history()?;
        let result = self.undo.undo(&mut self.graph)?;
        self.after_restore();
        Ok(result)
    }

    pub fn redo(&mut self) -> Result<Option<String>, EditError> {
        self.settle_for_history()?;
        let result = self.undo.redo(&mut self.graph)?;
        self.after_restore();
        Ok(result)
    }

    fn settle_for_history(&mut self) -> Result<(), EditError> {
        if let Some(cascade) = self.cascade.take() {
            log::debug!("cancelling cascade from {}", cascade.root());
        }
        if matches!(self.gesture, Gesture::Drag(_)) {
            self.end_gesture()?;
        }
        self.gesture = Gesture::Idle;
        Ok(())
    }

    fn after_restore(&mut self) {
        if let Some(id) = self.selection
            && !self.graph.contains_id(id)
        {
            self.selection = None;
        }
        let stale: Vec<BubbleId> = self
            .search
            .matches()
            .iter()
            .copied()
            .filter(|id| !self.graph.contains_id(*id))
            .collect();
        for id in stale {
            self.search.forget(id);
        }
        self.refresh_highlight();
        self.persist();
    }

    // ─── Share codes ─────────────────────────────────────────────────────

    pub fn export(&self, root: BubbleId) -> Result<String, EditError> {
        self.index(root)?;
        Ok(export_subtree(&self.graph, root)?)
    }

    /// Import a share code next to the existing map. Returns the new ids in
    /// export order. A code that fails to decode changes nothing.
    pub fn import(&mut self, code: &str) -> Result<Vec<BubbleId>, EditError> {
        let records = decode_share_code(code)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        self.undo.record(&self.graph, "import")?;
        let created = import_records(&mut self.graph, &records, self.config.import_offset());
        self.persist();
        Ok(created.into_iter().filter_map(|idx| self.graph.id_of(idx)).collect())
    }

    // ─── Selection, search, navigation ───────────────────────────────────

    /// Select a bubble (or nothing). The selection is marked active and its
    /// descendants highlighted.
    pub fn select(&mut self, id: Option<BubbleId>) {
        self.selection = id.filter(|id| self.graph.contains_id(*id));
        self.refresh_highlight();
    }

    /// Select whatever is under a screen point.
    pub fn select_at(&mut self, screen: Vec2) -> Option<BubbleId> {
        let hit = bubble_render::hit_test_id(&self.graph, self.viewport.to_world(screen));
        self.select(hit);
        hit
    }

    fn refresh_highlight(&mut self) {
        for bubble in self.graph.bubbles_mut() {
            if bubble.active || bubble.highlighted {
                bubble.active = false;
                bubble.highlighted = false;
                bubble.mark_dirty();
            }
        }
        let Some(idx) = self.selection.and_then(|id| self.graph.index_of(id)) else {
            return;
        };
        for child in self.graph.descendants(idx) {
            if let Some(b) = self.graph.get_mut(child) {
                b.highlighted = true;
                b.mark_dirty();
            }
        }
        if let Some(b) = self.graph.get_mut(idx) {
            b.active = true;
            b.mark_dirty();
        }
    }

    /// Pan so the bubble sits mid-screen, and select it.
    pub fn focus(&mut self, id: BubbleId) -> Result<(), EditError> {
        let idx = self.index(id)?;
        if let Some(bubble) = self.graph.get(idx) {
            self.viewport.center_on(bubble.position);
        }
        self.select(Some(id));
        Ok(())
    }

    /// Start a search. Focuses the nearest match and returns the match count.
    pub fn search(&mut self, query: &str, field: SearchField) -> usize {
        self.search = SearchState::new(find_matches(&self.graph, query, field));
        if let Some(first) = self.search.current() {
            if let Err(e) = self.focus(first) {
                log::warn!("search: cannot focus {first}: {e}");
            }
        }
        self.search.len()
    }

    pub fn search_next(&mut self) -> Option<BubbleId> {
        let id = self.search.next()?;
        self.focus(id).ok()?;
        Some(id)
    }

    pub fn search_previous(&mut self) -> Option<BubbleId> {
        let id = self.search.previous()?;
        self.focus(id).ok()?;
        Some(id)
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Act on a hyper bubble's link.
    pub fn follow_link(&mut self, id: BubbleId) -> Result<LinkAction, EditError> {
        let idx = self.index(id)?;
        let link = self
            .graph
            .get(idx)
            .and_then(Bubble::hyperlink)
            .cloned()
            .ok_or(EditError::NotHyper(id))?;
        match link {
            Hyperlink::None => Err(EditError::NoLink(id)),
            Hyperlink::Url(url) => Ok(LinkAction::OpenUrl(url)),
            Hyperlink::Bubble(target) => {
                if !self.graph.contains_id(target) {
                    log::warn!("{id} links to missing bubble {target}");
                    return Err(EditError::MissingLinkTarget { from: id, target });
                }
                self.focus(target)?;
                Ok(LinkAction::Focused(target))
            }
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn zoom_in_at(&mut self, screen: Vec2) -> bool {
        self.viewport.zoom_at(screen, self.config.zoom_in_factor)
    }

    pub fn zoom_out_at(&mut self, screen: Vec2) -> bool {
        self.viewport.zoom_at(screen, self.config.zoom_out_factor)
    }

    /// Feed one input event. Returns whether anything visible changed.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<bool, EditError> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(Vec2::new(*x, *y), *button, *modifiers),
            InputEvent::PointerMove { x, y } => {
                self.pointer_move(Vec2::new(*x, *y));
                Ok(!self.gesture.is_idle())
            }
            InputEvent::PointerUp { x, y } => {
                self.pointer = Vec2::new(*x, *y);
                self.end_gesture()
            }
            InputEvent::Wheel { x, y, delta_y } => {
                let at = Vec2::new(*x, *y);
                Ok(if *delta_y < 0.0 {
                    self.zoom_in_at(at)
                } else {
                    self.zoom_out_at(at)
                })
            }
            InputEvent::Key { key, modifiers } => self.key(key, *modifiers),
        }
    }

    fn pointer_down(&mut self, screen: Vec2, button: PointerButton, modifiers: Modifiers) -> Result<bool, EditError> {
        self.pointer = screen;
        if !self.gesture.is_idle() {
            self.end_gesture()?;
        }
        let world = self.viewport.to_world(screen);
        let hit = bubble_render::hit_test(&self.graph, world)
            .and_then(|idx| self.graph.id_of(idx))
            .filter(|id| !self.is_locked(*id));

        let Some(id) = hit else {
            self.gesture = Gesture::Pan { last: screen };
            return Ok(false);
        };
        self.undo.begin_batch(&self.graph, "move")?;
        let start = match self.graph.get_by_id_mut(id) {
            Some(bubble) => {
                bubble.dragging = true;
                bubble.target = bubble.position;
                bubble.position
            }
            None => return Ok(false),
        };
        self.gesture = Gesture::Drag(NodeDrag::new(id, screen, start, button, modifiers));
        self.select(Some(id));
        Ok(true)
    }

    fn pointer_move(&mut self, screen: Vec2) {
        self.pointer = screen;
        let drag = match &mut self.gesture {
            Gesture::Idle => None,
            Gesture::Pan { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan_by(delta);
                None
            }
            Gesture::Drag(drag) => Some(drag.clone()),
        };
        if let Some(drag) = drag {
            self.drag_to(&drag, screen);
        }
    }

    fn drag_to(&mut self, drag: &NodeDrag, screen: Vec2) {
        let Some(idx) = self.graph.index_of(drag.id) else {
            return;
        };
        let parent = self
            .graph
            .parent(idx)
            .and_then(|p| self.graph.get(p))
            .map(|p| p.position);
        let snap = AngleSnap {
            step_deg: self.config.angle_snap_step_deg,
            tolerance_deg: self.config.angle_snap_tolerance_deg,
        };
        let target = drag.target(screen, self.viewport.scale, parent, &snap);

        let Some(bubble) = self.graph.get_mut(idx) else {
            return;
        };
        let delta = target - bubble.target;
        bubble.target = target;
        bubble.mark_dirty();

        if drag.group {
            for child in self.graph.descendants(idx) {
                if let Some(b) = self.graph.get_mut(child) {
                    b.target += delta;
                    b.position += delta;
                }
            }
        }
    }

    fn end_gesture(&mut self) -> Result<bool, EditError> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Ok(false),
            Gesture::Pan { .. } => Ok(false),
            Gesture::Drag(drag) => {
                if let Some(bubble) = self.graph.get_by_id_mut(drag.id) {
                    bubble.dragging = false;
                }
                let changed = self.undo.end_batch(&self.graph)?;
                if changed {
                    self.persist();
                }
                Ok(changed)
            }
        }
    }

    fn key(&mut self, key: &str, modifiers: Modifiers) -> Result<bool, EditError> {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return Ok(false);
        };
        let center = self.viewport.screen_center();
        match action {
            ShortcutAction::Undo => Ok(self.undo()?.is_some()),
            ShortcutAction::Redo => Ok(self.redo()?.is_some()),
            ShortcutAction::DeleteSelected => {
                let had = self.selection.is_some();
                self.delete_selected()?;
                Ok(had)
            }
            ShortcutAction::Deselect => {
                self.select(None);
                Ok(true)
            }
            ShortcutAction::ZoomIn => Ok(self.zoom_in_at(center)),
            ShortcutAction::ZoomOut => Ok(self.zoom_out_at(center)),
            ShortcutAction::SearchNext => Ok(self.search_next().is_some()),
            ShortcutAction::SearchPrevious => Ok(self.search_previous().is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::MemoryStore;
    use pretty_assertions::assert_eq;

    fn editor() -> MindMap {
        MindMap::new(EditorConfig::default(), Box::new(MemoryStore::new()))
    }

    #[test]
    fn submit_text_builds_a_tree_from_the_selection() {
        let mut m = editor();
        assert!(matches!(m.submit_text("   "), Err(EditError::EmptyText)));

        let root = m.submit_text("Project").unwrap();
        assert_eq!(m.selection(), Some(root));
        let branch = m.submit_text("Tasks").unwrap();
        assert_eq!(m.selection(), Some(branch));

        let g = m.graph();
        let (r, b) = (g.index_of(root).unwrap(), g.index_of(branch).unwrap());
        assert_eq!(g.get(r).unwrap().kind, BubbleKind::Root);
        assert_eq!(g.get(b).unwrap().kind, BubbleKind::Branch);
        assert_eq!(g.parent(b), Some(r));
    }

    #[test]
    fn first_root_is_centred_on_screen() {
        let mut m = editor();
        m.resize(1000.0, 600.0);
        let id = m.create_root("hello").unwrap();
        assert_eq!(m.graph().get_by_id(id).unwrap().position, Vec2::new(500.0, 300.0));
    }

    #[test]
    fn selection_highlights_descendants() {
        let mut m = editor();
        let root = m.create_root("a").unwrap();
        let b = m.create_branch(root, "b").unwrap();
        let c = m.create_branch(b, "c").unwrap();
        let other = m.create_root("z").unwrap();

        m.select(Some(root));
        let g = m.graph();
        assert!(g.get_by_id(root).unwrap().active);
        assert!(g.get_by_id(b).unwrap().highlighted);
        assert!(g.get_by_id(c).unwrap().highlighted);
        assert!(!g.get_by_id(other).unwrap().highlighted);

        m.select(None);
        assert!(m.graph().iter().all(|(_, b)| !b.active && !b.highlighted));
    }

    #[test]
    fn hyperlinks_resolve_at_follow_time() {
        let mut m = editor();
        let target = m.create_root("target").unwrap();
        let jump = m
            .create_hyper(None, "jump", Hyperlink::Bubble(target))
            .unwrap();
        let web = m
            .create_hyper(None, "web", Hyperlink::Url("https://example.com".into()))
            .unwrap();

        assert_eq!(m.follow_link(web).unwrap(), LinkAction::OpenUrl("https://example.com".into()));
        assert_eq!(m.follow_link(jump).unwrap(), LinkAction::Focused(target));
        assert_eq!(m.selection(), Some(target));

        m.delete(target).unwrap();
        assert!(matches!(
            m.follow_link(jump),
            Err(EditError::MissingLinkTarget { .. })
        ));
        assert!(matches!(m.follow_link(target), Err(EditError::UnknownBubble(_))));
        assert!(matches!(
            m.set_hyperlink(web, Hyperlink::None).map(|_| m.follow_link(web)),
            Ok(Err(EditError::NoLink(_)))
        ));
    }

    #[test]
    fn content_set_and_clear() {
        let mut m = editor();
        let id = m.create_root("notes").unwrap();
        m.set_content(
            id,
            Content {
                title: "T".into(),
                body: "B".into(),
            },
        )
        .unwrap();
        assert_eq!(m.graph().get_by_id(id).unwrap().content.as_ref().unwrap().title, "T");
        m.clear_content(id).unwrap();
        assert!(m.graph().get_by_id(id).unwrap().content.is_none());
        m.undo().unwrap();
        assert!(m.graph().get_by_id(id).unwrap().content.is_some());
    }

    #[test]
    fn wheel_zooms_around_pointer() {
        let mut m = editor();
        let at = Vec2::new(300.0, 200.0);
        let before = m.viewport().to_world(at);
        let changed = m
            .handle_input(&InputEvent::Wheel {
                x: at.x,
                y: at.y,
                delta_y: -1.0,
            })
            .unwrap();
        assert!(changed);
        assert!((m.viewport().scale - 1.11).abs() < 1e-6);
        assert!(m.viewport().to_world(at).distance(before) < 1e-3);
    }

    #[test]
    fn search_focuses_the_first_match() {
        let mut m = editor();
        m.resize(800.0, 600.0);
        let root = m.create_root("alpha").unwrap();
        let beta = m.create_branch(root, "beta").unwrap();
        m.select(None);

        assert_eq!(m.search("BET", SearchField::Name), 1);
        assert_eq!(m.selection(), Some(beta));
        let at = m.graph().get_by_id(beta).unwrap().position;
        let on_screen = m.viewport().to_screen(at);
        assert!(on_screen.distance(m.viewport().screen_center()) < 1e-3);

        assert_eq!(m.search("zzz", SearchField::Name), 0);
        assert_eq!(m.selection(), Some(beta));
    }

    #[test]
    fn canvas_drag_pans() {
        let mut m = editor();
        m.handle_input(&InputEvent::PointerDown {
            x: 10.0,
            y: 10.0,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        })
        .unwrap();
        m.handle_input(&InputEvent::PointerMove { x: 40.0, y: 30.0 }).unwrap();
        m.handle_input(&InputEvent::PointerUp { x: 40.0, y: 30.0 }).unwrap();
        assert_eq!(m.viewport().pan, Vec2::new(30.0, 20.0));
        assert!(!m.can_undo());
    }

    #[test]
    fn ctrl_drag_moves_the_group_as_one_undo_step() {
        let mut m = editor();
        let root = m.create_root("root").unwrap();
        let child = m.create_branch(root, "child").unwrap();
        let steps_before = m.undo.depth();
        let root_at = m.viewport().to_screen(m.graph().get_by_id(root).unwrap().position);
        let child_before = m.graph().get_by_id(child).unwrap().position;

        m.handle_input(&InputEvent::PointerDown {
            x: root_at.x,
            y: root_at.y,
            button: PointerButton::Primary,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        })
        .unwrap();
        for step in 1..=4 {
            m.handle_input(&InputEvent::PointerMove {
                x: root_at.x + 10.0 * step as f32,
                y: root_at.y,
            })
            .unwrap();
            m.frame(16.0 * step as f64);
        }
        m.handle_input(&InputEvent::PointerUp {
            x: root_at.x + 40.0,
            y: root_at.y,
        })
        .unwrap();

        let moved = m.graph().get_by_id(child).unwrap();
        assert!(moved.target.distance(child_before + Vec2::new(40.0, 0.0)) < 1e-3);
        assert_eq!(m.undo.depth(), steps_before + 1);
        assert!(!m.graph().get_by_id(root).unwrap().dragging);

        m.undo().unwrap();
        assert_eq!(m.graph().get_by_id(child).unwrap().position, child_before);
    }

    struct Counter(std::rc::Rc<std::cell::Cell<u64>>);

    impl RenderObserver for Counter {
        fn on_frame(&mut self, _graph: &SceneGraph, info: &FrameInfo) {
            self.0.set(info.frame);
        }
    }

    #[test]
    fn frames_report_changed_bubbles_once() {
        let mut m = editor();
        let id = m.create_root("root").unwrap();
        m.create_textbox(Some(id), "note").unwrap();
        assert_eq!(m.frame(0.0).dirty, 2);
        assert_eq!(m.frame(16.0).dirty, 0);
        m.set_color(id, BubbleColor::Custom("#123456".into())).unwrap();
        assert_eq!(m.frame(32.0).dirty, 1);
    }

    #[test]
    fn observers_see_every_frame() {
        let mut m = editor();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        m.add_observer(Box::new(Counter(seen.clone())));
        m.frame(0.0);
        m.frame(16.0);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn mutations_persist() {
        let mut m = editor();
        let id = m.create_root("saved").unwrap();
        let stored = load_records(m.store());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);

        let reopened = MindMap::new(EditorConfig::default(), Box::new(MemoryStore::with_entry(
            bubble_core::STORAGE_KEY,
            &m.store().get(bubble_core::STORAGE_KEY).unwrap(),
        )));
        assert_eq!(reopened.graph().get_by_id(id).unwrap().text(), "saved");
    }
}
