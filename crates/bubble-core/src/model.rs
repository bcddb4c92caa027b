//! Core data model for bubble mind maps.
//!
//! The map is a forest: nodes are bubbles and edges go parent → child.
//! The `SceneGraph` owns every bubble; parent and child relations are
//! expressed only through graph edges, so a bubble never holds a reference
//! to another bubble. The per-parent child order is kept beside the graph
//! and is updated by the same methods that add or remove edges.

use crate::id::BubbleId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::{Add, AddAssign, Mul, Sub};

// ─── Geometry ────────────────────────────────────────────────────────────

/// A 2D vector in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Scale the vector down so its length is at most `max`.
    pub fn clamp_length(self, max: f32) -> Vec2 {
        let len = self.length();
        if len > max { self * (max / len) } else { self }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

// ─── Sizing ──────────────────────────────────────────────────────────────

pub const MIN_RADIUS: f32 = 30.0;
pub const MAX_RADIUS: f32 = 80.0;
/// Radius growth per character of label text.
pub const RADIUS_PER_CHAR: f32 = 6.0;
/// Half-width of a textbox that has never been resized. The same value is
/// its radius for hit testing, link endpoints and branch clearance, so a
/// default textbox is a 150 × 75 box everywhere.
pub const TEXTBOX_RADIUS: f32 = 75.0;

/// Radius of a circular bubble whose size follows its label.
pub fn auto_radius(text: &str) -> f32 {
    let len = text.chars().count() as f32;
    (MIN_RADIUS + len * RADIUS_PER_CHAR).clamp(MIN_RADIUS, MAX_RADIUS)
}

// ─── Attributes ──────────────────────────────────────────────────────────

/// Where a hyper bubble jumps when clicked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Hyperlink {
    #[default]
    None,
    Url(String),
    /// Another bubble, resolved against the live graph at follow time.
    Bubble(BubbleId),
}

/// The variant tag of a bubble. Kind-specific data lives in the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleKind {
    /// Top-level bubble with no parent.
    Root,
    /// Bubble hanging under a parent.
    Branch,
    /// Free rectangular text area; never deforms.
    Textbox,
    /// Jump anchor to a URL or another bubble.
    Hyper { link: Hyperlink },
}

impl BubbleKind {
    /// The lowercase tag used in persisted records.
    pub fn tag(&self) -> &'static str {
        match self {
            BubbleKind::Root => "root",
            BubbleKind::Branch => "branch",
            BubbleKind::Textbox => "textbox",
            BubbleKind::Hyper { .. } => "hyper",
        }
    }

    /// Build a kind from its record tag. Unknown tags fall back to `Branch`.
    pub fn from_tag(tag: &str, link: Hyperlink) -> Self {
        match tag {
            "root" => BubbleKind::Root,
            "textbox" => BubbleKind::Textbox,
            "hyper" => BubbleKind::Hyper { link },
            "branch" => BubbleKind::Branch,
            other => {
                log::warn!("unknown bubble type {other:?}, treating as branch");
                BubbleKind::Branch
            }
        }
    }

    pub fn is_circular(&self) -> bool {
        !matches!(self, BubbleKind::Textbox)
    }
}

/// Optional rich payload attached to a bubble.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Content {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Fill color: theme-driven or explicit (`#RRGGBB`).
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BubbleColor {
    #[default]
    Default,
    Custom(String),
}

impl From<String> for BubbleColor {
    fn from(s: String) -> Self {
        if s.is_empty() || s == "default" {
            BubbleColor::Default
        } else {
            BubbleColor::Custom(s)
        }
    }
}

impl From<BubbleColor> for String {
    fn from(c: BubbleColor) -> Self {
        match c {
            BubbleColor::Default => "default".to_string(),
            BubbleColor::Custom(s) => s,
        }
    }
}

/// Dash pattern of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineDash {
    /// On/off segment lengths, scaled by line width. Empty for solid.
    pub fn pattern(self, width: f32) -> SmallVec<[f32; 2]> {
        match self {
            LineDash::Solid => SmallVec::new(),
            LineDash::Dashed => SmallVec::from_buf([width * 4.0, width * 3.0]),
            LineDash::Dotted => SmallVec::from_buf([width, width * 2.0]),
        }
    }
}

/// Style of the link from a bubble to its parent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineStyle {
    #[serde(default = "LineStyle::default_color")]
    pub color: String,
    #[serde(default = "LineStyle::default_width")]
    pub width: f32,
    #[serde(default)]
    pub style: LineDash,
}

impl LineStyle {
    fn default_color() -> String {
        "#9ca3af".to_string()
    }

    fn default_width() -> f32 {
        2.0
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Self::default_color(),
            width: Self::default_width(),
            style: LineDash::Solid,
        }
    }
}

/// Transient outline state driven by the physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlobState {
    /// Phase offset so neighbouring bubbles don't wobble in lockstep.
    pub noise_seed: f32,
    /// Smoothed deformation direction.
    pub bias: Vec2,
}

// ─── Bubble ──────────────────────────────────────────────────────────────

/// A single mind-map entity.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub id: BubbleId,
    text: String,
    pub kind: BubbleKind,
    pub content: Option<Content>,
    /// Current rendered position.
    pub position: Vec2,
    /// Where the spring is pulling the bubble.
    pub target: Vec2,
    pub velocity: Vec2,
    radius: f32,
    radius_override: Option<f32>,
    pub color: BubbleColor,
    pub line_style: LineStyle,
    pub blob: BlobState,
    pub dragging: bool,
    pub highlighted: bool,
    pub active: bool,
    dirty: bool,
}

impl Bubble {
    pub fn new(id: BubbleId, text: impl Into<String>, kind: BubbleKind, position: Vec2) -> Self {
        let text = text.into();
        let mut bubble = Self {
            id,
            text,
            kind,
            content: None,
            position,
            target: position,
            velocity: Vec2::ZERO,
            radius: MIN_RADIUS,
            radius_override: None,
            color: BubbleColor::Default,
            line_style: LineStyle::default(),
            blob: BlobState {
                noise_seed: id.noise_phase(),
                bias: Vec2::ZERO,
            },
            dragging: false,
            highlighted: false,
            active: false,
            dirty: true,
        };
        bubble.radius = bubble.computed_radius();
        bubble
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn radius_override(&self) -> Option<f32> {
        self.radius_override
    }

    fn computed_radius(&self) -> f32 {
        match (self.radius_override, &self.kind) {
            (Some(r), _) => r,
            (None, BubbleKind::Textbox) => TEXTBOX_RADIUS,
            (None, _) => auto_radius(&self.text),
        }
    }

    /// Replace the label. Auto-sized bubbles follow the new length.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.radius = self.computed_radius();
        self.dirty = true;
    }

    /// Pin the radius. Later label edits no longer resize the bubble.
    pub fn set_radius(&mut self, r: f32) {
        let r = r.max(1.0);
        self.radius_override = Some(r);
        self.radius = r;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: BubbleColor) {
        self.color = color;
        self.dirty = true;
    }

    pub fn set_line_style(&mut self, style: LineStyle) {
        self.line_style = style;
        self.dirty = true;
    }

    pub fn set_content(&mut self, content: Option<Content>) {
        self.content = content;
        self.dirty = true;
    }

    /// Set the jump target. Returns `false` (and changes nothing) unless
    /// this is a hyper bubble.
    pub fn set_hyperlink(&mut self, link: Hyperlink) -> bool {
        match &mut self.kind {
            BubbleKind::Hyper { link: current } => {
                *current = link;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub fn hyperlink(&self) -> Option<&Hyperlink> {
        match &self.kind {
            BubbleKind::Hyper { link } => Some(link),
            _ => None,
        }
    }

    pub fn is_circular(&self) -> bool {
        self.kind.is_circular()
    }

    /// Width and height of a textbox (`2r × r`).
    pub fn textbox_size(&self) -> (f32, f32) {
        (self.radius * 2.0, self.radius)
    }

    /// Teleport: position and target both move, velocity is dropped.
    pub fn place_at(&mut self, p: Vec2) {
        self.position = p;
        self.target = p;
        self.velocity = Vec2::ZERO;
    }

    /// Whether a world point lies on this bubble's resting shape.
    pub fn contains(&self, p: Vec2) -> bool {
        if self.is_circular() {
            self.position.distance(p) <= self.radius
        } else {
            let (w, h) = self.textbox_size();
            (p.x - self.position.x).abs() <= w / 2.0 && (p.y - self.position.y).abs() <= h / 2.0
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and reset the re-render/persist flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// A parent → child link, with the endpoints it was last drawn at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Link {
    pub from: Vec2,
    pub to: Vec2,
}

/// Errors from structural graph edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("bubble id {0} is already in use")]
    DuplicateId(BubbleId),

    #[error("bubble {0} not found")]
    UnknownBubble(BubbleId),

    #[error("node index {0:?} is not in the graph")]
    StaleIndex(NodeIndex),

    #[error("linking {child} under {parent} would create a cycle")]
    Cycle { child: BubbleId, parent: BubbleId },
}

/// The complete mind map: a forest of `Bubble` values.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    /// Nodes are bubbles, edges are parent → child links.
    pub graph: StableDiGraph<Bubble, Link>,

    /// Index from BubbleId → NodeIndex for fast lookup.
    id_index: HashMap<BubbleId, NodeIndex>,

    /// Children of each parent, in attachment order.
    child_order: HashMap<NodeIndex, SmallVec<[NodeIndex; 4]>>,

    /// Next id handed out by `allocate_id`.
    next_id: u64,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Hand out an id that no bubble has used in this graph.
    pub fn allocate_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Insert a parentless bubble.
    pub fn insert(&mut self, bubble: Bubble) -> Result<NodeIndex, GraphError> {
        let id = bubble.id;
        if self.id_index.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        let idx = self.graph.add_node(bubble);
        self.id_index.insert(id, idx);
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        Ok(idx)
    }

    /// Insert a bubble and attach it under `parent`.
    pub fn insert_child(&mut self, parent: NodeIndex, bubble: Bubble) -> Result<NodeIndex, GraphError> {
        let idx = self.insert(bubble)?;
        self.connect(parent, idx);
        Ok(idx)
    }

    /// Remove a bubble, dropping every link touching it. Its children stay
    /// in the graph as parentless bubbles.
    pub fn remove(&mut self, idx: NodeIndex) -> Option<Bubble> {
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.child_order.get_mut(&parent)
        {
            siblings.retain(|c| *c != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx)?;
        self.id_index.remove(&removed.id);
        Some(removed)
    }

    /// Drop every bubble. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.id_index.clear();
        self.child_order.clear();
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Bubble> {
        self.graph.node_weight(idx)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut Bubble> {
        self.graph.node_weight_mut(idx)
    }

    pub fn get_by_id(&self, id: BubbleId) -> Option<&Bubble> {
        self.index_of(id).and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn get_by_id_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.index_of(id).and_then(|idx| self.graph.node_weight_mut(idx))
    }

    pub fn index_of(&self, id: BubbleId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn id_of(&self, idx: NodeIndex) -> Option<BubbleId> {
        self.graph.node_weight(idx).map(|b| b.id)
    }

    pub fn contains_id(&self, id: BubbleId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Bubbles in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Bubble)> {
        self.graph.node_indices().map(|idx| (idx, &self.graph[idx]))
    }

    pub fn bubbles_mut(&mut self) -> impl Iterator<Item = &mut Bubble> {
        self.graph.node_weights_mut()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Children in attachment order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Bubbles with no parent.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|idx| self.parent(*idx).is_none())
            .collect()
    }

    /// Append a link `parent → child`. The caller has already checked that
    /// this does not form a cycle. An existing parent link is replaced.
    pub fn connect(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.detach(child);
        let from = self.graph[parent].position;
        let to = self.graph[child].position;
        self.graph.add_edge(parent, child, Link { from, to });
        self.child_order.entry(parent).or_default().push(child);
    }

    /// Cut the link to the current parent, if any.
    pub fn detach(&mut self, child: NodeIndex) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(parent, child) {
            self.graph.remove_edge(edge);
        }
        if let Some(siblings) = self.child_order.get_mut(&parent) {
            siblings.retain(|c| *c != child);
        }
    }

    /// Move `child` under `new_parent`, or make it parentless with `None`.
    ///
    /// # Errors
    /// `Cycle` when `new_parent` is `child` itself or one of its descendants;
    /// the graph is left unchanged.
    pub fn set_parent(&mut self, child: NodeIndex, new_parent: Option<NodeIndex>) -> Result<(), GraphError> {
        let child_id = self.id_of(child).ok_or(GraphError::StaleIndex(child))?;
        match new_parent {
            None => {
                self.detach(child);
                Ok(())
            }
            Some(parent) => {
                let parent_id = self.id_of(parent).ok_or(GraphError::StaleIndex(parent))?;
                if parent == child || self.is_ancestor_of(child, parent) {
                    return Err(GraphError::Cycle {
                        child: child_id,
                        parent: parent_id,
                    });
                }
                if self.parent(child) == Some(parent) {
                    return Ok(());
                }
                self.connect(parent, child);
                Ok(())
            }
        }
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeIndex, descendant: NodeIndex) -> bool {
        let mut current = descendant;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Every descendant of `idx`, breadth-first, excluding `idx`.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.subtree_layers(idx).into_iter().skip(1).flatten().collect()
    }

    /// `idx` and its descendants grouped by depth: `[[idx], children, grandchildren, …]`.
    pub fn subtree_layers(&self, idx: NodeIndex) -> Vec<Vec<NodeIndex>> {
        if !self.graph.contains_node(idx) {
            return Vec::new();
        }
        let mut seen = HashSet::from([idx]);
        let mut layers = vec![vec![idx]];
        loop {
            let next: Vec<NodeIndex> = layers
                .last()
                .into_iter()
                .flatten()
                .flat_map(|n| self.children(*n).iter().copied())
                .filter(|c| seen.insert(*c))
                .collect();
            if next.is_empty() {
                break;
            }
            layers.push(next);
        }
        layers
    }

    /// Breadth-first walk from `idx` (inclusive), each bubble once.
    pub fn bfs(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([idx]);
        while let Some(n) = queue.pop_front() {
            if !self.graph.contains_node(n) || !seen.insert(n) {
                continue;
            }
            out.push(n);
            queue.extend(self.children(n).iter().copied());
        }
        out
    }

    /// All links as `(parent, child, link)`.
    pub fn links(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Link)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Copy each parent/child position into its link's rendered endpoints.
    pub fn refresh_links(&mut self) {
        let indices: Vec<_> = self.graph.edge_indices().collect();
        for e in indices {
            if let Some((p, c)) = self.graph.edge_endpoints(e) {
                let from = self.graph[p].position;
                let to = self.graph[c].position;
                self.graph[e] = Link { from, to };
            }
        }
    }
}
