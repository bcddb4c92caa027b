//! Flattened bubble records.
//!
//! A record is the serialized form of one bubble with its parent expressed as
//! an id. Lists of records are what gets persisted, shared and snapshotted.
//! Rebuilding a graph from records always goes in two passes: every bubble is
//! created first, then parent links are resolved by id, because a child's
//! record may come before its parent's.

use crate::id::BubbleId;
use crate::model::{Bubble, BubbleColor, BubbleKind, Content, GraphError, Hyperlink, LineStyle, SceneGraph, Vec2};
use serde::{Deserialize, Deserializer, Serialize};

/// Persisted hyperlink: `{"type": "none"|"url"|"bubble", "target": "…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "type", default = "LinkRecord::none_tag")]
    pub kind: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub target: String,
}

impl From<&Hyperlink> for LinkRecord {
    fn from(link: &Hyperlink) -> Self {
        let (kind, target) = match link {
            Hyperlink::None => ("none", String::new()),
            Hyperlink::Url(url) => ("url", url.clone()),
            Hyperlink::Bubble(id) => ("bubble", id.get().to_string()),
        };
        Self {
            kind: kind.to_string(),
            target,
        }
    }
}

impl LinkRecord {
    fn none_tag() -> String {
        "none".to_string()
    }

    /// Interpret the record. An unparsable bubble target reads as no link.
    pub fn to_hyperlink(&self) -> Hyperlink {
        match self.kind.as_str() {
            "url" if !self.target.is_empty() => Hyperlink::Url(self.target.clone()),
            "bubble" => match BubbleId::parse(&self.target) {
                Some(id) => Hyperlink::Bubble(id),
                None => {
                    log::warn!("hyperlink target {:?} is not a bubble id", self.target);
                    Hyperlink::None
                }
            },
            _ => Hyperlink::None,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

/// One bubble in the persisted format (long field names).
///
/// The short share-code names (`i`, `t`, `c`, `p`, `col`, `r`, `l`, `h`) are
/// accepted as aliases, so this type reads both conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleRecord {
    #[serde(alias = "i")]
    pub id: BubbleId,
    #[serde(alias = "t", default)]
    pub text: String,
    #[serde(rename = "type", default = "BubbleRecord::branch_tag")]
    pub kind: String,
    #[serde(alias = "c", default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(alias = "p", default)]
    pub parent_id: Option<BubbleId>,
    #[serde(alias = "col", default)]
    pub color: Option<BubbleColor>,
    /// Only present when the radius was set explicitly.
    #[serde(alias = "r", default)]
    pub radius: Option<f32>,
    #[serde(alias = "l", default)]
    pub line_options: Option<LineStyle>,
    #[serde(alias = "h", default)]
    pub hyperlink: Option<LinkRecord>,
}

impl BubbleRecord {
    fn branch_tag() -> String {
        "branch".to_string()
    }

    /// Flatten a bubble. `parent_id` is filled in by the caller.
    pub fn from_bubble(bubble: &Bubble, parent_id: Option<BubbleId>) -> Self {
        Self {
            id: bubble.id,
            text: bubble.text().to_string(),
            kind: bubble.kind.tag().to_string(),
            content: bubble.content.clone(),
            x: bubble.position.x,
            y: bubble.position.y,
            parent_id,
            color: Some(bubble.color.clone()),
            radius: bubble.radius_override(),
            line_options: Some(bubble.line_style.clone()),
            hyperlink: bubble.hyperlink().map(LinkRecord::from),
        }
    }

    /// Materialize the bubble at rest at its recorded position. Missing
    /// optional fields take their defaults.
    pub fn to_bubble(&self) -> Bubble {
        let link = self
            .hyperlink
            .as_ref()
            .map(LinkRecord::to_hyperlink)
            .unwrap_or_default();
        let kind = BubbleKind::from_tag(&self.kind, link);
        let mut bubble = Bubble::new(self.id, self.text.clone(), kind, Vec2::new(self.x, self.y));
        if let Some(r) = self.radius.filter(|r| r.is_finite() && *r > 0.0) {
            bubble.set_radius(r);
        }
        bubble.content = self.content.clone();
        bubble.color = self.color.clone().unwrap_or_default();
        bubble.line_style = self.line_options.clone().unwrap_or_default();
        bubble
    }
}

/// One bubble in the share-code format (short field names, rounded position).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRecord {
    pub i: BubbleId,
    pub t: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub c: Option<Content>,
    pub x: f32,
    pub y: f32,
    pub p: Option<BubbleId>,
    pub col: BubbleColor,
    pub r: Option<f32>,
    pub l: LineStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<LinkRecord>,
}

impl From<BubbleRecord> for ShareRecord {
    fn from(r: BubbleRecord) -> Self {
        Self {
            i: r.id,
            t: r.text,
            kind: r.kind,
            c: r.content,
            x: r.x.round(),
            y: r.y.round(),
            p: r.parent_id,
            col: r.color.unwrap_or_default(),
            r: r.radius,
            l: r.line_options.unwrap_or_default(),
            h: r.hyperlink,
        }
    }
}

// ─── Graph ⇄ records ─────────────────────────────────────────────────────

impl SceneGraph {
    /// Flatten the whole graph, in index order.
    pub fn to_records(&self) -> Vec<BubbleRecord> {
        self.iter()
            .map(|(idx, bubble)| {
                let parent = self.parent(idx).and_then(|p| self.id_of(p));
                BubbleRecord::from_bubble(bubble, parent)
            })
            .collect()
    }

    /// Build a graph from records.
    pub fn from_records(records: &[BubbleRecord]) -> Self {
        let mut graph = SceneGraph::new();
        graph.extend_from_records(records);
        graph
    }

    /// Replace the whole graph with the contents of `records`. Ids handed
    /// out afterwards still never go below anything seen before.
    pub fn restore(&mut self, records: &[BubbleRecord]) {
        self.clear();
        self.extend_from_records(records);
    }

    /// Two-pass insert: create every bubble, then link parents by id.
    /// Duplicate ids and links that would close a cycle are skipped.
    /// Returns the number of bubbles created.
    pub fn extend_from_records(&mut self, records: &[BubbleRecord]) -> usize {
        let accepted: Vec<&BubbleRecord> = records
            .iter()
            .filter(|record| match self.insert(record.to_bubble()) {
                Ok(_) => true,
                Err(e) => {
                    log::warn!("skipping record: {e}");
                    false
                }
            })
            .collect();
        let created = accepted.len();

        for record in accepted {
            let Some(parent_id) = record.parent_id else {
                continue;
            };
            if let Err(e) = self.link_by_id(record.id, parent_id) {
                log::warn!("dropping parent link: {e}");
            }
        }
        log::debug!("rebuilt {created} of {} records", records.len());
        created
    }

    /// Attach `child` under `parent`, both given by id.
    pub fn link_by_id(&mut self, child: BubbleId, parent: BubbleId) -> Result<(), GraphError> {
        let child = self.index_of(child).ok_or(GraphError::UnknownBubble(child))?;
        let parent = self.index_of(parent).ok_or(GraphError::UnknownBubble(parent))?;
        self.set_parent(child, Some(parent))
    }
}
