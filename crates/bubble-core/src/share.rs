//! Share codes: a subtree as base64(gzip(JSON)).
//!
//! Export walks the subtree breadth-first and writes short-named records.
//! Import accepts both record conventions, gives every bubble a fresh id and
//! relinks parents through the old→new id map. Codes made before compression
//! was added (plain base64 JSON) still import.

use crate::id::BubbleId;
use crate::model::{Hyperlink, SceneGraph, Vec2};
use crate::record::{BubbleRecord, ShareRecord};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Offset applied to imported positions so a pasted copy is visible.
pub const IMPORT_NUDGE: Vec2 = Vec2::new(40.0, 40.0);

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("share code is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("could not compress share code: {0}")]
    Compress(#[source] std::io::Error),

    #[error("share code does not decompress: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("share code is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("share code does not contain a list of bubbles")]
    NotAList,

    #[error("bubble {0} is not in the map")]
    UnknownRoot(BubbleId),
}

// ─── Export ──────────────────────────────────────────────────────────────

/// Records for `root` and everything under it, breadth-first, each once.
pub fn subtree_records(graph: &SceneGraph, root: NodeIndex) -> Vec<ShareRecord> {
    graph
        .bfs(root)
        .into_iter()
        .filter_map(|idx| {
            let bubble = graph.get(idx)?;
            let parent = graph.parent(idx).and_then(|p| graph.id_of(p));
            Some(BubbleRecord::from_bubble(bubble, parent).into())
        })
        .collect()
}

/// Encode the subtree under `root` as a share code.
pub fn export_subtree(graph: &SceneGraph, root: BubbleId) -> Result<String, CodecError> {
    let idx = graph.index_of(root).ok_or(CodecError::UnknownRoot(root))?;
    let records = subtree_records(graph, idx);
    let json = serde_json::to_vec(&records)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(CodecError::Compress)?;
    let compressed = encoder.finish().map_err(CodecError::Compress)?;

    log::debug!(
        "exported {} bubbles ({} bytes json, {} gzipped)",
        records.len(),
        json.len(),
        compressed.len()
    );
    Ok(STANDARD.encode(compressed))
}

// ─── Import ──────────────────────────────────────────────────────────────

/// Decode a share code into records without touching any graph.
pub fn decode_share_code(code: &str) -> Result<Vec<BubbleRecord>, CodecError> {
    let bytes = STANDARD.decode(code.trim())?;

    let mut text = String::new();
    let json = match GzDecoder::new(bytes.as_slice()).read_to_string(&mut text) {
        Ok(_) => text,
        Err(gz_err) => match String::from_utf8(bytes) {
            Ok(plain) => {
                log::debug!("share code is not gzipped ({gz_err}), reading as plain JSON");
                plain
            }
            Err(_) => return Err(CodecError::Decompress(gz_err)),
        },
    };

    let value: serde_json::Value = serde_json::from_str(&json)?;
    if !value.is_array() {
        return Err(CodecError::NotAList);
    }
    Ok(serde_json::from_value(value)?)
}

/// Insert `records` into `graph` under fresh ids, shifted by `nudge`.
///
/// Parents are linked in a second pass through the id map; a record whose
/// parent is not part of the imported set becomes a root of the import.
/// Bubble hyperlinks pointing inside the set follow the remap. Returns the
/// new bubbles in record order.
pub fn import_records(graph: &mut SceneGraph, records: &[BubbleRecord], nudge: Vec2) -> Vec<NodeIndex> {
    let mut id_map: HashMap<BubbleId, BubbleId> = HashMap::with_capacity(records.len());
    let mut created = Vec::with_capacity(records.len());
    let mut accepted = Vec::with_capacity(records.len());

    for record in records {
        if id_map.contains_key(&record.id) {
            log::warn!("share code repeats bubble {}, skipping", record.id);
            continue;
        }
        let fresh = graph.allocate_id();
        let mut bubble = record.to_bubble();
        bubble.id = fresh;
        bubble.blob.noise_seed = fresh.noise_phase();
        bubble.place_at(bubble.position + nudge);
        match graph.insert(bubble) {
            Ok(idx) => {
                id_map.insert(record.id, fresh);
                created.push(idx);
                accepted.push(record);
            }
            Err(e) => log::warn!("import skipped a bubble: {e}"),
        }
    }

    for (record, &idx) in accepted.iter().zip(&created) {
        if let Some(bubble) = graph.get_mut(idx)
            && let Some(Hyperlink::Bubble(target)) = bubble.hyperlink().cloned()
            && let Some(&remapped) = id_map.get(&target)
        {
            bubble.set_hyperlink(Hyperlink::Bubble(remapped));
        }

        let Some(parent) = record.parent_id.and_then(|old| id_map.get(&old)) else {
            continue;
        };
        let child = id_map[&record.id];
        if let Err(e) = graph.link_by_id(child, *parent) {
            log::warn!("import dropped a parent link: {e}");
        }
    }

    log::debug!("imported {} of {} bubbles", created.len(), records.len());
    created
}

/// Decode `code` and import it. On failure the graph is unchanged.
pub fn import_code(graph: &mut SceneGraph, code: &str, nudge: Vec2) -> Result<Vec<NodeIndex>, CodecError> {
    let records = decode_share_code(code)?;
    Ok(import_records(graph, &records, nudge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bubble, BubbleKind};
    use pretty_assertions::assert_eq;

    fn sample() -> SceneGraph {
        let mut sg = SceneGraph::new();
        let root = sg
            .insert(Bubble::new(BubbleId(1), "root", BubbleKind::Root, Vec2::new(100.4, 200.6)))
            .unwrap();
        sg.insert_child(root, Bubble::new(BubbleId(2), "a", BubbleKind::Branch, Vec2::ZERO))
            .unwrap();
        sg
    }

    #[test]
    fn export_rounds_positions_and_uses_short_names() {
        let sg = sample();
        let records = subtree_records(&sg, sg.index_of(BubbleId(1)).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].x, records[0].y), (100.0, 201.0));
        let json = serde_json::to_string(&records[1]).unwrap();
        assert!(json.starts_with(r#"{"i":2,"t":"a","type":"branch""#), "{json}");
        assert!(json.contains(r#""p":1"#));
    }

    #[test]
    fn unknown_root_is_an_error() {
        assert!(matches!(
            export_subtree(&sample(), BubbleId(99)),
            Err(CodecError::UnknownRoot(_))
        ));
    }

    #[test]
    fn legacy_plain_base64_json_imports() {
        let code = STANDARD.encode(r#"[{"id": 7, "text": "old", "type": "root", "x": 0, "y": 0}]"#);
        let records = decode_share_code(&format!("  {code}\n")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "old");
    }

    #[test]
    fn rejects_bad_codes() {
        assert!(matches!(decode_share_code("***"), Err(CodecError::Base64(_))));
        let not_list = STANDARD.encode(r#"{"id": 1}"#);
        assert!(matches!(decode_share_code(&not_list), Err(CodecError::NotAList)));
        let not_json = STANDARD.encode("hello");
        assert!(matches!(decode_share_code(&not_json), Err(CodecError::Json(_))));
    }

    #[test]
    fn import_remaps_internal_hyperlinks() {
        let records: Vec<BubbleRecord> = serde_json::from_str(
            r#"[{"i": 1, "t": "hub", "type": "root", "x": 0, "y": 0},
                {"i": 2, "t": "jump", "type": "hyper", "x": 10, "y": 0, "p": 1,
                 "h": {"type": "bubble", "target": "1"}},
                {"i": 3, "t": "out", "type": "hyper", "x": 20, "y": 0, "p": 1,
                 "h": {"type": "bubble", "target": "500"}}]"#,
        )
        .unwrap();
        let mut sg = SceneGraph::new();
        sg.insert(Bubble::new(BubbleId(1), "existing", BubbleKind::Root, Vec2::ZERO))
            .unwrap();

        let created = import_records(&mut sg, &records, IMPORT_NUDGE);
        assert_eq!(created.len(), 3);
        let hub = sg.get(created[0]).unwrap().id;
        assert_ne!(hub, BubbleId(1));
        assert_eq!(sg.get(created[0]).unwrap().position, Vec2::new(40.0, 40.0));
        assert_eq!(sg.get(created[1]).unwrap().hyperlink(), Some(&Hyperlink::Bubble(hub)));
        assert_eq!(
            sg.get(created[2]).unwrap().hyperlink(),
            Some(&Hyperlink::Bubble(BubbleId(500)))
        );
        assert_eq!(sg.children(created[0]), &[created[1], created[2]]);
    }
}
