pub mod id;
pub mod layout;
pub mod model;
pub mod physics;
pub mod record;
pub mod share;
pub mod storage;

pub use id::BubbleId;
pub use layout::{LayoutConfig, LayoutKind, apply_targets, compute_targets};
pub use model::*;
pub use physics::{Interaction, PhysicsConfig, PointerMotion, step_bubble};
pub use record::{BubbleRecord, LinkRecord, ShareRecord};
pub use share::{CodecError, IMPORT_NUDGE, decode_share_code, export_subtree, import_code, import_records};
pub use storage::{KeyValueStore, MemoryStore, STORAGE_KEY, load_records, save_records};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
