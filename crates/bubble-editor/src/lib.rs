pub mod cascade;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod placement;
pub mod search;
pub mod shortcuts;
pub mod tools;
pub mod viewport;

pub use config::EditorConfig;
pub use engine::{FrameInfo, LinkAction, MindMap, RenderObserver};
pub use error::EditError;
pub use input::{InputEvent, Modifiers, PointerButton};
pub use search::SearchField;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use viewport::Viewport;
