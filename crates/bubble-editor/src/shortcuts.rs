//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s so every host
//! shares the same bindings.

use crate::input::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    DeleteSelected,
    Deselect,
    ZoomIn,
    ZoomOut,
    SearchNext,
    SearchPrevious,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a `KeyboardEvent.key` value. `None` when unbound.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::SearchPrevious),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "g" | "G" => Some(ShortcutAction::SearchNext),
                _ => None,
            };
        }

        match key {
            "Delete" => Some(ShortcutAction::DeleteSelected),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}
