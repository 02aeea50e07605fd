//! Editable surface and atomic reference-token editing.
//!
//! Provides a rope-backed text surface with a selection and native undo,
//! plus the controller that makes resolved tokens behave as single units
//! under cursor movement, clicks and deletion.

mod buffer;
mod delete;
mod history;
pub mod navigation;

pub use buffer::{BeforeInputHook, EditorBuffer, InputKind, Selection};
pub use delete::{CommandDelete, DeleteStrategy, InputEventDelete, RangeDeleter};
pub use history::{EditHistory, EditOperation};
pub use navigation::{EditSurface, NativeEditing, Outcome, Travel};

/// Keys the editor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Backspace,
    Delete,
    Enter,
    Char(char),
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(name: &str) -> Self {
        match name {
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// A key press with its shift state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub const fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub const fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}
