//! Range deletion that lands in the surface's native undo history.
//!
//! Assigning new content wholesale would wipe the undo stack, so an atomic
//! token is removed through one of two editing paths, picked once per surface
//! by [`DeleteStrategy::detect`].

use super::buffer::{InputKind, Selection};
use super::navigation::NativeEditing;

/// The single "delete range, preserving undo" capability.
pub trait RangeDeleter {
    /// Delete `[start, end)` as one undoable step.
    ///
    /// Returns `false` if the surface refused the edit.
    fn delete_range<S: NativeEditing + ?Sized>(&self, surface: &mut S, start: usize, end: usize)
    -> bool;
}

/// Select the range and run the surface's native delete command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDelete;

impl RangeDeleter for CommandDelete {
    fn delete_range<S: NativeEditing + ?Sized>(
        &self,
        surface: &mut S,
        start: usize,
        end: usize,
    ) -> bool {
        surface.set_selection(Selection::new(start, end));
        surface.exec_delete()
    }
}

/// Announce a cancelable backward deletion, splice the range out, then
/// report the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputEventDelete;

impl RangeDeleter for InputEventDelete {
    fn delete_range<S: NativeEditing + ?Sized>(
        &self,
        surface: &mut S,
        start: usize,
        end: usize,
    ) -> bool {
        surface.set_selection(Selection::new(start, end));
        if !surface.dispatch_before_input(InputKind::DeleteContentBackward) {
            return false;
        }
        surface.set_range_text("", start, end);
        surface.dispatch_input(InputKind::DeleteContentBackward);
        true
    }
}

/// The deletion path chosen for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStrategy {
    Command,
    InputEvent,
}

impl DeleteStrategy {
    /// Prefer the native delete command when the surface has one.
    pub fn detect<S: NativeEditing + ?Sized>(surface: &S) -> Self {
        if surface.supports_delete_command() {
            Self::Command
        } else {
            Self::InputEvent
        }
    }
}

impl RangeDeleter for DeleteStrategy {
    fn delete_range<S: NativeEditing + ?Sized>(
        &self,
        surface: &mut S,
        start: usize,
        end: usize,
    ) -> bool {
        match self {
            Self::Command => CommandDelete.delete_range(surface, start, end),
            Self::InputEvent => InputEventDelete.delete_range(surface, start, end),
        }
    }
}
