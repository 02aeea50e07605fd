// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorBuffer)
    clippy::module_name_repetitions
)]

//! # Refmark
//!
//! A reference-aware text editor core.
//!
//! Form text stores references to other content as `((id))` tokens. Refmark
//! lets people edit that text with human-readable labels in place of the ids:
//! - Raw and labelled text converted in both directions
//! - Resolved tokens highlighted through a markup overlay
//! - Tokens treated as single units by arrows, clicks and deletion
//! - A hidden raw field kept in step with every edit
//!
//! ## Architecture
//!
//! Each enhanced field is a [`sync::ContextEditor`] owning two buffers:
//! - **Raw**: the submitted value, holding ids
//! - **Visible**: the edited value, holding labels
//!
//! Host events flow into the editor, the navigation controller decides
//! whether to take them over, and any resulting change is mapped back to
//! the raw buffer.
//!
//! ## Modules
//!
//! - [`reference`]: Token scanning and the id/label mappings
//! - [`transform`]: Raw and labelled text conversion
//! - [`highlight`]: Overlay markup rendering
//! - [`editor`]: Editable surface and atomic token navigation
//! - [`host`]: Containers, fields and change notifications
//! - [`sync`]: Dual-buffer editor lifecycle
//! - [`config`]: Container attributes and CLI defaults

pub mod config;
pub mod editor;
pub mod error;
pub mod highlight;
pub mod host;
pub mod perf;
pub mod reference;
pub mod sync;
pub mod transform;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::editor::{EditorBuffer, Key, KeyInput, Outcome};
    pub use crate::host::{Container, FieldEvent, TextField};
    pub use crate::reference::MappingSet;
    pub use crate::sync::{ContextEditor, EditorEvent};
}
