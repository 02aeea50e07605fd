//! Error types for editor setup.
//!
//! None of these reach the host as failures: initialization logs them and
//! leaves the container in its plain, unenhanced state.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No field marked with {marker} found in container")]
    MissingTarget { marker: &'static str },

    #[error("Container is already enhanced")]
    AlreadyInitialized,

    #[error("Invalid reference mapping payload: {0}")]
    InvalidMapping(#[from] serde_json::Error),

    #[error("Reference mapping payload is not an object (found {found})")]
    NotAnObject { found: &'static str },
}

pub type Result<T> = std::result::Result<T, EditorError>;
