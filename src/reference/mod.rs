//! Reference tokens and the mappings that resolve them.
//!
//! This module handles:
//! - Scanning text for `((...))` tokens
//! - Classifying tokens as resolved or unresolved against a mapping
//! - Building the forward (id → label) and reverse (label → id) mappings
//!   from the host's JSON payload

mod parser;
mod types;

pub use parser::{TOKEN_PATTERN, boundaries, parse_tokens, resolve};
pub use types::{Boundary, Lookup, MappingSet, ReferenceMap, ReverseMap, Token};
