use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde_json::Value;

use crate::error::{EditorError, Result};

/// A `((...))` span found in a buffer.
///
/// `start` and `end` are character offsets (half-open) into the string the
/// token was parsed from. They go stale after any edit; re-parse instead of
/// patching them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Full token text including the `((` and `))` delimiters.
    pub match_text: String,
    /// Text between the delimiters.
    pub inner_text: String,
    pub start: usize,
    pub end: usize,
    pub is_resolved: bool,
    byte_start: usize,
    byte_end: usize,
}

impl Token {
    pub(crate) fn new(
        match_text: &str,
        start: usize,
        byte_start: usize,
        is_resolved: bool,
    ) -> Self {
        let inner_text = match_text[2..match_text.len() - 2].to_string();
        Self {
            match_text: match_text.to_string(),
            inner_text,
            start,
            end: start + match_text.chars().count(),
            is_resolved,
            byte_start,
            byte_end: byte_start + match_text.len(),
        }
    }

    /// Byte range of the token in the parsed string, for splicing.
    pub const fn byte_range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }
}

/// Character interval `[start, end)` occupied by a resolved token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub start: usize,
    pub end: usize,
}

impl Boundary {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// True if `pos` lies strictly between the edges.
    pub const fn strictly_contains(&self, pos: usize) -> bool {
        pos > self.start && pos < self.end
    }

    /// True if `pos` lies between the edges, edges included.
    pub const fn touches(&self, pos: usize) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Resolution checks the token parser needs from a mapping.
pub trait Lookup {
    /// Whether `inner` is a key of the mapping.
    fn has_key(&self, inner: &str) -> bool;
    /// Whether `token` (full `((...))` text) equals one of the mapping's values.
    fn has_value(&self, token: &str) -> bool;
}

/// Reference id → human-readable token text (`((label))`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
    entries: HashMap<String, String>,
    labels: HashSet<String>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, id: String, label: String) {
        if let Some(previous) = self.entries.insert(id, label.clone()) {
            if !self.entries.values().any(|v| *v == previous) {
                self.labels.remove(&previous);
            }
        }
        self.labels.insert(label);
    }
}

impl Lookup for ReferenceMap {
    fn has_key(&self, inner: &str) -> bool {
        self.entries.contains_key(inner)
    }

    fn has_value(&self, token: &str) -> bool {
        self.labels.contains(token)
    }
}

/// Human-readable token text (`((label))`) → reference token text (`((id))`).
///
/// Two ids sharing one label collapse into a single entry; the one inserted
/// last wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseMap {
    entries: HashMap<String, String>,
}

impl ReverseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lookup for ReverseMap {
    fn has_key(&self, inner: &str) -> bool {
        self.entries.contains_key(inner)
    }

    fn has_value(&self, token: &str) -> bool {
        self.entries.values().any(|id| id == token)
    }
}

/// Forward and reverse mappings built together from one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSet {
    pub forward: ReferenceMap,
    pub reverse: ReverseMap,
}

impl MappingSet {
    /// Build both mappings from `(id, label)` pairs, in order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::default();
        for (id, label) in pairs {
            let id = id.into();
            let label = label.into();
            set.reverse
                .entries
                .insert(label.clone(), format!("(({id}))"));
            set.forward.insert(id, label);
        }
        set
    }

    /// Parse the host's JSON payload, degrading to empty mappings.
    ///
    /// Failures are logged and never propagated; the editor keeps working
    /// with every token unresolved.
    pub fn parse(payload: &str) -> Self {
        match Self::try_parse(payload) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!(error = %err, data = payload, "Failed to parse reference mappings");
                Self::default()
            }
        }
    }

    /// Parse the host's JSON payload.
    ///
    /// An empty or whitespace-only payload yields empty mappings without
    /// error. Entries whose value is not a string are skipped.
    ///
    /// # Errors
    /// Returns an error if the payload is not valid JSON or is not an object.
    pub fn try_parse(payload: &str) -> Result<Self> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        let object = match serde_json::from_str::<Value>(payload)? {
            Value::Object(object) => object,
            other => {
                return Err(EditorError::NotAnObject {
                    found: json_kind(&other),
                });
            }
        };
        let pairs = object.into_iter().filter_map(|(id, label)| match label {
            Value::String(label) => Some((id, label)),
            other => {
                tracing::warn!(id = %id, kind = json_kind(&other), "Skipping non-string reference label");
                None
            }
        });
        Ok(Self::from_pairs(pairs))
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
