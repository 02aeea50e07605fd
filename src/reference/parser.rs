use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Boundary, Lookup, ReferenceMap, Token};

/// Token grammar: `((`, one or more characters other than `)`, then `))`.
pub const TOKEN_PATTERN: &str = r"\(\([^)]+\)\)";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(TOKEN_PATTERN).expect("valid token regex"));

/// Scan `text` for tokens in document order.
///
/// A token is resolved when its inner text is a key of `mapping`, or when
/// its full text already equals one of the mapping's values. Without a
/// mapping every token is unresolved.
pub fn parse_tokens(text: &str, mapping: Option<&dyn Lookup>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for m in TOKEN_RE.find_iter(text) {
        char_cursor += text[byte_cursor..m.start()].chars().count();

        let match_text = m.as_str();
        let inner = &match_text[2..match_text.len() - 2];
        let is_resolved =
            mapping.is_some_and(|map| map.has_key(inner) || map.has_value(match_text));

        let token = Token::new(match_text, char_cursor, m.start(), is_resolved);
        char_cursor = token.end;
        byte_cursor = m.end();
        tokens.push(token);
    }

    tokens
}

/// Direct lookup of the human-readable token text for a reference id.
pub fn resolve<'a>(id: &str, mapping: &'a ReferenceMap) -> Option<&'a str> {
    mapping.get(id)
}

/// Character intervals of the resolved tokens in `text`, in order.
///
/// Unresolved tokens are plain text as far as editing is concerned and never
/// appear here.
pub fn boundaries(text: &str, mapping: &dyn Lookup) -> Vec<Boundary> {
    parse_tokens(text, Some(mapping))
        .into_iter()
        .filter(|token| token.is_resolved)
        .map(|token| Boundary::new(token.start, token.end))
        .collect()
}
