//! Conversion between the raw and human-readable forms of a buffer.
//!
//! Both directions parse the input once and splice replacements from the
//! last token backwards, so offsets of earlier tokens stay valid while the
//! output is built.

use crate::reference::{ReferenceMap, ReverseMap, Token, parse_tokens, resolve};

/// Replace every known `((id))` in `raw` with its `((label))`.
///
/// Unknown ids, ids mapped to an empty label, and tokens that are already
/// labels pass through unchanged.
pub fn to_human_readable(raw: &str, mapping: &ReferenceMap) -> String {
    let _scope = crate::perf::scope("transform.to_human_readable");
    let tokens = parse_tokens(raw, Some(mapping));
    splice_reverse(raw, &tokens, |token| {
        if !token.is_resolved {
            return None;
        }
        resolve(&token.inner_text, mapping).filter(|label| !label.is_empty())
    })
}

/// Replace every known `((label))` in `visible` with its `((id))`.
pub fn to_raw_references(visible: &str, reverse: &ReverseMap) -> String {
    let _scope = crate::perf::scope("transform.to_raw_references");
    let tokens = parse_tokens(visible, Some(reverse));
    splice_reverse(visible, &tokens, |token| reverse.get(&token.match_text))
}

fn splice_reverse<'a, F>(text: &str, tokens: &[Token], mut replacement: F) -> String
where
    F: FnMut(&Token) -> Option<&'a str>,
{
    let mut out = text.to_string();
    for token in tokens.iter().rev() {
        if let Some(with) = replacement(token) {
            out.replace_range(token.byte_range(), with);
        }
    }
    out
}
