//! Highlight overlay rendering.
//!
//! The overlay sits under the editable surface and shows the same text with
//! resolved reference tokens wrapped in a highlight span. It is rebuilt
//! wholesale from the visible buffer on every change.

use crate::host::{ScrollOffset, Size};
use crate::reference::{Lookup, parse_tokens};

/// Class applied to the overlay element.
pub const OVERLAY_CLASS: &str = "app-context-aware-editor__highlight-overlay";

/// Class of the span wrapping each resolved token.
pub const VALID_REFERENCE_CLASS: &str = "app-context-aware-editor--valid-reference";

/// Render `visible` as overlay markup.
///
/// Resolved tokens are wrapped verbatim in a highlight span. Everything
/// outside a span is escaped for embedding in markup and has its newlines
/// turned into `<br>`. Unresolved tokens are ordinary text.
pub fn render(visible: &str, mapping: &dyn Lookup) -> String {
    let _scope = crate::perf::scope("highlight.render");
    let mut markup = String::with_capacity(visible.len() + visible.len() / 4);
    let mut last = 0;

    for token in parse_tokens(visible, Some(mapping)) {
        if !token.is_resolved {
            continue;
        }
        let range = token.byte_range();
        escape_into(&mut markup, &visible[last..range.start]);
        markup.push_str("<span class=\"");
        markup.push_str(VALID_REFERENCE_CLASS);
        markup.push_str("\">");
        markup.push_str(&token.match_text);
        markup.push_str("</span>");
        last = range.end;
    }
    escape_into(&mut markup, &visible[last..]);
    markup
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(ch),
        }
    }
}

/// The non-interactive layer drawn over the editable surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    markup: String,
    scroll: ScrollOffset,
    size: Size,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub const fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub const fn size(&self) -> Size {
        self.size
    }

    pub const fn class_name(&self) -> &'static str {
        OVERLAY_CLASS
    }

    /// The overlay is decorative and always hidden from assistive tech.
    pub const fn aria_hidden(&self) -> bool {
        true
    }

    /// Re-render from the surface text and realign with its scroll position.
    pub fn update(&mut self, visible: &str, scroll: ScrollOffset, mapping: &dyn Lookup) {
        self.markup = render(visible, mapping);
        self.sync_scroll(scroll);
    }

    pub const fn sync_scroll(&mut self, scroll: ScrollOffset) {
        self.scroll = scroll;
    }

    pub const fn sync_size(&mut self, size: Size) {
        self.size = size;
    }
}
