use ropey::Rope;

use super::history::{EditHistory, EditOperation};
use super::{Key, KeyInput};

/// Selection in character offsets. `anchor` stays put while `head` moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub const fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A caret with nothing selected.
    pub const fn collapsed(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub const fn start(&self) -> usize {
        if self.anchor <= self.head {
            self.anchor
        } else {
            self.head
        }
    }

    pub const fn end(&self) -> usize {
        if self.anchor >= self.head {
            self.anchor
        } else {
            self.head
        }
    }

    pub const fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// Kind of a text mutation, as reported to input listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    InsertText,
    InsertLineBreak,
    DeleteContentBackward,
    DeleteContentForward,
    HistoryUndo,
    HistoryRedo,
}

/// Veto hook consulted before a mutation; returning `false` cancels it.
pub type BeforeInputHook = Box<dyn FnMut(InputKind) -> bool>;

/// The editable surface: a rope-backed text buffer with a selection and a
/// native undo history.
///
/// Every mutation made through an editing primitive is recorded in the
/// history and reported as a pending input event. [`EditorBuffer::set_text`]
/// is a raw content assignment: it fires nothing and wipes the history.
pub struct EditorBuffer {
    rope: Rope,
    selection: Selection,
    history: EditHistory,
    pending_input: Vec<InputKind>,
    before_input: Option<BeforeInputHook>,
    delete_command: bool,
}

impl EditorBuffer {
    /// Create a new buffer from a string, caret at the start.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            selection: Selection::default(),
            history: EditHistory::new(),
            pending_input: Vec::new(),
            before_input: None,
            delete_command: true,
        }
    }

    /// Whether this surface offers a native delete command. Surfaces without
    /// one fall back to dispatching input events around a range splice.
    #[must_use]
    pub const fn with_delete_command(mut self, available: bool) -> Self {
        self.delete_command = available;
        self
    }

    pub const fn supports_delete_command(&self) -> bool {
        self.delete_command
    }

    /// Install a hook consulted before each mutation.
    pub fn set_before_input_hook(&mut self, hook: Option<BeforeInputHook>) {
        self.before_input = hook;
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Length in characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub const fn selection(&self) -> Selection {
        self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Select `[start, end)`. Offsets are clamped to the text and a start
    /// past the end collapses onto the end.
    pub fn set_selection_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.len_chars());
        let start = start.min(end);
        self.selection = Selection::new(start, end);
    }

    /// Set anchor and head directly (clamped).
    pub fn set_selection(&mut self, selection: Selection) {
        let len = self.len_chars();
        self.selection = Selection::new(selection.anchor.min(len), selection.head.min(len));
    }

    pub fn set_caret(&mut self, pos: usize) {
        self.set_selection(Selection::collapsed(pos));
    }

    /// Replace the whole content. No input event fires and the undo history
    /// is discarded; the caret moves to the end.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.history.clear();
        self.selection = Selection::collapsed(self.rope.len_chars());
    }

    /// Drain the input events produced since the last call.
    pub fn take_input_events(&mut self) -> Vec<InputKind> {
        std::mem::take(&mut self.pending_input)
    }

    /// Ask the before-input hook whether a mutation may proceed.
    pub fn dispatch_before_input(&mut self, kind: InputKind) -> bool {
        self.before_input.as_mut().is_none_or(|hook| hook(kind))
    }

    /// Report a completed mutation to input listeners.
    pub fn dispatch_input(&mut self, kind: InputKind) {
        self.pending_input.push(kind);
    }

    /// Replace `[start, end)` with `text`, caret after the insertion.
    ///
    /// Recorded in the undo history but fires no events; callers that need
    /// listeners notified dispatch them around the call.
    pub fn set_range_text(&mut self, text: &str, start: usize, end: usize) {
        let end = end.min(self.len_chars());
        let start = start.min(end);
        self.apply_edit(start, end, text);
    }

    /// Insert `text` over the current selection (typing or paste).
    pub fn insert_text(&mut self, text: &str) -> bool {
        let kind = if text == "\n" {
            InputKind::InsertLineBreak
        } else {
            InputKind::InsertText
        };
        if !self.dispatch_before_input(kind) {
            return false;
        }
        let (start, end) = (self.selection.start(), self.selection.end());
        self.apply_edit(start, end, text);
        self.dispatch_input(kind);
        true
    }

    /// Native delete command: removes the selection, or the character
    /// before a collapsed caret, as one undoable step.
    ///
    /// Returns `false` if the surface has no delete command or nothing was
    /// deleted.
    pub fn exec_delete(&mut self) -> bool {
        if !self.delete_command {
            return false;
        }
        self.delete_backward()
    }

    /// Delete the selection or the character before the caret (Backspace).
    pub fn delete_backward(&mut self) -> bool {
        let sel = self.selection;
        let (start, end) = if sel.is_collapsed() {
            if sel.head == 0 {
                return false;
            }
            (sel.head - 1, sel.head)
        } else {
            (sel.start(), sel.end())
        };
        self.delete_with(start, end, InputKind::DeleteContentBackward)
    }

    /// Delete the selection or the character after the caret (Delete).
    pub fn delete_forward(&mut self) -> bool {
        let sel = self.selection;
        let (start, end) = if sel.is_collapsed() {
            if sel.head >= self.len_chars() {
                return false;
            }
            (sel.head, sel.head + 1)
        } else {
            (sel.start(), sel.end())
        };
        self.delete_with(start, end, InputKind::DeleteContentForward)
    }

    /// Revert the most recent edit.
    pub fn undo(&mut self) -> bool {
        let Some(op) = self.history.undo() else {
            return false;
        };
        self.replay(&op);
        self.dispatch_input(InputKind::HistoryUndo);
        true
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self) -> bool {
        let Some(op) = self.history.redo() else {
            return false;
        };
        self.replay(&op);
        self.dispatch_input(InputKind::HistoryRedo);
        true
    }

    /// The surface's own handling of a key nobody intercepted.
    ///
    /// Returns `true` if the text or selection changed.
    pub fn apply_default_key(&mut self, input: KeyInput) -> bool {
        let before = (self.selection, self.len_chars());
        match input.key {
            Key::ArrowLeft => self.move_horizontal(false, input.shift),
            Key::ArrowRight => self.move_horizontal(true, input.shift),
            Key::ArrowUp => self.move_vertical(false, input.shift),
            Key::ArrowDown => self.move_vertical(true, input.shift),
            Key::Home => {
                let target = self.line_start(self.selection.head);
                self.move_head(target, input.shift);
            }
            Key::End => {
                let target = self.line_end(self.selection.head);
                self.move_head(target, input.shift);
            }
            Key::Backspace => return self.delete_backward(),
            Key::Delete => return self.delete_forward(),
            Key::Enter => return self.insert_text("\n"),
            Key::Char(ch) => {
                let mut buf = [0u8; 4];
                return self.insert_text(ch.encode_utf8(&mut buf));
            }
            Key::Other => {}
        }
        before != (self.selection, self.len_chars())
    }

    /// Select the word around `pos`, the default double-click behavior.
    ///
    /// A position touching no word character just places the caret.
    pub fn select_word_at(&mut self, pos: usize) {
        let pos = pos.min(self.len_chars());
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let touches_word = (pos < self.len_chars() && is_word(self.rope.char(pos)))
            || (pos > 0 && is_word(self.rope.char(pos - 1)));
        if !touches_word {
            self.set_caret(pos);
            return;
        }
        let mut start = pos;
        while start > 0 && is_word(self.rope.char(start - 1)) {
            start -= 1;
        }
        let mut end = pos;
        while end < self.len_chars() && is_word(self.rope.char(end)) {
            end += 1;
        }
        self.set_selection_range(start, end);
    }

    // --- Private helpers ---

    fn delete_with(&mut self, start: usize, end: usize, kind: InputKind) -> bool {
        if start == end || !self.dispatch_before_input(kind) {
            return false;
        }
        self.apply_edit(start, end, "");
        self.dispatch_input(kind);
        true
    }

    fn apply_edit(&mut self, start: usize, end: usize, text: &str) {
        let before = self.selection;
        let deleted = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.selection = Selection::collapsed(start + text.chars().count());
        self.history.push(EditOperation {
            offset: start,
            deleted,
            inserted: text.to_string(),
            selection_before: before,
            selection_after: self.selection,
        });
    }

    fn replay(&mut self, op: &EditOperation) {
        let end = op.offset + op.deleted.chars().count();
        self.rope.remove(op.offset..end);
        self.rope.insert(op.offset, &op.inserted);
        self.set_selection(op.selection_after);
    }

    fn move_head(&mut self, target: usize, extend: bool) {
        if extend {
            self.selection.head = target;
        } else {
            self.selection = Selection::collapsed(target);
        }
    }

    fn move_horizontal(&mut self, forward: bool, extend: bool) {
        let sel = self.selection;
        if !extend && !sel.is_collapsed() {
            let edge = if forward { sel.end() } else { sel.start() };
            self.selection = Selection::collapsed(edge);
            return;
        }
        let target = if forward {
            (sel.head + 1).min(self.len_chars())
        } else {
            sel.head.saturating_sub(1)
        };
        self.move_head(target, extend);
    }

    fn move_vertical(&mut self, down: bool, extend: bool) {
        let head = self.selection.head;
        let line = self.rope.char_to_line(head);
        let col = head - self.rope.line_to_char(line);
        let target_line = if down {
            if line + 1 >= self.rope.len_lines() {
                self.move_head(self.len_chars(), extend);
                return;
            }
            line + 1
        } else {
            if line == 0 {
                self.move_head(0, extend);
                return;
            }
            line - 1
        };
        let start = self.rope.line_to_char(target_line);
        let target = (start + col).min(self.line_end(start));
        self.move_head(target, extend);
    }

    fn line_start(&self, pos: usize) -> usize {
        self.rope.line_to_char(self.rope.char_to_line(pos))
    }

    fn line_end(&self, pos: usize) -> usize {
        let line_idx = self.rope.char_to_line(pos);
        let start = self.rope.line_to_char(line_idx);
        let line = self.rope.line(line_idx);
        let mut len = line.len_chars();
        while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        start + len
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("rope", &format_args!("Rope({} chars)", self.rope.len_chars()))
            .field("selection", &self.selection)
            .field("undo_len", &self.history.undo_len())
            .field("delete_command", &self.delete_command)
            .finish_non_exhaustive()
    }
}
