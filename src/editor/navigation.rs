//! Atomic navigation and editing around resolved reference tokens.
//!
//! The controller holds no state. Each handler re-parses the surface text,
//! derives the boundaries of resolved tokens and decides whether to take
//! over the input or leave it to the surface's default behavior.

use super::buffer::{EditorBuffer, InputKind, Selection};
use super::delete::RangeDeleter;
use super::{Key, KeyInput};
use crate::reference::{Boundary, Lookup, boundaries};

/// Read and place the selection of an editable surface.
pub trait EditSurface {
    fn text(&self) -> String;
    fn selection(&self) -> Selection;
    fn set_selection(&mut self, selection: Selection);
}

/// Editing primitives that keep the surface's undo history intact.
pub trait NativeEditing: EditSurface {
    fn supports_delete_command(&self) -> bool;
    /// Delete the current selection through the native delete command.
    fn exec_delete(&mut self) -> bool;
    /// Returns `false` if a listener cancelled the mutation.
    fn dispatch_before_input(&mut self, kind: InputKind) -> bool;
    fn set_range_text(&mut self, text: &str, start: usize, end: usize);
    fn dispatch_input(&mut self, kind: InputKind);
}

impl EditSurface for EditorBuffer {
    fn text(&self) -> String {
        Self::text(self)
    }

    fn selection(&self) -> Selection {
        Self::selection(self)
    }

    fn set_selection(&mut self, selection: Selection) {
        Self::set_selection(self, selection);
    }
}

impl NativeEditing for EditorBuffer {
    fn supports_delete_command(&self) -> bool {
        Self::supports_delete_command(self)
    }

    fn exec_delete(&mut self) -> bool {
        Self::exec_delete(self)
    }

    fn dispatch_before_input(&mut self, kind: InputKind) -> bool {
        Self::dispatch_before_input(self, kind)
    }

    fn set_range_text(&mut self, text: &str, start: usize, end: usize) {
        Self::set_range_text(self, text, start, end);
    }

    fn dispatch_input(&mut self, kind: InputKind) {
        Self::dispatch_input(self, kind);
    }
}

/// Whether a handler took over an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The default action is suppressed; the handler applied its own.
    Handled,
    /// The surface should apply its default action.
    Default,
}

/// Direction of caret travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Backward,
    Stationary,
    Forward,
}

/// Where a caret at `pos` should land so it never rests inside a token.
///
/// A position strictly inside a token moves to the far edge in the direction
/// of travel (a stationary caret goes to the end). Travelling forward from a
/// token's start skips to its end; travelling backward from its end skips
/// to its start.
pub fn adjust_cursor_position(text: &str, pos: usize, travel: Travel, mapping: &dyn Lookup) -> usize {
    adjust_within(&boundaries(text, mapping), pos, travel)
}

fn adjust_within(bounds: &[Boundary], pos: usize, travel: Travel) -> usize {
    for b in bounds {
        if b.strictly_contains(pos) {
            return if travel == Travel::Backward {
                b.start
            } else {
                b.end
            };
        }
        if travel == Travel::Forward && pos == b.start {
            return b.end;
        }
        if travel == Travel::Backward && pos == b.end {
            return b.start;
        }
    }
    pos
}

/// Intercept a key press before the surface applies it.
pub fn handle_key<S, D>(surface: &mut S, input: KeyInput, mapping: &dyn Lookup, deleter: &D) -> Outcome
where
    S: NativeEditing + ?Sized,
    D: RangeDeleter,
{
    let sel = surface.selection();
    let (start, end) = (sel.start(), sel.end());

    match input.key {
        Key::ArrowLeft | Key::ArrowRight => {
            if start != end && !input.shift {
                return Outcome::Default;
            }
            let (travel, current) = if input.key == Key::ArrowRight {
                (Travel::Forward, end)
            } else {
                (Travel::Backward, start)
            };
            let bounds = boundaries(&surface.text(), mapping);
            let target = adjust_within(&bounds, current, travel);
            if target == current {
                return Outcome::Default;
            }
            let next = match (input.shift, travel) {
                (false, _) => Selection::collapsed(target),
                (true, Travel::Forward) => Selection::new(start, target),
                (true, _) => Selection::new(end, target),
            };
            surface.set_selection(next);
            crate::perf::log_event(
                "nav.skip_token",
                format!("from={current} to={target} shift={}", input.shift),
            );
            Outcome::Handled
        }
        Key::Backspace | Key::Delete => {
            if start != end {
                return Outcome::Default;
            }
            let bounds = boundaries(&surface.text(), mapping);
            let hit = if input.key == Key::Backspace {
                bounds.iter().find(|b| b.end == start)
            } else {
                bounds.iter().find(|b| b.start == start)
            };
            let Some(token) = hit.copied() else {
                return Outcome::Default;
            };
            if deleter.delete_range(surface, token.start, token.end) {
                crate::perf::log_event(
                    "nav.delete_token",
                    format!("start={} end={}", token.start, token.end),
                );
            } else {
                tracing::debug!(start = token.start, end = token.end, "Token deletion was cancelled");
            }
            Outcome::Handled
        }
        _ => Outcome::Default,
    }
}

/// Caret correction after a click.
///
/// Returns where the caret belongs if the click put it strictly inside a
/// token: the nearer edge, ties going to the start. The host applies this
/// after its own caret placement has settled.
pub fn handle_click<S>(surface: &S, mapping: &dyn Lookup) -> Option<usize>
where
    S: EditSurface + ?Sized,
{
    let pos = surface.selection().start();
    let bounds = boundaries(&surface.text(), mapping);
    let token = bounds.iter().find(|b| b.strictly_contains(pos))?;
    let to_start = pos - token.start;
    let to_end = token.end - pos;
    Some(if to_start <= to_end {
        token.start
    } else {
        token.end
    })
}

/// Select a whole token when a double-click lands on or inside it.
pub fn handle_double_click<S>(surface: &mut S, mapping: &dyn Lookup) -> Outcome
where
    S: EditSurface + ?Sized,
{
    let pos = surface.selection().start();
    let bounds = boundaries(&surface.text(), mapping);
    let Some(token) = bounds.iter().find(|b| b.touches(pos)).copied() else {
        return Outcome::Default;
    };
    surface.set_selection(Selection::new(token.start, token.end));
    Outcome::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{CommandDelete, DeleteStrategy, InputEventDelete};
    use crate::reference::MappingSet;

    const VISIBLE: &str = "Some text with ((Sample Reference 1)) reference in the middle.";
    const TOKEN_START: usize = 15;
    const TOKEN_END: usize = 37;

    fn mappings() -> MappingSet {
        MappingSet::from_pairs([
            ("ref-1", "((Sample Reference 1))"),
            ("ref-2", "((Another Reference))"),
        ])
    }

    fn surface_at(text: &str, caret: usize) -> EditorBuffer {
        let mut buf = EditorBuffer::from_text(text);
        buf.set_caret(caret);
        buf
    }

    fn press(buf: &mut EditorBuffer, input: KeyInput, set: &MappingSet) -> Outcome {
        let strategy = DeleteStrategy::detect(buf);
        handle_key(buf, input, &set.forward, &strategy)
    }

    // --- adjust_cursor_position ---

    #[test]
    fn test_adjust_inside_goes_to_far_edge() {
        let set = mappings();
        let mid = TOKEN_START + 5;
        assert_eq!(adjust_cursor_position(VISIBLE, mid, Travel::Forward, &set.forward), TOKEN_END);
        assert_eq!(adjust_cursor_position(VISIBLE, mid, Travel::Backward, &set.forward), TOKEN_START);
        assert_eq!(adjust_cursor_position(VISIBLE, mid, Travel::Stationary, &set.forward), TOKEN_END);
    }

    #[test]
    fn test_adjust_skips_from_edges() {
        let set = mappings();
        assert_eq!(
            adjust_cursor_position(VISIBLE, TOKEN_START, Travel::Forward, &set.forward),
            TOKEN_END
        );
        assert_eq!(
            adjust_cursor_position(VISIBLE, TOKEN_END, Travel::Backward, &set.forward),
            TOKEN_START
        );
        assert_eq!(
            adjust_cursor_position(VISIBLE, TOKEN_START, Travel::Backward, &set.forward),
            TOKEN_START
        );
        assert_eq!(
            adjust_cursor_position(VISIBLE, TOKEN_END, Travel::Forward, &set.forward),
            TOKEN_END
        );
    }

    #[test]
    fn test_adjust_between_adjacent_tokens() {
        let set = mappings();
        let text = "((ref-1))((ref-2))";
        assert_eq!(adjust_cursor_position(text, 9, Travel::Forward, &set.forward), 18);
        assert_eq!(adjust_cursor_position(text, 9, Travel::Backward, &set.forward), 0);
    }

    // --- Arrow keys ---

    #[test]
    fn test_right_at_start_skips_token() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_START);
        assert_eq!(press(&mut buf, KeyInput::new(Key::ArrowRight), &set), Outcome::Handled);
        assert_eq!(buf.selection(), Selection::collapsed(TOKEN_END));
    }

    #[test]
    fn test_left_at_end_skips_token() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_END);
        assert_eq!(press(&mut buf, KeyInput::new(Key::ArrowLeft), &set), Outcome::Handled);
        assert_eq!(buf.selection(), Selection::collapsed(TOKEN_START));
    }

    #[test]
    fn test_arrow_outside_token_is_default() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, 3);
        assert_eq!(press(&mut buf, KeyInput::new(Key::ArrowRight), &set), Outcome::Default);
        assert_eq!(buf.selection(), Selection::collapsed(3));
    }

    #[test]
    fn test_arrow_with_selection_and_no_shift_is_default() {
        let set = mappings();
        let mut buf = EditorBuffer::from_text(VISIBLE);
        buf.set_selection_range(TOKEN_START, TOKEN_START + 3);
        assert_eq!(press(&mut buf, KeyInput::new(Key::ArrowRight), &set), Outcome::Default);
    }

    #[test]
    fn test_shift_right_extends_over_token() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_START);
        assert_eq!(press(&mut buf, KeyInput::shifted(Key::ArrowRight), &set), Outcome::Handled);
        assert_eq!(buf.selection(), Selection::new(TOKEN_START, TOKEN_END));
    }

    #[test]
    fn test_shift_left_extends_over_token() {
        let set = mappings();
        let mut buf = EditorBuffer::from_text(VISIBLE);
        buf.set_selection_range(TOKEN_END, TOKEN_END + 4);
        assert_eq!(press(&mut buf, KeyInput::shifted(Key::ArrowLeft), &set), Outcome::Handled);
        let sel = buf.selection();
        assert_eq!((sel.start(), sel.end()), (TOKEN_START, TOKEN_END + 4));
        assert_eq!(sel.head, TOKEN_START);
    }

    #[test]
    fn test_arrows_ignore_unresolved_tokens() {
        let set = mappings();
        let text = "x ((Unknown Thing)) y";
        let mut buf = surface_at(text, 2);
        assert_eq!(press(&mut buf, KeyInput::new(Key::ArrowRight), &set), Outcome::Default);
    }

    // --- Backspace / Delete ---

    #[test]
    fn test_backspace_at_token_end_deletes_whole_token() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_END);
        assert_eq!(press(&mut buf, KeyInput::new(Key::Backspace), &set), Outcome::Handled);
        assert_eq!(buf.text(), "Some text with  reference in the middle.");
        assert_eq!(buf.selection(), Selection::collapsed(TOKEN_START));
    }

    #[test]
    fn test_delete_at_token_start_deletes_whole_token() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_START);
        assert_eq!(press(&mut buf, KeyInput::new(Key::Delete), &set), Outcome::Handled);
        assert_eq!(buf.text(), "Some text with  reference in the middle.");
    }

    #[test]
    fn test_backspace_elsewhere_is_default() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_START);
        assert_eq!(press(&mut buf, KeyInput::new(Key::Backspace), &set), Outcome::Default);
        assert_eq!(buf.text(), VISIBLE);
    }

    #[test]
    fn test_backspace_with_selection_is_default() {
        let set = mappings();
        let mut buf = EditorBuffer::from_text(VISIBLE);
        buf.set_selection_range(TOKEN_END - 1, TOKEN_END);
        assert_eq!(press(&mut buf, KeyInput::new(Key::Backspace), &set), Outcome::Default);
    }

    #[test]
    fn test_atomic_delete_undoes_in_one_step() {
        let set = mappings();
        for strategy in [DeleteStrategy::Command, DeleteStrategy::InputEvent] {
            let mut buf = surface_at(VISIBLE, TOKEN_END);
            handle_key(&mut buf, KeyInput::new(Key::Backspace), &set.forward, &strategy);
            assert_eq!(buf.text(), "Some text with  reference in the middle.");
            assert!(buf.undo());
            assert_eq!(buf.text(), VISIBLE);
            assert!(!buf.can_undo());
        }
    }

    #[test]
    fn test_explicit_deleters_are_interchangeable() {
        let set = mappings();
        let mut a = surface_at(VISIBLE, TOKEN_START);
        let mut b = surface_at(VISIBLE, TOKEN_START).with_delete_command(false);
        handle_key(&mut a, KeyInput::new(Key::Delete), &set.forward, &CommandDelete);
        handle_key(&mut b, KeyInput::new(Key::Delete), &set.forward, &InputEventDelete);
        assert_eq!(a.text(), b.text());
    }

    #[test]
    fn test_cancelled_atomic_delete_still_suppresses_default() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_END).with_delete_command(false);
        buf.set_before_input_hook(Some(Box::new(|_: InputKind| false)));
        assert_eq!(press(&mut buf, KeyInput::new(Key::Backspace), &set), Outcome::Handled);
        assert_eq!(buf.text(), VISIBLE);
    }

    #[test]
    fn test_backspace_inside_unresolved_token_is_default() {
        let set = mappings();
        let text = "((Unknown Thing))";
        let mut buf = surface_at(text, 17);
        assert_eq!(press(&mut buf, KeyInput::new(Key::Backspace), &set), Outcome::Default);
    }

    #[test]
    fn test_other_keys_are_default() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, TOKEN_START + 1);
        for key in [Key::Home, Key::End, Key::Char('x'), Key::Enter, Key::ArrowUp] {
            assert_eq!(press(&mut buf, KeyInput::new(key), &set), Outcome::Default);
        }
    }

    // --- Clicks ---

    #[test]
    fn test_click_inside_goes_to_nearer_edge() {
        let set = mappings();
        let buf = surface_at(VISIBLE, TOKEN_START + 2);
        assert_eq!(handle_click(&buf, &set.forward), Some(TOKEN_START));
        let buf = surface_at(VISIBLE, TOKEN_END - 2);
        assert_eq!(handle_click(&buf, &set.forward), Some(TOKEN_END));
    }

    #[test]
    fn test_click_tie_favors_start() {
        let set = MappingSet::from_pairs([("k", "((ab))")]);
        // Token spans 0..6; offset 3 is equidistant.
        let buf = surface_at("((ab))", 3);
        assert_eq!(handle_click(&buf, &set.forward), Some(0));
    }

    #[test]
    fn test_click_on_edge_or_outside_needs_no_correction() {
        let set = mappings();
        for pos in [0, TOKEN_START, TOKEN_END] {
            let buf = surface_at(VISIBLE, pos);
            assert_eq!(handle_click(&buf, &set.forward), None);
        }
    }

    // --- Double clicks ---

    #[test]
    fn test_double_click_selects_token() {
        let set = mappings();
        for pos in [TOKEN_START, TOKEN_START + 4, TOKEN_END] {
            let mut buf = surface_at(VISIBLE, pos);
            assert_eq!(handle_double_click(&mut buf, &set.forward), Outcome::Handled);
            assert_eq!(buf.selection(), Selection::new(TOKEN_START, TOKEN_END));
        }
    }

    #[test]
    fn test_double_click_outside_is_default() {
        let set = mappings();
        let mut buf = surface_at(VISIBLE, 2);
        assert_eq!(handle_double_click(&mut buf, &set.forward), Outcome::Default);
        assert_eq!(buf.selection(), Selection::collapsed(2));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn click_to_edge_then_edge_delete_removes_exactly_the_token(offset in 1usize..22) {
                let set = mappings();
                let mut buf = surface_at(VISIBLE, TOKEN_START + offset);
                // A click first pulls the caret to an edge, then the edge key deletes.
                let edge = handle_click(&buf, &set.forward).unwrap();
                buf.set_caret(edge);
                let key = if edge == TOKEN_END { Key::Backspace } else { Key::Delete };
                prop_assert_eq!(press(&mut buf, KeyInput::new(key), &set), Outcome::Handled);
                prop_assert_eq!(buf.text(), "Some text with  reference in the middle.");
            }

            #[test]
            fn caret_never_rests_inside_after_arrow(pos in 0usize..62, right in any::<bool>()) {
                let set = mappings();
                let mut buf = surface_at(VISIBLE, pos);
                let key = if right { Key::ArrowRight } else { Key::ArrowLeft };
                if press(&mut buf, KeyInput::new(key), &set) == Outcome::Default {
                    buf.apply_default_key(KeyInput::new(key));
                }
                let head = buf.selection().head;
                prop_assert!(!(head > TOKEN_START && head < TOKEN_END));
            }
        }
    }
}
