//! C9: view state machine.
//!
//! Four tagged states, explicit rather than built from ad-hoc booleans:
//! live streaming, paused streaming, editing the kind filter, and editing
//! the keyword filter. Entering an edit state snapshots the value being
//! edited; escaping restores that snapshot exactly, so a half-typed keyword
//! or a half-toggled kind set never leaks into the active query.
//!
//! Auxiliary to the four states: a viewport/selection pair over whatever
//! page of rows is currently loaded, and a keyword-edit debounce timer
//! (§4.7). Selection never leaves the loaded set.

use crate::cache::QueryMode;
use crate::keyword::KeywordFilter;
use crate::model::EventKind;
use std::collections::HashSet;

/// Keystrokes pause debounced local re-querying for this long before one
/// fires (§4.7).
pub const KEYWORD_DEBOUNCE_MS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    StreamLive,
    StreamPaused,
    EditingKindFilter,
    EditingKeyword,
}

pub struct ViewerState {
    pub mode: Mode,
    pub query_mode: QueryMode,
    /// Empty means no kind filter (every kind visible).
    pub kind_filter: HashSet<EventKind>,
    pub keyword_raw: String,

    /// Index, within the loaded row set, of the first row drawn.
    pub viewport_start: usize,
    /// Index, within the loaded row set, of the highlighted row.
    pub selected: usize,
    /// How many rows are currently loaded into the viewer's buffer.
    pub loaded_count: usize,
    /// True if the store has more matching rows beyond what is loaded.
    pub has_more_data: bool,
    /// True while a page fetch triggered by auto-fill is in flight.
    pub is_loading_more: bool,

    /// Deadline (ms, same clock as the caller's `now_ms`) at which a
    /// pending keyword edit should trigger a local re-query. `None` means
    /// no edit is pending.
    keyword_debounce_deadline: Option<i64>,
    /// Whether `keyword_raw` has been promoted to a full database search
    /// (via Enter) rather than being a debounced local preview.
    pub keyword_db_applied: bool,

    /// What to return to on confirm/escape; also what "restore" restores
    /// from, while in an editing state.
    resume_mode: Mode,
    kind_filter_snapshot: Option<HashSet<EventKind>>,
    keyword_snapshot: Option<String>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            mode: Mode::StreamLive,
            query_mode: QueryMode::All,
            kind_filter: HashSet::new(),
            keyword_raw: String::new(),
            viewport_start: 0,
            selected: 0,
            loaded_count: 0,
            has_more_data: false,
            is_loading_more: false,
            keyword_debounce_deadline: None,
            keyword_db_applied: true,
            resume_mode: Mode::StreamLive,
            kind_filter_snapshot: None,
            keyword_snapshot: None,
        }
    }
}

impl ViewerState {
    pub fn toggle_pause(&mut self) {
        self.mode = match self.mode {
            Mode::StreamLive => Mode::StreamPaused,
            Mode::StreamPaused => Mode::StreamLive,
            other => other,
        };
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::EditingKindFilter | Mode::EditingKeyword)
    }

    pub fn enter_kind_filter_edit(&mut self) {
        if self.is_editing() {
            return;
        }
        self.resume_mode = self.mode;
        self.kind_filter_snapshot = Some(self.kind_filter.clone());
        self.keyword_snapshot = Some(self.keyword_raw.clone());
        self.mode = Mode::EditingKindFilter;
    }

    pub fn toggle_kind(&mut self, kind: EventKind) {
        if self.mode != Mode::EditingKindFilter {
            return;
        }
        if !self.kind_filter.remove(&kind) {
            self.kind_filter.insert(kind);
        }
    }

    pub fn reset_kind_filter(&mut self) {
        if self.mode == Mode::EditingKindFilter {
            self.kind_filter.clear();
        }
    }

    pub fn confirm_kind_filter_edit(&mut self) {
        if self.mode != Mode::EditingKindFilter {
            return;
        }
        self.kind_filter_snapshot = None;
        self.keyword_snapshot = None;
        self.mode = self.resume_mode;
    }

    pub fn escape_kind_filter_edit(&mut self) {
        if self.mode != Mode::EditingKindFilter {
            return;
        }
        if let Some(snapshot) = self.kind_filter_snapshot.take() {
            self.kind_filter = snapshot;
        }
        self.keyword_snapshot = None;
        self.mode = self.resume_mode;
    }

    pub fn enter_keyword_edit(&mut self) {
        if self.is_editing() {
            return;
        }
        self.resume_mode = self.mode;
        self.keyword_snapshot = Some(self.keyword_raw.clone());
        self.keyword_db_applied = false;
        self.mode = Mode::EditingKeyword;
    }

    pub fn push_keyword_char(&mut self, c: char, now_ms: i64) {
        if self.mode == Mode::EditingKeyword {
            self.keyword_raw.push(c);
            self.keyword_debounce_deadline = Some(now_ms + KEYWORD_DEBOUNCE_MS);
        }
    }

    pub fn pop_keyword_char(&mut self, now_ms: i64) {
        if self.mode == Mode::EditingKeyword {
            self.keyword_raw.pop();
            self.keyword_debounce_deadline = Some(now_ms + KEYWORD_DEBOUNCE_MS);
        }
    }

    pub fn confirm_keyword_edit(&mut self) {
        if self.mode != Mode::EditingKeyword {
            return;
        }
        self.keyword_snapshot = None;
        self.keyword_debounce_deadline = None;
        self.keyword_db_applied = true;
        self.mode = self.resume_mode;
    }

    pub fn escape_keyword_edit(&mut self) {
        if self.mode != Mode::EditingKeyword {
            return;
        }
        if let Some(snapshot) = self.keyword_snapshot.take() {
            self.keyword_raw = snapshot;
        }
        self.keyword_debounce_deadline = None;
        self.keyword_db_applied = true;
        self.mode = self.resume_mode;
    }

    /// True once the debounce timer set by the last keystroke has expired;
    /// consumes the pending deadline so it fires only once.
    pub fn take_expired_keyword_debounce(&mut self, now_ms: i64) -> bool {
        match self.keyword_debounce_deadline {
            Some(deadline) if now_ms >= deadline => {
                self.keyword_debounce_deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn keyword_edit_pending(&self) -> bool {
        self.keyword_debounce_deadline.is_some()
    }

    pub fn set_query_mode(&mut self, mode: QueryMode) {
        self.query_mode = mode;
    }

    pub fn normalized_keyword(&self) -> KeywordFilter {
        KeywordFilter::normalize(&self.keyword_raw)
    }

    /// Resets mode/kind-filter/keyword to defaults, as Escape does from
    /// `stream-live`/`stream-paused` (§4.7). Caller is responsible for
    /// invalidating the cache.
    pub fn reset_to_defaults(&mut self) {
        self.query_mode = QueryMode::All;
        self.kind_filter.clear();
        self.keyword_raw.clear();
        self.keyword_debounce_deadline = None;
        self.keyword_db_applied = true;
        self.viewport_start = 0;
        self.selected = 0;
    }

    /// Record the result of a refresh: how many rows are loaded and whether
    /// more exist in the store. Clamps `selected`/`viewport_start` so
    /// selection never points past the loaded set (§4.7).
    pub fn note_loaded(&mut self, loaded_count: usize, has_more_data: bool) {
        self.loaded_count = loaded_count;
        self.has_more_data = has_more_data;
        self.is_loading_more = false;
        if self.selected >= loaded_count {
            self.selected = loaded_count.saturating_sub(1);
        }
        if self.viewport_start >= loaded_count {
            self.viewport_start = loaded_count.saturating_sub(1);
        }
    }

    /// Refresh is suspended while paused, while scrolled away from the top,
    /// or while a filter has been applied and the store has no more data
    /// beyond what's loaded (§4.7).
    pub fn refresh_suspended(&self) -> bool {
        if self.mode == Mode::StreamPaused {
            return true;
        }
        if self.viewport_start != 0 {
            return true;
        }
        let filter_applied = !self.kind_filter.is_empty() || !self.keyword_raw.is_empty();
        filter_applied && !self.has_more_data && self.loaded_count > 0
    }

    /// Whether auto-fill should request another page: the loaded set is
    /// smaller than the viewport and the store has more to give.
    pub fn needs_auto_fill(&self, visible_rows: usize) -> bool {
        self.has_more_data && self.loaded_count < visible_rows && !self.is_loading_more
    }

    pub fn select_down(&mut self, visible_rows: usize) {
        if self.loaded_count == 0 {
            return;
        }
        if self.selected + 1 < self.loaded_count {
            self.selected += 1;
            if self.selected >= self.viewport_start + visible_rows.max(1) {
                self.viewport_start += 1;
            }
        }
    }

    pub fn select_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.viewport_start {
                self.viewport_start = self.selected;
            }
        }
    }

    pub fn page_down(&mut self, visible_rows: usize) {
        let step = visible_rows.max(1);
        if self.loaded_count == 0 {
            return;
        }
        self.selected = (self.selected + step).min(self.loaded_count - 1);
        self.viewport_start = (self.viewport_start + step).min(self.loaded_count.saturating_sub(1));
        if self.selected < self.viewport_start {
            self.viewport_start = self.selected;
        }
    }

    pub fn page_up(&mut self, visible_rows: usize) {
        let step = visible_rows.max(1);
        self.selected = self.selected.saturating_sub(step);
        self.viewport_start = self.viewport_start.saturating_sub(step);
    }

    pub fn jump_to_top(&mut self) {
        self.selected = 0;
        self.viewport_start = 0;
    }

    pub fn jump_to_bottom(&mut self) {
        self.selected = self.loaded_count.saturating_sub(1);
        self.viewport_start = self.selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_restores_kind_filter_snapshot() {
        let mut s = ViewerState::default();
        s.kind_filter.insert(EventKind::Create);
        s.enter_kind_filter_edit();
        s.toggle_kind(EventKind::Delete);
        assert!(s.kind_filter.contains(&EventKind::Delete));
        s.escape_kind_filter_edit();
        assert!(!s.kind_filter.contains(&EventKind::Delete));
        assert!(s.kind_filter.contains(&EventKind::Create));
        assert_eq!(s.mode, Mode::StreamLive);
    }

    #[test]
    fn confirm_keeps_edits_and_resumes_mode() {
        let mut s = ViewerState::default();
        s.toggle_pause();
        assert_eq!(s.mode, Mode::StreamPaused);
        s.enter_kind_filter_edit();
        s.toggle_kind(EventKind::Modify);
        s.confirm_kind_filter_edit();
        assert!(s.kind_filter.contains(&EventKind::Modify));
        assert_eq!(s.mode, Mode::StreamPaused);
    }

    #[test]
    fn escape_keyword_edit_restores_raw_text() {
        let mut s = ViewerState::default();
        s.keyword_raw = "foo".to_string();
        s.enter_keyword_edit();
        s.push_keyword_char('!', 0);
        assert_eq!(s.keyword_raw, "foo!");
        s.escape_keyword_edit();
        assert_eq!(s.keyword_raw, "foo");
    }

    #[test]
    fn q_while_editing_keyword_types_q_not_quit() {
        // This state machine only models the data; the viewer's event loop
        // is responsible for not treating 'q' as quit while is_editing()
        // is true. Asserted here at the data layer: pushing 'q' appends it.
        let mut s = ViewerState::default();
        s.enter_keyword_edit();
        s.push_keyword_char('q', 0);
        assert_eq!(s.keyword_raw, "q");
    }

    #[test]
    fn keyword_debounce_does_not_fire_before_300ms() {
        let mut s = ViewerState::default();
        s.enter_keyword_edit();
        s.push_keyword_char('a', 1_000);
        assert!(!s.take_expired_keyword_debounce(1_200));
        assert!(s.take_expired_keyword_debounce(1_300));
    }

    #[test]
    fn each_keystroke_resets_the_debounce_timer() {
        let mut s = ViewerState::default();
        s.enter_keyword_edit();
        s.push_keyword_char('a', 1_000);
        s.push_keyword_char('b', 1_200);
        // 300ms after the first keystroke has passed, but not after the
        // second - the timer should have been reset, not fired early.
        assert!(!s.take_expired_keyword_debounce(1_350));
        assert!(s.take_expired_keyword_debounce(1_500));
    }

    #[test]
    fn confirm_keyword_edit_promotes_to_db_applied() {
        let mut s = ViewerState::default();
        s.enter_keyword_edit();
        assert!(!s.keyword_db_applied);
        s.push_keyword_char('a', 0);
        s.confirm_keyword_edit();
        assert!(s.keyword_db_applied);
        assert!(!s.keyword_edit_pending());
    }

    #[test]
    fn selection_does_not_wrap_past_loaded_set() {
        let mut s = ViewerState::default();
        s.note_loaded(3, false);
        s.select_down(10);
        s.select_down(10);
        assert_eq!(s.selected, 2);
        s.select_down(10); // no-op, already at the last loaded row
        assert_eq!(s.selected, 2);
        s.select_up();
        s.select_up();
        s.select_up();
        assert_eq!(s.selected, 0);
        s.select_up(); // no-op at the top
        assert_eq!(s.selected, 0);
    }

    #[test]
    fn jump_to_top_and_bottom() {
        let mut s = ViewerState::default();
        s.note_loaded(5, false);
        s.select_down(10);
        s.jump_to_bottom();
        assert_eq!(s.selected, 4);
        s.jump_to_top();
        assert_eq!(s.selected, 0);
        assert_eq!(s.viewport_start, 0);
    }

    #[test]
    fn reset_to_defaults_clears_filters_and_keyword() {
        let mut s = ViewerState::default();
        s.kind_filter.insert(EventKind::Delete);
        s.keyword_raw = "foo".to_string();
        s.query_mode = QueryMode::LatestPerFile;
        s.reset_to_defaults();
        assert!(s.kind_filter.is_empty());
        assert!(s.keyword_raw.is_empty());
        assert_eq!(s.query_mode, QueryMode::All);
    }

    #[test]
    fn refresh_suspended_while_paused_or_scrolled_or_filter_exhausted() {
        let mut s = ViewerState::default();
        assert!(!s.refresh_suspended());

        s.toggle_pause();
        assert!(s.refresh_suspended());
        s.toggle_pause();

        s.note_loaded(5, false);
        s.select_down(1);
        assert!(s.refresh_suspended(), "scrolled away from the top");
        s.jump_to_top();
        assert!(!s.refresh_suspended());

        s.kind_filter.insert(EventKind::Create);
        assert!(s.refresh_suspended(), "filter applied with no more data");
    }

    #[test]
    fn needs_auto_fill_when_loaded_is_smaller_than_viewport() {
        let mut s = ViewerState::default();
        s.note_loaded(2, true);
        assert!(s.needs_auto_fill(10));
        s.note_loaded(10, true);
        assert!(!s.needs_auto_fill(10));
        s.note_loaded(2, false);
        assert!(!s.needs_auto_fill(10), "no more data to fill with");
    }

    #[test]
    fn reset_kind_filter_only_applies_while_editing() {
        let mut s = ViewerState::default();
        s.kind_filter.insert(EventKind::Create);
        s.reset_kind_filter();
        assert!(s.kind_filter.contains(&EventKind::Create), "not editing yet, no-op");
        s.enter_kind_filter_edit();
        s.reset_kind_filter();
        assert!(s.kind_filter.is_empty());
    }

    #[test]
    fn entering_edit_mode_while_already_editing_is_a_no_op() {
        let mut s = ViewerState::default();
        s.enter_kind_filter_edit();
        s.enter_keyword_edit();
        assert_eq!(s.mode, Mode::EditingKindFilter);
    }
}
