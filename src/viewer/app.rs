//! C10: viewer event loop.
//!
//! Input comes through an [`EventSource`] so the loop itself is testable
//! without a real terminal; the interactive binary wires up
//! [`CrosstermEventSource`], tests can supply a scripted one.
//!
//! The refresh model (§4.7): a tick-driven poll keeps `stream-live` current
//! by always hitting the store directly — the result cache is a convenience
//! for repeated identical queries during editing, never the source of truth
//! for what's on screen, since a cache hit on a stable key would otherwise
//! freeze the view. A forced refresh (initial load, mode switch, manual
//! refresh, reset, or an expired keyword debounce) checks the cache first,
//! since those are triggered by a deliberate filter change rather than the
//! passage of time.

use super::state::{Mode, ViewerState};
use super::ui::{render, table_visible_rows};
use crate::cache::{QueryKey, QueryMode, ResultCache};
use crate::model::{EventKind, EventRecord};
use crate::store::query::{count_matching, run_query, QueryParams};
use crate::store::Store;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::time::Duration;

/// Source of input events, so the event loop can be driven by either a real
/// terminal or a scripted sequence in tests.
pub trait EventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

pub struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

/// Enable raw mode/alternate screen, run the event loop, and restore the
/// terminal on the way out regardless of how the loop ended.
pub fn run_viewer(db_path: &std::path::Path, config: crate::config::ViewerConfig) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let store = Store::open_read_only(db_path)?;
    let result = run_app(&mut terminal, &store, config, &mut CrosstermEventSource);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

pub fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    store: &Store,
    config: crate::config::ViewerConfig,
    events: &mut dyn EventSource,
) -> Result<()> {
    let mut state = ViewerState::default();
    let mut cache = ResultCache::new(ResultCache::DEFAULT_CAPACITY);
    let refresh = Duration::from_millis(config.refresh_interval_ms.max(1));
    let mut rows: Vec<EventRecord> = Vec::new();
    // Forces the very first iteration to load a page regardless of
    // refresh_suspended(), which starts true-ish (nothing loaded yet).
    let mut force_refresh = true;

    loop {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let full_height = terminal.size()?.height;
        let visible_rows = table_visible_rows(full_height, state.is_editing()).max(1);

        if state.mode == Mode::EditingKeyword && state.take_expired_keyword_debounce(now_ms) {
            force_refresh = true;
        }

        if force_refresh || (!state.is_editing() && !state.refresh_suspended()) {
            refresh_page(store, &mut cache, &mut state, &mut rows, visible_rows, force_refresh)?;
            force_refresh = false;
        } else if state.needs_auto_fill(visible_rows) {
            auto_fill(store, &mut state, &mut rows, visible_rows)?;
        }

        terminal.draw(|frame| render(frame, &state, &rows, now_ms))?;

        match events.next(refresh)? {
            Some(Event::Key(key_event)) => {
                if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
                    return Ok(());
                }
                if handle_key(&mut state, &mut cache, key_event.code, now_ms, visible_rows, &mut force_refresh) {
                    return Ok(());
                }
            }
            Some(Event::Resize(_, _)) | None => {}
            _ => {}
        }
    }
}

/// Load the first `visible_rows` rows for the current mode/kind-filter/
/// keyword from scratch, replacing whatever was loaded before. `force`
/// distinguishes a deliberate filter change (consult the cache first) from
/// the steady tick-driven poll (always go straight to the store).
fn refresh_page(
    store: &Store,
    cache: &mut ResultCache,
    state: &mut ViewerState,
    rows: &mut Vec<EventRecord>,
    visible_rows: usize,
    force: bool,
) -> Result<()> {
    let keyword = state.normalized_keyword();
    let key = QueryKey::new(state.query_mode, &state.kind_filter, &keyword);

    let page = if force { cache.get(&key).cloned() } else { None };
    let page = match page {
        Some(page) => page,
        None => {
            let params = QueryParams {
                mode: state.query_mode,
                kinds: &state.kind_filter,
                keyword: &keyword,
                limit: Some(visible_rows),
                offset: 0,
            };
            let fetched = run_query(store.connection(), &params)?;
            cache.put(key, fetched.clone());
            fetched
        }
    };

    let count_params = QueryParams {
        mode: state.query_mode,
        kinds: &state.kind_filter,
        keyword: &keyword,
        limit: None,
        offset: 0,
    };
    let total = count_matching(store.connection(), &count_params)?;

    *rows = page;
    state.note_loaded(rows.len(), rows.len() < total);
    Ok(())
}

/// Append the next page after what's already loaded, for when the loaded
/// set is smaller than the viewport and the store has more to give.
fn auto_fill(store: &Store, state: &mut ViewerState, rows: &mut Vec<EventRecord>, visible_rows: usize) -> Result<()> {
    state.is_loading_more = true;
    let keyword = state.normalized_keyword();
    let params = QueryParams {
        mode: state.query_mode,
        kinds: &state.kind_filter,
        keyword: &keyword,
        limit: Some(visible_rows.saturating_sub(rows.len())),
        offset: rows.len(),
    };
    let more = run_query(store.connection(), &params)?;

    let count_params = QueryParams {
        mode: state.query_mode,
        kinds: &state.kind_filter,
        keyword: &keyword,
        limit: None,
        offset: 0,
    };
    let total = count_matching(store.connection(), &count_params)?;

    rows.extend(more);
    state.note_loaded(rows.len(), rows.len() < total);
    Ok(())
}

/// Returns true if the viewer should quit. Sets `force_refresh` when the key
/// demands an immediate page reload bypassing `refresh_suspended()`.
fn handle_key(
    state: &mut ViewerState,
    cache: &mut ResultCache,
    code: KeyCode,
    now_ms: i64,
    visible_rows: usize,
    force_refresh: &mut bool,
) -> bool {
    match state.mode {
        Mode::EditingKindFilter => match code {
            KeyCode::Enter => {
                let previous = state.kind_filter.clone();
                state.confirm_kind_filter_edit();
                cache.invalidate_kind_filter_changed(&previous);
                state.jump_to_top();
                *force_refresh = true;
            }
            KeyCode::Esc => state.escape_kind_filter_edit(),
            KeyCode::Char('r') => {
                state.reset_kind_filter();
                cache.invalidate_kind_filter_reset();
            }
            KeyCode::Char(c) => {
                if let Some(kind) = EventKind::ALL.iter().find(|k| k.toggle_key() == c) {
                    state.toggle_kind(*kind);
                }
            }
            _ => {}
        },
        Mode::EditingKeyword => match code {
            KeyCode::Enter => {
                state.confirm_keyword_edit();
                state.jump_to_top();
                *force_refresh = true;
            }
            KeyCode::Esc => {
                state.escape_keyword_edit();
                if state.keyword_raw.is_empty() {
                    cache.invalidate_keyword_cleared();
                }
                *force_refresh = true;
            }
            KeyCode::Backspace => state.pop_keyword_char(now_ms),
            KeyCode::Char(c) => state.push_keyword_char(c, now_ms),
            _ => {}
        },
        Mode::StreamLive | Mode::StreamPaused => match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(' ') => state.toggle_pause(),
            KeyCode::Char('/') => state.enter_keyword_edit(),
            KeyCode::Char('f') => state.enter_kind_filter_edit(),
            KeyCode::Char('a') => {
                state.set_query_mode(QueryMode::All);
                cache.invalidate_mode(QueryMode::All);
                state.jump_to_top();
                *force_refresh = true;
            }
            KeyCode::Char('u') => {
                state.set_query_mode(QueryMode::LatestPerFile);
                cache.invalidate_mode(QueryMode::LatestPerFile);
                state.jump_to_top();
                *force_refresh = true;
            }
            KeyCode::Char('x') => *force_refresh = true,
            KeyCode::Char('j') | KeyCode::Down => state.select_down(visible_rows),
            KeyCode::Char('k') | KeyCode::Up => state.select_up(),
            KeyCode::PageDown => state.page_down(visible_rows),
            KeyCode::PageUp => state.page_up(visible_rows),
            KeyCode::Char('g') | KeyCode::Home => state.jump_to_top(),
            KeyCode::Char('G') | KeyCode::End => state.jump_to_bottom(),
            KeyCode::Esc => {
                state.reset_to_defaults();
                cache.clear();
                *force_refresh = true;
            }
            _ => {}
        },
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode as Code, KeyEvent, KeyEventKind, KeyEventState};
    use ratatui::backend::TestBackend;

    struct ScriptedSource {
        events: Vec<Event>,
        cursor: usize,
    }

    impl ScriptedSource {
        fn new(codes: Vec<Code>) -> Self {
            Self::with_events(codes.into_iter().map(|code| (code, KeyModifiers::NONE)).collect())
        }

        fn with_events(pairs: Vec<(Code, KeyModifiers)>) -> Self {
            let events = pairs
                .into_iter()
                .map(|(code, modifiers)| {
                    Event::Key(KeyEvent {
                        code,
                        modifiers,
                        kind: KeyEventKind::Press,
                        state: KeyEventState::NONE,
                    })
                })
                .collect();
            Self { events, cursor: 0 }
        }
    }

    impl EventSource for ScriptedSource {
        fn next(&mut self, _timeout: Duration) -> Result<Option<Event>> {
            if self.cursor >= self.events.len() {
                return Ok(None);
            }
            let event = self.events[self.cursor].clone();
            self.cursor += 1;
            Ok(Some(event))
        }
    }

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.db");
        let _ = Store::open(&path).unwrap();
        let store = Store::open_read_only(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn q_quits_from_stream_live() {
        let (_dir, store) = test_store();
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut source = ScriptedSource::new(vec![Code::Char('q')]);
        let result = run_app(&mut terminal, &store, crate::config::ViewerConfig::default(), &mut source);
        assert!(result.is_ok());
    }

    #[test]
    fn q_does_not_quit_while_editing_keyword() {
        let mut state = ViewerState::default();
        let mut cache = ResultCache::new(3);
        let mut force_refresh = false;
        state.enter_keyword_edit();
        let quit = handle_key(&mut state, &mut cache, KeyCode::Char('q'), 0, 10, &mut force_refresh);
        assert!(!quit);
        assert_eq!(state.keyword_raw, "q");
    }

    #[test]
    fn ctrl_c_quits_even_while_editing() {
        let (_dir, store) = test_store();
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut source = ScriptedSource::with_events(vec![
            (Code::Char('/'), KeyModifiers::NONE),
            (Code::Char('a'), KeyModifiers::NONE),
            (Code::Char('c'), KeyModifiers::CONTROL),
        ]);
        let result = run_app(&mut terminal, &store, crate::config::ViewerConfig::default(), &mut source);
        assert!(result.is_ok());
    }

    #[test]
    fn esc_from_stream_live_resets_defaults_and_forces_refresh() {
        let mut state = ViewerState::default();
        let mut cache = ResultCache::new(3);
        let mut force_refresh = false;
        state.kind_filter.insert(EventKind::Delete);
        state.keyword_raw = "foo".to_string();
        let quit = handle_key(&mut state, &mut cache, KeyCode::Esc, 0, 10, &mut force_refresh);
        assert!(!quit);
        assert!(state.kind_filter.is_empty());
        assert!(state.keyword_raw.is_empty());
        assert!(force_refresh);
    }

    #[test]
    fn a_and_u_switch_query_mode_and_force_refresh() {
        let mut state = ViewerState::default();
        let mut cache = ResultCache::new(3);
        let mut force_refresh = false;
        handle_key(&mut state, &mut cache, KeyCode::Char('u'), 0, 10, &mut force_refresh);
        assert_eq!(state.query_mode, QueryMode::LatestPerFile);
        assert!(force_refresh);
        force_refresh = false;
        handle_key(&mut state, &mut cache, KeyCode::Char('a'), 0, 10, &mut force_refresh);
        assert_eq!(state.query_mode, QueryMode::All);
        assert!(force_refresh);
    }

    #[test]
    fn j_and_k_move_selection() {
        let mut state = ViewerState::default();
        let mut cache = ResultCache::new(3);
        let mut force_refresh = false;
        state.note_loaded(3, false);
        handle_key(&mut state, &mut cache, KeyCode::Char('j'), 0, 10, &mut force_refresh);
        assert_eq!(state.selected, 1);
        handle_key(&mut state, &mut cache, KeyCode::Char('k'), 0, 10, &mut force_refresh);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn x_forces_refresh_without_touching_filters() {
        let mut state = ViewerState::default();
        let mut cache = ResultCache::new(3);
        let mut force_refresh = false;
        state.kind_filter.insert(EventKind::Create);
        handle_key(&mut state, &mut cache, KeyCode::Char('x'), 0, 10, &mut force_refresh);
        assert!(force_refresh);
        assert!(state.kind_filter.contains(&EventKind::Create));
    }
}
