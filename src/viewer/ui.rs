//! C10: terminal rendering.
//!
//! Four fixed regions, top to bottom: a one-line header (mode + query mode
//! + row count), the event table, an editor line (visible only while
//! editing a filter), and a command bar listing the active keybindings.

use super::format::{format_elapsed, format_size, truncate_and_pad};
use super::state::{Mode, ViewerState};
use crate::cache::QueryMode;
use crate::model::{EventKind, EventRecord};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

const COLUMN_WIDTHS: [u16; 5] = [8, 10, 40, 30, 10];

/// Height of the table region once the header, command bar, and (while
/// editing) the editor line are carved out of the full terminal height.
fn table_area_height(total_height: u16, editing: bool) -> u16 {
    let chrome = if editing { 3 } else { 2 };
    total_height.saturating_sub(chrome)
}

/// Data rows that actually fit in a table area of this height, once its
/// own border and column header are accounted for.
fn table_body_rows(table_area_height: u16) -> usize {
    table_area_height.saturating_sub(2).max(1) as usize
}

/// How many data rows are visible for a given full terminal height. Shared
/// with [`super::app`] so its auto-fill/paging decisions agree with what
/// actually fits on screen.
pub fn table_visible_rows(total_height: u16, editing: bool) -> usize {
    table_body_rows(table_area_height(total_height, editing))
}

pub fn render(frame: &mut Frame, state: &ViewerState, rows: &[EventRecord], now_ms: i64) {
    let area = frame.size();
    let constraints = if state.is_editing() {
        vec![
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ]
    } else {
        vec![
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ]
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_header(frame, chunks[0], state, rows.len());
    render_table(frame, chunks[1], state, rows, now_ms);

    if state.is_editing() {
        render_editor_line(frame, chunks[2], state);
        render_command_bar(frame, chunks[3], state);
    } else {
        render_command_bar(frame, chunks[2], state);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &ViewerState, row_count: usize) {
    let mode_label = match state.mode {
        Mode::StreamLive => "LIVE",
        Mode::StreamPaused => "PAUSED",
        Mode::EditingKindFilter => "EDIT:KIND",
        Mode::EditingKeyword => "EDIT:KEYWORD",
    };
    let query_label = match state.query_mode {
        QueryMode::All => "all",
        QueryMode::LatestPerFile => "latest-per-file",
    };
    let more = if state.has_more_data { "+" } else { "" };
    let loading = if state.is_loading_more { "  loading…" } else { "" };
    let line = Line::from(vec![
        Span::styled(format!(" {mode_label} "), Style::default().fg(Color::Black).bg(status_color(state.mode))),
        Span::raw(format!("  mode={query_label}  rows={row_count}{more}{loading}")),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn status_color(mode: Mode) -> Color {
    match mode {
        Mode::StreamLive => Color::Green,
        Mode::StreamPaused => Color::Yellow,
        Mode::EditingKindFilter | Mode::EditingKeyword => Color::Cyan,
    }
}

fn render_table(frame: &mut Frame, area: Rect, state: &ViewerState, rows: &[EventRecord], now_ms: i64) {
    let widths: Vec<Constraint> = COLUMN_WIDTHS.iter().map(|w| Constraint::Length(*w)).collect();

    let header = Row::new(vec!["KIND", "ELAPSED", "PATH", "DIR", "SIZE"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let visible = table_body_rows(area.height);
    let start = state.viewport_start.min(rows.len());
    let end = (start + visible).min(rows.len());

    let body: Vec<Row> = rows[start..end]
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let elapsed = format_elapsed(now_ms - event.timestamp);
            let size = event
                .measurement
                .map(|m| format_size(m.size_bytes))
                .unwrap_or_else(|| "-".to_string());
            let mut style = kind_style(event.kind);
            if start + i == state.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(vec![
                truncate_and_pad(event.kind.as_str(), COLUMN_WIDTHS[0] as usize),
                truncate_and_pad(&elapsed, COLUMN_WIDTHS[1] as usize),
                truncate_and_pad(&event.file_name, COLUMN_WIDTHS[2] as usize),
                truncate_and_pad(&event.directory, COLUMN_WIDTHS[3] as usize),
                truncate_and_pad(&size, COLUMN_WIDTHS[4] as usize),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(table, area);
}

fn kind_style(kind: EventKind) -> Style {
    let color = match kind {
        EventKind::Find => Color::Gray,
        EventKind::Create => Color::Green,
        EventKind::Modify => Color::Yellow,
        EventKind::Delete => Color::Red,
        EventKind::Move => Color::Magenta,
        EventKind::Restore => Color::Cyan,
    };
    Style::default().fg(color)
}

fn render_editor_line(frame: &mut Frame, area: Rect, state: &ViewerState) {
    let line = match state.mode {
        Mode::EditingKindFilter => {
            let toggles: Vec<String> = EventKind::ALL
                .iter()
                .map(|k| {
                    let marker = if state.kind_filter.is_empty() || state.kind_filter.contains(k) {
                        '*'
                    } else {
                        ' '
                    };
                    format!("[{marker}{}]{}", k.toggle_key(), k.as_str())
                })
                .collect();
            format!("kinds: {}", toggles.join(" "))
        }
        Mode::EditingKeyword => format!("keyword: {}_", state.keyword_raw),
        _ => String::new(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_command_bar(frame: &mut Frame, area: Rect, state: &ViewerState) {
    let help = if state.is_editing() {
        "Enter: confirm  Esc: cancel  r: reset  Space: toggle"
    } else {
        "Space: pause  x: refresh  /: keyword  f: kind filter  a/u: mode  g/G: top/bottom  q: quit"
    };
    frame.render_widget(Paragraph::new(help), area);
}
