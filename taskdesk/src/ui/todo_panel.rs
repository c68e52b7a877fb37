//! Task list, input line and summary header.

use ratatui::{
    Frame,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
};
use taskdesk_proto::task::TaskRecord;

use super::theme::Palette;
use crate::app::{App, Focus, InputMode};
use crate::tasks::{StatusFilter, TaskStats};

/// Render the stats gauge and filter tabs.
pub fn render_header(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    stats: TaskStats,
    palette: &Palette,
) {
    let label = format!(
        "{} total | {} active | {} done | {}%",
        stats.total, stats.active, stats.completed, stats.progress
    );
    let gauge = Gauge::default()
        .block(Block::default().title(filter_title(app)).borders(Borders::ALL))
        .gauge_style(palette.normal().fg(palette.success))
        .percent(u16::from(stats.progress))
        .label(label);
    frame.render_widget(gauge, area);
}

fn filter_title(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    for tab in [StatusFilter::All, StatusFilter::Active, StatusFilter::Completed] {
        let text = if tab == app.filter.status {
            format!("[{}]", tab.label())
        } else {
            format!(" {} ", tab.label())
        };
        spans.push(Span::raw(text));
    }
    if let Some(priority) = app.filter.priority {
        spans.push(Span::raw(format!(" !{priority}")));
    }
    Line::from(spans)
}

/// Render the input line, with the cursor when focused.
pub fn render_input(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let is_focused = app.focus == Focus::Input;
    let title = match app.mode {
        InputMode::Add => "New task",
        InputMode::Edit(_) => "Edit task",
        InputMode::Search => "Search",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if is_focused {
            palette.highlighted()
        } else {
            palette.normal()
        });

    let paragraph = Paragraph::new(app.input.as_str())
        .style(palette.normal())
        .block(block);
    frame.render_widget(paragraph, area);

    if is_focused {
        let offset = u16::try_from(app.cursor_position).unwrap_or(u16::MAX);
        frame.set_cursor_position(Position::new(
            area.x.saturating_add(1).saturating_add(offset),
            area.y + 1,
        ));
    }
}

/// Render the search line below the input.
pub fn render_search(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let text = if app.filter.search.is_empty() {
        "/ to search".to_string()
    } else {
        format!("search: {}", app.filter.search)
    };
    frame.render_widget(Paragraph::new(text).style(palette.dimmed()), area);
}

/// One list row.
#[must_use]
pub fn row<'a>(record: &'a TaskRecord, date_format: &str, palette: &Palette) -> Line<'a> {
    let done = record.status.is_completed();
    let checkbox = if done { "[✓]" } else { "[ ]" };
    let text_style = if done {
        palette.completed()
    } else if record.id.is_temporary() {
        palette.unsynced()
    } else {
        palette.normal()
    };

    let mut spans = vec![
        Span::styled(checkbox, palette.normal()),
        Span::raw(" "),
        Span::styled(record.text.as_str(), text_style),
    ];
    if let Some(priority) = record.priority {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(priority.to_string(), palette.priority(priority)));
    }
    if let Some(due) = record.due_date {
        spans.push(Span::styled(
            format!("  due {}", due.format(date_format)),
            palette.dimmed(),
        ));
    }
    if record.id.is_temporary() {
        spans.push(Span::styled("  saving…", palette.dimmed()));
    }
    Line::from(spans)
}

/// Render the filtered task list.
pub fn render_list(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    records: &[TaskRecord],
    palette: &Palette,
) {
    let is_focused = app.focus == Focus::List;
    let visible = app.visible(records);

    let block = Block::default()
        .title("Tasks")
        .borders(Borders::ALL)
        .border_style(if is_focused {
            palette.highlighted()
        } else {
            palette.normal()
        });

    if visible.is_empty() {
        let empty = if records.is_empty() {
            "No tasks yet. Type one above and press Enter."
        } else {
            "No tasks match the filter."
        };
        frame.render_widget(Paragraph::new(empty).style(palette.dimmed()).block(block), area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|r| ListItem::new(row(r, &app.ui.date_format, palette)))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(if is_focused {
            palette.selected()
        } else {
            palette.bold()
        });

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}
