//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::Palette;
use crate::app::{App, Focus, InputMode};

/// Render the status bar: the current notice, or key help.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let line = if app.confirm_delete.is_some() {
        Line::from(Span::styled(
            "Delete this task? y: confirm | any other key: cancel",
            palette.notice(crate::notify::Level::Info),
        ))
    } else if let Some((notice, _)) = &app.toast {
        Line::from(Span::styled(notice.text.as_str(), palette.notice(notice.level)))
    } else {
        let help_text = match (app.focus, &app.mode) {
            (Focus::Input, InputMode::Add) => {
                "Enter: add (!high @2026-01-31) | Tab: list | Esc: quit"
            }
            (Focus::Input, InputMode::Edit(_)) => "Enter: save | Esc: cancel",
            (Focus::Input, InputMode::Search) => "Enter: keep search | Esc: clear",
            (Focus::List, _) => {
                "↑↓/jk: move | Space: toggle | e: edit | d: delete | /: search | f: status | p: priority | a: complete all | c: clear done | r: refresh | q: quit"
            }
        };
        Line::from(vec![
            Span::styled("TaskDesk", palette.bold()),
            Span::raw(" | "),
            Span::styled(help_text, palette.dimmed()),
        ])
    };

    let paragraph = Paragraph::new(line).style(palette.status_bar());
    frame.render_widget(paragraph, area);
}
