//! Terminal UI rendering.

pub mod status_bar;
pub mod theme;
pub mod todo_panel;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    widgets::Block,
};
use taskdesk_proto::task::TaskRecord;

use crate::app::App;
use theme::Palette;

/// Main draw function for the task screen.
pub fn draw(frame: &mut Frame, app: &App, records: &[TaskRecord]) {
    let palette = Palette::for_mode(app.ui.dark_mode);
    frame.render_widget(Block::default().style(palette.normal()), frame.area());

    let header = if app.ui.show_stats { 3 } else { 0 };
    let search = if app.ui.show_search { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header),
            Constraint::Length(3),
            Constraint::Length(search),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    if app.ui.show_stats {
        todo_panel::render_header(frame, chunks[0], app, App::stats(records), &palette);
    }
    todo_panel::render_input(frame, chunks[1], app, &palette);
    if app.ui.show_search {
        todo_panel::render_search(frame, chunks[2], app, &palette);
    }
    todo_panel::render_list(frame, chunks[3], app, records, &palette);
    status_bar::render(frame, chunks[4], app, &palette);
}
