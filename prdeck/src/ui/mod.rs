//! Rendering entry point for prdeck.
//!
//! [`draw`] is the only function called from the `terminal.draw()` closure. It splits the frame
//! into status bar, content and help bar, and asks the [`App`] for the lines of each.
//!
//! The submodules are pure renderers: plain data and a width in, styled lines out.

pub mod diff_hunk;
pub mod help_bar;
pub mod status_bar;
pub mod text;

use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    widgets::{Block, Paragraph},
    Frame,
};

use crate::app::App;
use help_bar::render_help_bar;
use status_bar::render_status_bar;

/// Renders one complete frame. Draws nothing until the first resize has been seen.
pub fn draw(frame: &mut Frame, app: &App) {
    let (width, height) = app.size();
    if width == 0 || height == 0 {
        return;
    }
    let theme = app.theme();
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        area,
    );

    let [status, content, help] = area.layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]));

    frame.render_widget(
        Paragraph::new(render_status_bar(&app.status_bar(), status.width, theme)),
        status,
    );
    frame.render_widget(Paragraph::new(app.content()), content);
    frame.render_widget(
        Paragraph::new(render_help_bar(app.help_bindings(), help.width, theme)),
        help,
    );
}
