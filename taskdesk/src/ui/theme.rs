//! Colour palettes and styles for the task screen.

use ratatui::style::{Color, Modifier, Style};
use taskdesk_proto::task::Priority;

use crate::notify::Level;

/// Colours of one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Primary foreground.
    pub fg: Color,
    /// Dimmed text (dates, completed tasks, help).
    pub fg_dim: Color,
    /// Background.
    pub bg: Color,
    /// Focused borders and selection.
    pub highlight: Color,
    /// Success notices and the progress gauge.
    pub success: Color,
    /// Medium priority and info notices.
    pub warning: Color,
    /// Error notices and high priority.
    pub error: Color,
    /// Status bar background.
    pub bar_bg: Color,
}

impl Palette {
    /// Dark theme.
    pub const DARK: Self = Self {
        fg: Color::White,
        fg_dim: Color::Gray,
        bg: Color::Black,
        highlight: Color::Cyan,
        success: Color::Green,
        warning: Color::Yellow,
        error: Color::Red,
        bar_bg: Color::Rgb(30, 30, 50),
    };

    /// Light theme.
    pub const LIGHT: Self = Self {
        fg: Color::Black,
        fg_dim: Color::DarkGray,
        bg: Color::White,
        highlight: Color::Blue,
        success: Color::Rgb(0, 128, 0),
        warning: Color::Rgb(180, 110, 0),
        error: Color::Rgb(190, 0, 0),
        bar_bg: Color::Rgb(225, 225, 235),
    };

    /// Palette for the dark-mode setting.
    #[must_use]
    pub const fn for_mode(dark: bool) -> Self {
        if dark { Self::DARK } else { Self::LIGHT }
    }

    /// Normal text style.
    #[must_use]
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Dimmed text style.
    #[must_use]
    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    /// Bold text style.
    #[must_use]
    pub fn bold(&self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::BOLD)
    }

    /// Focused panel borders.
    #[must_use]
    pub fn highlighted(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected list row.
    #[must_use]
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Completed task text.
    #[must_use]
    pub fn completed(&self) -> Style {
        self.dimmed().add_modifier(Modifier::CROSSED_OUT)
    }

    /// Task not yet confirmed by the server.
    #[must_use]
    pub fn unsynced(&self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::ITALIC)
    }

    /// Priority badge.
    #[must_use]
    pub fn priority(&self, priority: Priority) -> Style {
        let color = match priority {
            Priority::Low => self.success,
            Priority::Medium => self.warning,
            Priority::High => self.error,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Notice text by level.
    #[must_use]
    pub fn notice(&self, level: Level) -> Style {
        let color = match level {
            Level::Success => self.success,
            Level::Info => self.warning,
            Level::Error => self.error,
        };
        Style::default()
            .fg(color)
            .bg(self.bar_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Status bar background.
    #[must_use]
    pub fn status_bar(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bar_bg)
    }
}
