//! Color theme system for prdeck.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every surface prdeck renders.
//! Two built-in themes are provided:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including 256-color SSH sessions.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB and needs truecolor.

use ratatui::style::{Color, Modifier, Style};

/// All color values used across prdeck's views.
///
/// Views read fields directly (`Style::default().fg(theme.fail)`). The semantic trio `pass`,
/// `fail` and `pending` drives every status icon, badge and KPI card.
#[derive(Debug, Clone)]
pub struct Theme {
    // Status semantics
    /// Passing checks, resolved threads, approvals.
    pub pass: Color,
    /// Failing checks, unresolved counts, errors.
    pub fail: Color,
    /// Running checks, warnings, pending reviews.
    pub pending: Color,

    // Text roles
    pub text: Color,
    /// Secondary text: timestamps, separators, hints.
    pub dim: Color,
    /// Cursor marker and selection accents.
    pub accent: Color,
    pub file_path: Color,
    pub line_number: Color,
    pub author: Color,
    pub thread_id: Color,

    // Diff hunks
    pub diff_added: Color,
    pub diff_removed: Color,
    pub diff_context: Color,
    pub diff_hunk_header: Color,

    // Bars
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// Foreground drawn on top of colored badges.
    pub badge_fg: Color,
    pub help_key: Color,
    /// Background of the list item under the cursor.
    pub selection_bg: Color,

    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            pass: Color::Green,
            fail: Color::Red,
            pending: Color::Yellow,

            text: Color::Reset,
            dim: Color::DarkGray,
            accent: Color::Blue,
            file_path: Color::Cyan,
            line_number: Color::Yellow,
            author: Color::Magenta,
            thread_id: Color::DarkGray,

            diff_added: Color::Green,
            diff_removed: Color::Red,
            diff_context: Color::Reset,
            diff_hunk_header: Color::Cyan,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            badge_fg: Color::Black,
            help_key: Color::Cyan,
            selection_bg: Color::Black,

            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let teal = Color::Rgb(148, 226, 213); // #94e2d5
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let crust = Color::Rgb(17, 17, 27); // #11111b
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            pass: green,
            fail: red,
            pending: yellow,

            text,
            dim: overlay1,
            accent: blue,
            file_path: teal,
            line_number: yellow,
            author: peach,
            thread_id: lavender,

            diff_added: green,
            diff_removed: red,
            diff_context: text,
            diff_hunk_header: teal,

            status_bar_bg: surface1,
            status_bar_fg: text,
            badge_fg: crust,
            help_key: lavender,
            selection_bg: surface0,

            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    /// Bold text on a colored background, used for count badges.
    pub fn badge(&self, color: Color) -> Style {
        Style::default()
            .fg(self.badge_fg)
            .bg(color)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(Theme::from_name("solarized").fail, Color::Red);
        assert_eq!(
            Theme::from_name("catppuccin_mocha").fail,
            Theme::catppuccin_mocha().fail
        );
    }
}
