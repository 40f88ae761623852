//! Printing of result grids.
//!
//! Grids arrive as markdown tables (or `_No rows_`). With color on they are
//! laid out by termimad with rounded borders; otherwise the markdown is
//! written as is, which keeps the output stable for scripts.

use termimad::{crossterm::style::Color, MadSkin, ROUNDED_TABLE_BORDER_CHARS};

/// Writes grid markdown to stdout, styled or verbatim.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    /// `rich_enabled` selects termimad table layout over verbatim markdown.
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.table_border_chars = ROUNDED_TABLE_BORDER_CHARS;
        skin.table.set_fg(Color::DarkGrey);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::DarkGrey);

        Self { rich_enabled, skin }
    }

    pub fn render(&self, markdown: &str) {
        if self.rich_enabled {
            self.skin.print_text(markdown);
        } else {
            print!("{markdown}");
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
