//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

/// Stylesheet for terminal output. Every style is plain until `colorize`.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    /// Progress of a running launch
    pub step: Style,
    /// Field labels
    pub dim: Style,
    /// Unit name above a result block
    pub header: Style,
    /// `active` units and passed checks
    pub up: Style,
    /// `activating`, `deactivating` and `reloading` units
    pub transitional: Style,
    /// Everything else
    pub down: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.step = Style::new().cyan();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold();
        self.up = Style::new().green().bold();
        self.transitional = Style::new().yellow();
        self.down = Style::new().red();
    }

    /// Style for a unit's `ActiveState`.
    #[must_use]
    pub fn active_state(&self, state: &str) -> Style {
        match state {
            "active" => self.up,
            "activating" | "deactivating" | "reloading" => self.transitional,
            _ => self.down,
        }
    }

    /// Style for a passed/required check count.
    #[must_use]
    pub fn checks(&self, passed: u8, required: u8) -> Style {
        if passed >= required {
            self.up
        } else if passed > 0 {
            self.transitional
        } else {
            self.down
        }
    }
}
