//! Terminal output.
//!
//! Results go to stdout. Progress of a launch (steps and warnings) goes to
//! stderr so a result can be piped while the launch is still narrating.

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::{OwoColorize as _, Style};
pub use styles::Styles;

/// Styling and verbosity shared by every printer.
pub struct OutputContext {
    pub styles: Styles,
    /// Suppress everything but errors.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only when stdout is a terminal and neither `--no-color`
    /// nor `NO_COLOR` is set.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let use_colors =
            !no_color && Term::stdout().is_term() && std::env::var_os("NO_COLOR").is_none();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }
        Self { styles, quiet }
    }

    /// `  ✓ msg` on stdout.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// `  ! msg` on stderr.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {} {msg}", "!".style(self.styles.warning));
        }
    }

    /// `  → msg` on stderr.
    pub fn step(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {} {msg}", "→".style(self.styles.step));
        }
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// A labelled field with the label dimmed.
    pub fn kv(&self, key: &str, value: &str) {
        self.kv_styled(key, value, Style::new());
    }

    /// A labelled field with its value in `style`.
    pub fn kv_styled(&self, key: &str, value: &str, style: Style) {
        if !self.quiet {
            println!("  {:<10}{}", key.style(self.styles.dim), value.style(style));
        }
    }
}
