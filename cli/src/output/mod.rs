//! Terminal presentation: styling, spinners and the progress reporter.

pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Column width of summary keys.
const KEY_WIDTH: usize = 13;

/// Where and how operator-facing lines are printed.
pub struct OutputContext {
    pub styles: Styles,
    /// stdout is a terminal, so spinners are allowed.
    pub is_tty: bool,
    /// Only errors are printed.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only on a terminal and never when `NO_COLOR` is set.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let mut styles = Styles::default();
        if is_tty && !no_color && std::env::var_os("NO_COLOR").is_none() {
            styles.colorize();
        }
        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    pub fn success(&self, msg: &str) {
        self.line("✓", self.styles.success, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.line("⚠", self.styles.warning, msg);
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// One aligned `key  value` row of a summary.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            let key = format!("{key:<KEY_WIDTH$}");
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }

    pub fn blank(&self) {
        if !self.quiet {
            println!();
        }
    }

    fn line(&self, marker: &str, style: owo_colors::Style, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", marker.style(style));
        }
    }
}
