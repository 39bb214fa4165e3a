//! Stylesheet for installer output.

use owo_colors::Style;

/// Plain by default; [`Styles::colorize`] switches on ANSI colors.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    /// Spinner-less step arrows.
    pub step: Style,
    /// Summary keys.
    pub dim: Style,
    pub header: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.step = Style::new().cyan();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold();
    }
}
