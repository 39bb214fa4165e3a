//! Installation settings and the per-run state derived from them.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::layout::{InstallLayout, PackageLayout};

/// Default wait between starting the sensor and checking that it runs.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(10);

/// Immutable installer settings, built once by the entry point from CLI
/// flags and host probing and passed to every step.
#[derive(Debug, Clone)]
pub struct InstallSettings {
    /// Start live monitoring after install.
    pub sensor: bool,
    /// Prompts return their default without asking.
    pub non_interactive: bool,
    /// Running with effective uid 0.
    pub elevated: bool,
    /// Host filesystem layout.
    pub layout: InstallLayout,
    /// Extracted package being installed.
    pub package: PackageLayout,
    /// Wait after starting the sensor before checking it.
    pub settle: Duration,
}

impl InstallSettings {
    /// Settings for a real host with defaults for everything but the flags.
    #[must_use]
    pub fn new(sensor: bool, non_interactive: bool, elevated: bool, package: PathBuf) -> Self {
        Self {
            sensor,
            non_interactive,
            elevated,
            layout: InstallLayout::default(),
            package: PackageLayout::new(package),
            settle: DEFAULT_SETTLE,
        }
    }

    /// Rebase every host path onto `root`.
    #[must_use]
    pub fn with_layout(mut self, layout: InstallLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

/// A detected legacy Bro sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyAgent {
    /// Path of the detected `broctl`.
    pub control: PathBuf,
    /// Its log directory, if one was found.
    pub log_dir: Option<PathBuf>,
}

/// Everything a run knows about the host, fixed when the run starts.
#[derive(Debug, Clone)]
pub struct InstallState {
    pub settings: InstallSettings,
    pub legacy: Option<LegacyAgent>,
}

/// Environment exported by the profile fragment and passed to the wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEnv {
    pub top_dir: String,
    pub release: String,
}

impl ProfileEnv {
    /// Variables as `(name, value)` pairs.
    #[must_use]
    pub fn vars(&self) -> [(&'static str, &str); 2] {
        [("ZEEK_TOP_DIR", &self.top_dir), ("ZEEK_RELEASE", &self.release)]
    }

    /// Shell fragment written to the profile path.
    #[must_use]
    pub fn render(&self, generated_at: &str) -> String {
        let mut out = String::from(
            "# Generated by install-zeek. Do not edit: this file is overwritten on every install or upgrade.\n",
        );
        out.push_str(&format!("# Last written {generated_at}\n"));
        for (name, value) in self.vars() {
            out.push_str(&format!("export {name}=\"{value}\"\n"));
        }
        out
    }
}

/// Whether `version` is safe to write into the profile and to use in file names.
///
/// Only ASCII letters, digits, `_`, `.` and `-` are accepted.
#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Whether a failed `stop` only reported that nothing was running.
#[must_use]
pub fn is_not_running(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    lower.contains("not running") || lower.contains("no such container")
}
