//! Priority-ordered candidate locations for legacy and unmanaged sensor installs.
//!
//! Candidates are checked as a pure function of filesystem state: callers
//! supply the existence check and the search-path lookup, and the first
//! candidate that yields a path wins.

use std::path::{Path, PathBuf};

use crate::domain::layout::InstallLayout;

/// One way of locating a control binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCandidate {
    /// A well-known absolute path.
    Fixed(&'static str),
    /// A command name looked up on the search path.
    SearchPath(&'static str),
}

/// Where a legacy Bro sensor's `broctl` may live, in priority order.
pub const LEGACY_CONTROL_CANDIDATES: &[ControlCandidate] = &[
    ControlCandidate::Fixed("/opt/bro/bin/broctl"),
    ControlCandidate::Fixed("/usr/local/bro/bin/broctl"),
    ControlCandidate::Fixed("/usr/bin/broctl"),
    ControlCandidate::SearchPath("broctl"),
];

/// Where a host-installed (unmanaged) Zeek's `zeekctl` may live.
pub const UNMANAGED_CONTROL_CANDIDATES: &[ControlCandidate] = &[
    ControlCandidate::Fixed("/opt/zeek/bin/zeekctl"),
    ControlCandidate::Fixed("/usr/local/zeek/bin/zeekctl"),
    ControlCandidate::Fixed("/usr/bin/zeekctl"),
    ControlCandidate::SearchPath("zeekctl"),
];

/// Strategies for finding the legacy sensor's log directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDirStrategy {
    /// `/opt/bro/logs`
    LegacyRoot,
    /// `/usr/local/bro/logs`
    AlternateRoot,
    /// `<control>/../../logs`, next to the detected binary's prefix.
    BinaryRelative,
}

impl LogDirStrategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [Self; 3] = [Self::LegacyRoot, Self::AlternateRoot, Self::BinaryRelative];

    /// Candidate log directory for this strategy.
    #[must_use]
    pub fn candidate(self, layout: &InstallLayout, control: &Path) -> Option<PathBuf> {
        match self {
            Self::LegacyRoot => Some(layout.resolve("/opt/bro/logs")),
            Self::AlternateRoot => Some(layout.resolve("/usr/local/bro/logs")),
            Self::BinaryRelative => Some(control.parent()?.parent()?.join("logs")),
        }
    }
}

/// Resolve the first candidate that matches.
///
/// `exists` is asked about rebased fixed paths; `lookup` resolves search-path
/// names. Candidates are tried strictly in order.
pub fn resolve_control(
    candidates: &[ControlCandidate],
    layout: &InstallLayout,
    exists: impl Fn(&Path) -> bool,
    lookup: impl Fn(&str) -> Option<PathBuf>,
) -> Option<PathBuf> {
    candidates.iter().find_map(|candidate| match *candidate {
        ControlCandidate::Fixed(path) => {
            let resolved = layout.resolve(path);
            exists(&resolved).then_some(resolved)
        }
        ControlCandidate::SearchPath(name) => lookup(name),
    })
}

/// Resolve the legacy log directory for a detected control binary.
pub fn resolve_log_dir(
    layout: &InstallLayout,
    control: &Path,
    is_dir: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    LogDirStrategy::ORDER
        .iter()
        .filter_map(|strategy| strategy.candidate(layout, control))
        .find(|candidate| is_dir(candidate))
}
