//! Host hardware identifier → image architecture tag.

/// Hardware identifiers (as printed by `uname -m`) and the image
/// architecture each one runs.
pub const ARCHITECTURE_MAP: &[(&str, &str)] = &[
    ("x86_64", "amd64"),
    ("amd64", "amd64"),
    ("aarch64", "arm64"),
    ("arm64", "arm64"),
    ("armv8l", "arm64"),
    ("armv7l", "arm"),
    ("armv7", "arm"),
    ("armhf", "arm"),
    ("ppc64le", "ppc64le"),
    ("s390x", "s390x"),
];

/// Map a machine hardware identifier to the image architecture tag.
///
/// Surrounding whitespace is ignored so raw `uname -m` output can be
/// passed directly. Returns `None` for identifiers with no image.
#[must_use]
pub fn map_architecture(machine: &str) -> Option<&'static str> {
    let machine = machine.trim();
    ARCHITECTURE_MAP
        .iter()
        .find(|(hw, _)| *hw == machine)
        .map(|(_, tag)| *tag)
}
