//! Pure parsers and rules behind the host precondition checks.

use std::path::{Path, PathBuf};

/// Supported distributions: `(os-release ID, accepted VERSION_ID values)`.
///
/// RHEL-family entries list major versions only; minor releases match by
/// their major component.
pub const SUPPORTED_OS: &[(&str, &[&str])] = &[
    ("ubuntu", &["18.04", "20.04", "22.04", "24.04"]),
    ("debian", &["10", "11", "12"]),
    ("centos", &["7", "8"]),
    ("rhel", &["7", "8", "9"]),
    ("rocky", &["8", "9"]),
    ("almalinux", &["8", "9"]),
];

/// Distribution IDs whose versions are compared by major number.
const MAJOR_VERSION_FAMILIES: &[&str] = &["centos", "rhel", "rocky", "almalinux", "debian"];

/// The fields of `/etc/os-release` that decide support.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OsRelease {
    pub id: String,
    pub version_id: String,
}

impl OsRelease {
    /// Parse `/etc/os-release` content. Unknown keys are ignored and quotes stripped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut release = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            match key.trim() {
                "ID" => release.id = value.to_ascii_lowercase(),
                "VERSION_ID" => release.version_id = value,
                _ => {}
            }
        }
        release
    }

    /// Whether this release is on the supported list.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        let Some((_, versions)) = SUPPORTED_OS.iter().find(|(id, _)| *id == self.id) else {
            return false;
        };
        let version = if MAJOR_VERSION_FAMILIES.contains(&self.id.as_str()) {
            self.version_id.split('.').next().unwrap_or_default()
        } else {
            self.version_id.as_str()
        };
        versions.contains(&version)
    }
}

/// Human-readable list of supported releases for error messages.
#[must_use]
pub fn supported_os_summary() -> String {
    SUPPORTED_OS
        .iter()
        .map(|(id, versions)| format!("{id} {}", versions.join("/")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELinux mode as reported by `getenforce`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelinuxMode {
    Enforcing,
    Permissive,
    Disabled,
}

impl SelinuxMode {
    /// Parse `getenforce` output. Unrecognised output is treated as disabled.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        match output.trim().to_ascii_lowercase().as_str() {
            "enforcing" => Self::Enforcing,
            "permissive" => Self::Permissive,
            _ => Self::Disabled,
        }
    }
}

/// Parse available MiB from `df -Pm <path>` output.
///
/// POSIX format guarantees one header line and one data line whose fourth
/// column is the available space.
#[must_use]
pub fn parse_df_available_mib(output: &str) -> Option<u64> {
    output
        .lines()
        .nth(1)
        .and_then(|line| line.split_whitespace().nth(3))
        .and_then(|s| s.parse::<u64>().ok())
}

/// Walk up from `path` to the nearest ancestor that exists.
///
/// `df` needs an existing path; a mount point that does not exist yet
/// lives on whichever filesystem holds its nearest existing parent.
pub fn nearest_existing(path: &Path, exists: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    path.ancestors().find(|p| exists(p)).map(Path::to_path_buf)
}
