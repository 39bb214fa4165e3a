//! Typed domain error enums.
//!
//! Every variant converts to `anyhow::Error` via the `?` operator. The
//! entry points downcast to tell a cancellation apart from a failure.

use thiserror::Error;

// ── Install errors ────────────────────────────────────────────────────────────

/// Errors raised by the installation orchestrator and its steps.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("install-zeek must run as root. Re-run with: sudo install-zeek")]
    NotElevated,

    #[error("Unsupported operating system: {id} {version}\n\nSupported: {supported}")]
    UnsupportedOs {
        id: String,
        version: String,
        supported: String,
    },

    #[error(
        "SELinux is in enforcing mode.\n\nSwitch it to permissive with: setenforce 0 (and set SELINUX=permissive in /etc/selinux/config)"
    )]
    EnforcingSecurityModule,

    #[error("Not enough free space on {mount}: {available_mib} MiB available, {required_mib} MiB required")]
    InsufficientSpace {
        mount: String,
        available_mib: u64,
        required_mib: u64,
    },

    #[error(
        "An existing Zeek installation was found at {0}.\n\nInstalling over it would leave two sensors writing to the same paths.\nLink the existing installation instead of reinstalling: see the 'Linking an existing Zeek install' procedure."
    )]
    UnmanagedInstall(String),

    #[error("Failed to stop the legacy Bro sensor ({control}): {detail}")]
    LegacyStopFailed { control: String, detail: String },

    #[error("Docker installation failed: {0}")]
    RuntimeInstallFailed(String),

    #[error(
        "Docker is installed but not usable by this session.\n\nIf you were just added to the 'docker' group, log out and back in (or run with sudo), then re-run the installer."
    )]
    RuntimeUnavailable,

    #[error("Version file {0} is missing or empty. The package is incomplete.")]
    MissingVersion(String),

    #[error("Version {0:?} in the package contains characters other than letters, digits, '_', '.' and '-'.")]
    InvalidVersion(String),

    #[error("Unsupported CPU architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("No image archive for this architecture: {0}\n\nThis package does not support the host's architecture.")]
    MissingImageArchive(String),

    #[error("Failed to load image archive {path}: {detail}")]
    ImageLoadFailed { path: String, detail: String },

    #[error("Failed to stop the running Zeek service: {0}")]
    ServiceStopFailed(String),

    #[error("Failed to start the Zeek service: {0}")]
    ServiceStartFailed(String),

    #[error(
        "Zeek was started but is not running.\n\nCheck 'docker logs zeek' and that this user may use Docker."
    )]
    ServiceNotRunning,

    #[error("Installation declined.")]
    Declined,

    #[error("Installation interrupted.")]
    Cancelled,
}

impl InstallError {
    /// Whether the error is a user cancellation rather than a failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Declined | Self::Cancelled)
    }
}

// ── Stage errors ──────────────────────────────────────────────────────────────

/// Errors raised while building an offline package.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Invalid image reference '{0}': expected <name>:<tag>")]
    InvalidReference(String),

    #[error("No architectures published for {0}")]
    NoArchitectures(String),

    #[error("Malformed manifest for {image}: {detail}")]
    MalformedManifest { image: String, detail: String },

    #[error("Failed to fetch {url}: {detail}")]
    FetchFailed { url: String, detail: String },

    #[error("Failed to copy {image} ({arch}): {detail}")]
    CopyFailed {
        image: String,
        arch: String,
        detail: String,
    },

    #[error("Staging interrupted.")]
    Cancelled,
}

/// Returns `true` when the root cause of `err` is a user cancellation.
#[must_use]
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<InstallError>()
            .is_some_and(InstallError::is_cancellation)
            || matches!(cause.downcast_ref::<StageError>(), Some(StageError::Cancelled))
    })
}
