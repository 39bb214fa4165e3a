//! Fixed on-host locations of the managed Zeek installation.
//!
//! Every path is written as it appears on a production host and rebased
//! onto [`InstallLayout::root`], so the whole tree can live under a
//! temporary directory.

use std::path::{Path, PathBuf};

/// Install root of the managed sensor.
pub const INSTALL_ROOT: &str = "/opt/zeek";
/// Wrapper control script installed by the package.
pub const WRAPPER_PATH: &str = "/opt/zeek/bin/zeek";
/// Convenience link on the global search path.
pub const BIN_LINK_PATH: &str = "/usr/local/bin/zeek";
/// Log directory of the managed sensor.
pub const LOG_PATH: &str = "/opt/zeek/logs";
/// Where per-architecture image archives are kept after install.
pub const IMAGE_STORE: &str = "/opt/zeek/images";
/// Site scripts read by Zeek inside the container.
pub const SITE_DIR: &str = "/opt/zeek/share/zeek/site";
/// Machine-generated environment profile fragment.
pub const PROFILE_PATH: &str = "/etc/profile.d/zeek.sh";
/// OS identification file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Default site configuration file, installed only when absent.
pub const DEFAULT_SITE_CONFIG: &str = "local.zeek";
/// Repository name of the sensor image.
pub const IMAGE_NAME: &str = "activecm/zeek";
/// Name of the running sensor container.
pub const CONTAINER_NAME: &str = "zeek";

/// Mount points that must each have [`MIN_FREE_MIB`] available.
pub const CRITICAL_MOUNTS: &[&str] = &["/home", "/", "/opt"];
/// Minimum free space per critical mount point, in MiB.
pub const MIN_FREE_MIB: u64 = 5120;

/// Files left behind by the legacy sensor that the installer offers to remove.
pub const OBSOLETE_LEGACY_FILES: &[&str] = &["/etc/cron.d/bro", "/etc/profile.d/bro.sh"];

// ── Staged package layout ─────────────────────────────────────────────────────

/// Fixed top-level directory inside the sealed package.
pub const PACKAGE_TOP_DIR: &str = "zeek-installer";
/// Version record at the package root.
pub const VERSION_FILE: &str = "VERSION";
/// Repository name the image archives were staged from, next to [`VERSION_FILE`].
pub const IMAGE_FILE: &str = "IMAGE";
/// Per-architecture image archives.
pub const PACKAGE_IMAGES_DIR: &str = "images";
/// Helper scripts.
pub const PACKAGE_SCRIPTS_DIR: &str = "scripts";
/// Packaged site scripts.
pub const PACKAGE_SITE_DIR: &str = "zeekscripts";
/// Wrapper control script name inside [`PACKAGE_SCRIPTS_DIR`].
pub const WRAPPER_SCRIPT: &str = "zeek";
/// Docker installer name inside [`PACKAGE_SCRIPTS_DIR`].
pub const DOCKER_INSTALLER_SCRIPT: &str = "install_docker.sh";

/// Host filesystem layout rebased onto a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self::new("/")
    }
}

impl InstallLayout {
    /// Layout rooted at `root` (`/` on a real host).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The filesystem root every path is rebased onto.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebase an absolute host path onto the layout root.
    #[must_use]
    pub fn resolve(&self, host_path: &str) -> PathBuf {
        let relative = host_path.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    #[must_use]
    pub fn install_root(&self) -> PathBuf {
        self.resolve(INSTALL_ROOT)
    }

    #[must_use]
    pub fn wrapper(&self) -> PathBuf {
        self.resolve(WRAPPER_PATH)
    }

    #[must_use]
    pub fn bin_link(&self) -> PathBuf {
        self.resolve(BIN_LINK_PATH)
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(LOG_PATH)
    }

    #[must_use]
    pub fn image_store(&self) -> PathBuf {
        self.resolve(IMAGE_STORE)
    }

    #[must_use]
    pub fn site_dir(&self) -> PathBuf {
        self.resolve(SITE_DIR)
    }

    #[must_use]
    pub fn profile(&self) -> PathBuf {
        self.resolve(PROFILE_PATH)
    }

    #[must_use]
    pub fn os_release(&self) -> PathBuf {
        self.resolve(OS_RELEASE_PATH)
    }
}

/// Paths inside an extracted package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    dir: PathBuf,
}

impl PackageLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn version_file(&self) -> PathBuf {
        self.dir.join(VERSION_FILE)
    }

    #[must_use]
    pub fn image_file(&self) -> PathBuf {
        self.dir.join(IMAGE_FILE)
    }

    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.dir.join(PACKAGE_IMAGES_DIR)
    }

    #[must_use]
    pub fn scripts_dir(&self) -> PathBuf {
        self.dir.join(PACKAGE_SCRIPTS_DIR)
    }

    #[must_use]
    pub fn site_dir(&self) -> PathBuf {
        self.dir.join(PACKAGE_SITE_DIR)
    }

    #[must_use]
    pub fn wrapper_script(&self) -> PathBuf {
        self.scripts_dir().join(WRAPPER_SCRIPT)
    }

    #[must_use]
    pub fn docker_installer(&self) -> PathBuf {
        self.scripts_dir().join(DOCKER_INSTALLER_SCRIPT)
    }
}
