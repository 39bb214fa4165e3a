//! Search-path lookup: implements the `BinaryLocator` port.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::application::ports::BinaryLocator;

/// Looks executables up in a `PATH`-style list captured at construction.
pub struct PathLocator {
    search_path: OsString,
}

impl PathLocator {
    /// Locator over an explicit search path.
    pub fn new(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: search_path.into(),
        }
    }

    /// Locator over the process `PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("PATH").unwrap_or_default())
    }
}

impl BinaryLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        std::env::split_paths(&self.search_path)
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}
