//! Application service: refuse to install over an unmanaged Zeek.

use anyhow::Result;

use crate::application::ports::{BinaryLocator, LocalFs};
use crate::domain::error::InstallError;
use crate::domain::layout::InstallLayout;
use crate::domain::legacy::{UNMANAGED_CONTROL_CANDIDATES, resolve_control};

/// Abort if a host-installed `zeekctl` exists anywhere we look.
///
/// # Errors
///
/// Returns [`InstallError::UnmanagedInstall`] naming the binary found.
pub fn ensure_no_unmanaged_install(
    layout: &InstallLayout,
    fs: &impl LocalFs,
    locator: &impl BinaryLocator,
) -> Result<()> {
    match resolve_control(
        UNMANAGED_CONTROL_CANDIDATES,
        layout,
        |p| fs.exists(p),
        |name| locator.locate(name),
    ) {
        Some(found) => Err(InstallError::UnmanagedInstall(found.display().to_string()).into()),
        None => Ok(()),
    }
}
