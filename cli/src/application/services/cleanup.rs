//! Application service: remove files the legacy sensor left behind.

use anyhow::Result;

use crate::application::ports::{LocalFs, ProgressReporter, Prompt};
use crate::domain::layout::{InstallLayout, OBSOLETE_LEGACY_FILES};

/// Offer to remove each obsolete legacy file that exists.
///
/// Declining keeps the file and is not an error. Returns the number removed.
///
/// # Errors
///
/// Returns an error if the prompt fails or a confirmed removal fails.
pub fn remove_obsolete_files(
    layout: &InstallLayout,
    fs: &impl LocalFs,
    prompt: &impl Prompt,
    reporter: &impl ProgressReporter,
) -> Result<usize> {
    let mut removed = 0;
    for host_path in OBSOLETE_LEGACY_FILES {
        let path = layout.resolve(host_path);
        if !fs.exists(&path) {
            continue;
        }
        reporter.clear();
        if prompt.confirm(&format!("Remove obsolete legacy file {host_path}?"), true)? {
            fs.remove_file(&path)?;
            reporter.success(&format!("removed {host_path}"));
            removed += 1;
        } else {
            reporter.warn(&format!("kept {host_path}"));
        }
    }
    Ok(removed)
}
