//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::manifest::Platform;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with extra environment variables set.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Take any in-progress indicator off the screen before the operator is prompted.
    fn clear(&self);
}

// ── Operator Prompt Port ──────────────────────────────────────────────────────

/// Yes/no confirmation from the operator.
pub trait Prompt {
    /// Ask `prompt`; non-interactive implementations return `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

// ── Filesystem and Path Ports ─────────────────────────────────────────────────

/// Looks commands up on the search path.
pub trait BinaryLocator {
    /// Absolute path of the executable `name`, if found.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Abstracts local filesystem access.
///
/// Calls that may touch multi-gigabyte image archives are async so that
/// implementations can move them off the runtime and keep a run cancellable.
#[allow(async_fn_in_trait)]
pub trait LocalFs {
    /// `true` if anything (including a dangling symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Target of the symlink at `path`, or `None` if it is not a symlink.
    fn read_link(&self, path: &Path) -> Option<PathBuf>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;
    /// Create a symbolic link at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    /// Regular files under `dir`, relative to it, sorted. Hidden entries are skipped.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    /// SHA-256 hex digest of a file.
    async fn sha256_file(&self, path: &Path) -> Result<String>;
}

// ── Packaging Ports ───────────────────────────────────────────────────────────

/// Image registry inspection and architecture-filtered copy.
#[allow(async_fn_in_trait)]
pub trait ImageRegistry {
    /// Raw manifest (list) JSON for `image`.
    async fn inspect_raw(&self, image: &str) -> Result<String>;
    /// Image configuration JSON for `image` (includes `Architecture`).
    async fn inspect(&self, image: &str) -> Result<String>;
    /// Copy the `platform` variant of `image` into an uncompressed archive at `dest`.
    async fn copy_architecture(&self, image: &str, platform: &Platform, dest: &Path) -> Result<()>;
}

/// Fetches auxiliary scripts from a remote host.
#[allow(async_fn_in_trait)]
pub trait ScriptFetcher {
    /// Download `url` and return its body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Compression and sealing of staged artifacts.
#[allow(async_fn_in_trait)]
pub trait ArchiveWriter {
    /// Gzip `source` into `dest` and remove `source`.
    async fn compress_in_place(&self, source: &Path, dest: &Path) -> Result<()>;
    /// Write every non-hidden entry under `dir` into a tar at `dest`, rooted at `top`.
    async fn seal(&self, dir: &Path, top: &str, dest: &Path) -> Result<()>;
}
