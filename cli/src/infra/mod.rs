//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, registry and HTTP access, archiving, and embedded assets.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod assets;
pub mod command_runner;
pub mod config;
pub mod fetch;
pub mod fs;
pub mod locator;
pub mod registry;

use anyhow::{Context, Result};

/// Run blocking filesystem or network work on tokio's blocking pool.
///
/// The awaiting task stays cancellable; the closure itself runs to completion.
pub(crate) async fn blocking<T, F>(what: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .with_context(|| format!("spawn_blocking for {what}"))?
}
