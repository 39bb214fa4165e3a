//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod arch;
pub mod archive;
pub mod config;
pub mod error;
pub mod layout;
pub mod legacy;
pub mod manifest;
pub mod preconditions;
pub mod settings;
pub mod stage;

pub use arch::map_architecture;
pub use archive::{ImageReference, image_archive_name, sanitize};
pub use config::StageConfig;
pub use error::{InstallError, StageError};
pub use layout::InstallLayout;
pub use settings::{InstallSettings, InstallState, LegacyAgent, ProfileEnv};
pub use stage::InstallStage;
