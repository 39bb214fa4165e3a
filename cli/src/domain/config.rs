//! Staging configuration schema.
//!
//! Pure types only; loading from disk lives in `crate::infra::config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default image to package.
pub const DEFAULT_IMAGE: &str = "activecm/zeek:latest";
/// Default wrapper control script location.
pub const DEFAULT_WRAPPER_URL: &str =
    "https://raw.githubusercontent.com/activecm/docker-zeek/master/zeek";
/// Default Docker installer location.
pub const DEFAULT_DOCKER_INSTALLER_URL: &str =
    "https://raw.githubusercontent.com/activecm/bro-install/master/install_docker.sh";

/// Settings for `stage-zeek`, read from an optional YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// `<name>:<tag>` reference of the image to package.
    pub image: String,
    /// Directory that receives the staging tree and the sealed package.
    pub output: PathBuf,
    /// Where the wrapper control script is fetched from.
    pub wrapper_url: String,
    /// Where the Docker installer script is fetched from.
    pub docker_installer_url: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            output: PathBuf::from("."),
            wrapper_url: DEFAULT_WRAPPER_URL.to_string(),
            docker_installer_url: DEFAULT_DOCKER_INSTALLER_URL.to_string(),
        }
    }
}
