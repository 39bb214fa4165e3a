//! Image registry access through `skopeo`: implements the `ImageRegistry` port.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ImageRegistry};
use crate::domain::error::StageError;
use crate::domain::manifest::Platform;

/// Upper bound for copying one architecture of an image.
pub const COPY_TIMEOUT: Duration = Duration::from_secs(1800);

/// `skopeo`-backed registry client.
pub struct SkopeoRegistry<R> {
    runner: R,
}

impl<R: CommandRunner> SkopeoRegistry<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn inspect_with(&self, image: &str, extra: &[&str]) -> Result<String> {
        let transport = format!("docker://{image}");
        let mut args = vec!["inspect"];
        args.extend_from_slice(extra);
        args.push(&transport);
        let output = self.runner.run("skopeo", &args).await?;
        if !output.status.success() {
            return Err(StageError::FetchFailed {
                url: transport,
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl<R: CommandRunner> ImageRegistry for SkopeoRegistry<R> {
    async fn inspect_raw(&self, image: &str) -> Result<String> {
        self.inspect_with(image, &["--raw"]).await
    }

    async fn inspect(&self, image: &str) -> Result<String> {
        self.inspect_with(image, &[]).await
    }

    async fn copy_architecture(&self, image: &str, platform: &Platform, dest: &Path) -> Result<()> {
        let source = format!("docker://{image}");
        let target = format!("docker-archive:{}:{image}", dest.display());
        let args = copy_args(platform, &source, &target);
        let output = self
            .runner
            .run_with_timeout("skopeo", &args, COPY_TIMEOUT)
            .await?;
        if !output.status.success() {
            return Err(StageError::CopyFailed {
                image: image.to_string(),
                arch: platform.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn copy_args<'a>(platform: &'a Platform, source: &'a str, target: &'a str) -> Vec<&'a str> {
    let mut args = vec!["copy", "--override-arch", platform.architecture.as_str()];
    if let Some(variant) = &platform.variant {
        args.extend(["--override-variant", variant.as_str()]);
    }
    args.extend([source, target]);
    args
}
