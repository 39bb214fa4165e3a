//! Application service: build the offline package.
//!
//! Resolves every published architecture of the image, stores one gzip
//! archive per architecture, records the version and image name, adds
//! helper and site scripts, then seals the staging tree into a single tar.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{
    ArchiveWriter, ImageRegistry, LocalFs, ProgressReporter, ScriptFetcher,
};
use crate::domain::archive::{ARCHIVE_SUFFIX, ImageReference, image_archive_name, package_archive_name};
use crate::domain::config::StageConfig;
use crate::domain::error::StageError;
use crate::domain::layout::{PACKAGE_TOP_DIR, PackageLayout};
use crate::domain::manifest::{ManifestArchitectures, Platform, parse_inspect_platform, parse_manifest};
use crate::domain::settings::is_valid_version;

/// The ports a staging run needs.
pub struct StageDeps<'a, Reg, Fe, A, F, G> {
    pub registry: &'a Reg,
    pub fetcher: &'a Fe,
    pub archiver: &'a A,
    pub fs: &'a F,
    pub reporter: &'a G,
}

/// A site script to package, relative to the site scripts directory.
#[derive(Debug, Clone, Copy)]
pub struct SiteScript<'a> {
    pub path: &'a Path,
    pub contents: &'a [u8],
}

/// Outcome of a staging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Version recorded in the package.
    pub version: String,
    /// Every platform packaged, in manifest order, e.g. `amd64` or `arm/v7`.
    pub architectures: Vec<String>,
    /// Platforms whose existing archive was reused.
    pub reused: Vec<String>,
    /// The sealed package.
    pub archive: PathBuf,
}

/// Stage `config.image` into `config.output` and seal it.
///
/// With `no_pull`, an architecture whose archive already exists is not
/// downloaded again and its file is left untouched.
///
/// # Errors
///
/// Returns an error if the reference is invalid, the registry cannot be
/// queried, any download fails, or the package cannot be written.
pub async fn stage<Reg, Fe, A, F, G>(
    config: &StageConfig,
    no_pull: bool,
    site_scripts: &[SiteScript<'_>],
    deps: &StageDeps<'_, Reg, Fe, A, F, G>,
) -> Result<StageReport>
where
    Reg: ImageRegistry,
    Fe: ScriptFetcher,
    A: ArchiveWriter,
    F: LocalFs,
    G: ProgressReporter,
{
    let image = ImageReference::parse(&config.image)?;
    if !is_valid_version(&image.tag) {
        return Err(StageError::InvalidReference(config.image.clone()).into());
    }
    let package = PackageLayout::new(config.output.join(PACKAGE_TOP_DIR));
    for dir in [package.images_dir(), package.scripts_dir(), package.site_dir()] {
        deps.fs.create_dir_all(&dir)?;
    }

    deps.reporter.step(&format!("resolving architectures of {image}..."));
    let platforms = enumerate_platforms(&image, deps.registry).await?;
    let architectures: Vec<String> = platforms.iter().map(ToString::to_string).collect();
    deps.reporter
        .success(&format!("{image}: {}", architectures.join(", ")));

    let mut reused = Vec::new();
    let mut expected = Vec::new();
    for platform in &platforms {
        let name = image_archive_name(&image.name, &image.tag, &platform.architecture);
        let dest = package.images_dir().join(&name);
        expected.push(PathBuf::from(&name));
        if no_pull && deps.fs.exists(&dest) {
            tracing::info!(%platform, path = %dest.display(), "reusing staged archive");
            deps.reporter.step(&format!("reusing {name}"));
            reused.push(platform.to_string());
            continue;
        }
        pull_platform(&image, platform, &name, &package, deps).await?;
    }
    prune_stale_archives(&package, &expected, deps.fs)?;

    deps.fs
        .write(&package.version_file(), format!("{}\n", image.tag).as_bytes())?;
    deps.fs
        .write(&package.image_file(), format!("{}\n", image.name).as_bytes())?;

    for (url, dest) in [
        (&config.wrapper_url, package.wrapper_script()),
        (&config.docker_installer_url, package.docker_installer()),
    ] {
        deps.reporter.step(&format!("fetching {url}..."));
        let body = deps.fetcher.fetch(url).await?;
        deps.fs.write(&dest, &body)?;
        deps.fs.set_permissions(&dest, 0o755)?;
    }

    for script in site_scripts {
        let dest = package.site_dir().join(script.path);
        if let Some(parent) = dest.parent() {
            deps.fs.create_dir_all(parent)?;
        }
        deps.fs.write(&dest, script.contents)?;
    }

    let archive = config
        .output
        .join(package_archive_name(PACKAGE_TOP_DIR, &image.tag));
    deps.reporter.step(&format!("sealing {}...", archive.display()));
    deps.archiver
        .seal(package.dir(), PACKAGE_TOP_DIR, &archive)
        .await
        .with_context(|| format!("sealing {}", archive.display()))?;
    deps.reporter.success(&format!("package written to {}", archive.display()));

    Ok(StageReport {
        version: image.tag,
        architectures,
        reused,
        archive,
    })
}

async fn enumerate_platforms(
    image: &ImageReference,
    registry: &impl ImageRegistry,
) -> Result<Vec<Platform>> {
    let reference = image.to_string();
    let malformed = |e: serde_json::Error| StageError::MalformedManifest {
        image: reference.clone(),
        detail: e.to_string(),
    };
    let raw = registry.inspect_raw(&reference).await?;
    let platforms = match parse_manifest(&raw).map_err(malformed)? {
        ManifestArchitectures::List(platforms) => platforms,
        ManifestArchitectures::Single => {
            let inspected = registry.inspect(&reference).await?;
            vec![parse_inspect_platform(&inspected).map_err(malformed)?]
        }
    };
    if platforms.is_empty() {
        return Err(StageError::NoArchitectures(reference).into());
    }
    Ok(platforms)
}

async fn pull_platform<Reg, Fe, A, F, G>(
    image: &ImageReference,
    platform: &Platform,
    name: &str,
    package: &PackageLayout,
    deps: &StageDeps<'_, Reg, Fe, A, F, G>,
) -> Result<()>
where
    Reg: ImageRegistry,
    A: ArchiveWriter,
    F: LocalFs,
    G: ProgressReporter,
{
    let stem = name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(name);
    let uncompressed = package.images_dir().join(format!("{stem}.tar"));
    let dest = package.images_dir().join(name);
    if deps.fs.exists(&uncompressed) {
        deps.fs.remove_file(&uncompressed)?;
    }

    deps.reporter.step(&format!("pulling {image} ({platform})..."));
    deps.registry
        .copy_architecture(&image.to_string(), platform, &uncompressed)
        .await?;
    deps.archiver.compress_in_place(&uncompressed, &dest).await?;
    deps.reporter.success(&format!("staged {name}"));
    Ok(())
}

/// Remove image archives that belong to no architecture of this version.
fn prune_stale_archives(package: &PackageLayout, expected: &[PathBuf], fs: &impl LocalFs) -> Result<()> {
    for file in fs.list_files(&package.images_dir())? {
        if !expected.contains(&file) {
            tracing::info!(file = %file.display(), "removing stale image archive");
            fs.remove_file(&package.images_dir().join(&file))?;
        }
    }
    Ok(())
}
