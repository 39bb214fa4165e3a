//! Tests for the `stager` application service.

#![allow(clippy::expect_used)]

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use zeek_installer::application::ports::{ImageRegistry, ScriptFetcher};
use zeek_installer::application::services::agent_install::install_agent;
use zeek_installer::application::services::stager::{SiteScript, StageDeps, StageReport, stage};
use zeek_installer::domain::archive::image_archive_name;
use zeek_installer::domain::config::StageConfig;
use zeek_installer::domain::error::StageError;
use zeek_installer::domain::layout::InstallLayout;
use zeek_installer::domain::manifest::Platform;
use zeek_installer::domain::settings::InstallSettings;
use zeek_installer::infra::archive::TarArchiver;
use zeek_installer::infra::fs::HostFs;

use crate::helpers::{NoopReporter, ScriptedHost, write};

const INDEX: &str = r#"{
  "schemaVersion": 2,
  "mediaType": "application/vnd.oci.image.index.v1+json",
  "manifests": [
    {"digest": "sha256:aa", "platform": {"architecture": "amd64", "os": "linux"}},
    {"digest": "sha256:bb", "platform": {"architecture": "arm64", "os": "linux"}},
    {"digest": "sha256:cc", "platform": {"architecture": "unknown", "os": "unknown"}}
  ]
}"#;

const ARM_VARIANTS: &str = r#"{
  "manifests": [
    {"digest": "sha256:a6", "platform": {"architecture": "arm", "os": "linux", "variant": "v6"}},
    {"digest": "sha256:a7", "platform": {"architecture": "arm", "os": "linux", "variant": "v7"}}
  ]
}"#;

const SINGLE: &str = r#"{"schemaVersion": 2, "config": {"digest": "sha256:dd"}, "layers": []}"#;

// ── Mock: registry ───────────────────────────────────────────────────────────

struct FakeRegistry {
    raw: &'static str,
    copies: Mutex<Vec<String>>,
}

impl FakeRegistry {
    fn new(raw: &'static str) -> Self {
        Self {
            raw,
            copies: Mutex::new(Vec::new()),
        }
    }

    fn copies(&self) -> Vec<String> {
        self.copies.lock().expect("lock").clone()
    }
}

impl ImageRegistry for FakeRegistry {
    async fn inspect_raw(&self, _: &str) -> Result<String> {
        Ok(self.raw.to_string())
    }
    async fn inspect(&self, _: &str) -> Result<String> {
        Ok(r#"{"Name": "docker.io/activecm/zeek", "Architecture": "arm64", "Os": "linux"}"#.to_string())
    }
    async fn copy_architecture(&self, image: &str, platform: &Platform, dest: &Path) -> Result<()> {
        self.copies.lock().expect("lock").push(format!("{image} {platform}"));
        std::fs::write(dest, format!("layers of {image} for {platform}"))?;
        Ok(())
    }
}

struct FailingRegistry;

impl ImageRegistry for FailingRegistry {
    async fn inspect_raw(&self, _: &str) -> Result<String> {
        Ok(INDEX.to_string())
    }
    async fn inspect(&self, _: &str) -> Result<String> {
        anyhow::bail!("inspect not expected in this test")
    }
    async fn copy_architecture(&self, image: &str, platform: &Platform, _: &Path) -> Result<()> {
        Err(StageError::CopyFailed {
            image: image.to_string(),
            arch: platform.to_string(),
            detail: "manifest unknown".to_string(),
        }
        .into())
    }
}

// ── Mock: script downloads ───────────────────────────────────────────────────

struct FakeFetcher;

impl ScriptFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Ok(format!("#!/bin/sh\n# from {url}\n").into_bytes())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config(dir: &TempDir, image: &str) -> StageConfig {
    StageConfig {
        image: image.to_string(),
        output: dir.path().to_path_buf(),
        ..StageConfig::default()
    }
}

fn images_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("zeek-installer/images")
}

async fn run_stage(
    config: &StageConfig,
    no_pull: bool,
    registry: &impl ImageRegistry,
) -> Result<StageReport> {
    let scripts = [SiteScript {
        path: Path::new("local.zeek"),
        contents: b"@load packages\n",
    }];
    let deps = StageDeps {
        registry,
        fetcher: &FakeFetcher,
        archiver: &TarArchiver,
        fs: &HostFs,
        reporter: &NoopReporter,
    };
    stage(config, no_pull, &scripts, &deps).await
}

fn sealed_entries(path: &Path) -> BTreeSet<String> {
    let mut archive = tar::Archive::new(std::fs::File::open(path).expect("open"));
    archive
        .entries()
        .expect("entries")
        .map(|e| e.expect("entry").path().expect("path").display().to_string())
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stages_every_published_architecture() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(INDEX);

    let report = run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &registry)
        .await
        .expect("stage");

    assert_eq!(report.version, "4.2.0");
    assert_eq!(report.architectures, vec!["amd64", "arm64"]);
    assert!(report.reused.is_empty());
    assert_eq!(
        registry.copies(),
        vec!["activecm/zeek:4.2.0 amd64", "activecm/zeek:4.2.0 arm64"]
    );

    let amd64 = images_dir(&dir).join(image_archive_name("activecm/zeek", "4.2.0", "amd64"));
    let mut decoded = String::new();
    flate2::read::GzDecoder::new(std::fs::File::open(&amd64).expect("open"))
        .read_to_string(&mut decoded)
        .expect("gunzip");
    assert_eq!(decoded, "layers of activecm/zeek:4.2.0 for amd64");
    assert!(!images_dir(&dir).join("activecm_zeek_4_2_0_amd64.tar").exists());

    assert_eq!(
        std::fs::read_to_string(dir.path().join("zeek-installer/VERSION")).expect("version"),
        "4.2.0\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("zeek-installer/IMAGE")).expect("image"),
        "activecm/zeek\n"
    );
    assert_eq!(report.archive, dir.path().join("zeek-installer-4_2_0.tar"));
    let entries = sealed_entries(&report.archive);
    for expected in [
        "zeek-installer/VERSION",
        "zeek-installer/IMAGE",
        "zeek-installer/scripts/zeek",
        "zeek-installer/scripts/install_docker.sh",
        "zeek-installer/zeekscripts/local.zeek",
        "zeek-installer/images/activecm_zeek_4_2_0_amd64.tar.gz",
        "zeek-installer/images/activecm_zeek_4_2_0_arm64.tar.gz",
    ] {
        assert!(entries.contains(expected), "missing {expected} in {entries:?}");
    }
}

#[tokio::test]
async fn no_pull_reuses_existing_archives_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let existing = images_dir(&dir).join(image_archive_name("activecm/zeek", "4.2.0", "amd64"));
    write(&existing, "previously staged");
    let before = std::fs::metadata(&existing).expect("meta").modified().expect("mtime");
    let registry = FakeRegistry::new(INDEX);

    let report = run_stage(&config(&dir, "activecm/zeek:4.2.0"), true, &registry)
        .await
        .expect("stage");

    assert_eq!(report.reused, vec!["amd64"]);
    assert_eq!(registry.copies(), vec!["activecm/zeek:4.2.0 arm64"]);
    assert_eq!(std::fs::read_to_string(&existing).expect("read"), "previously staged");
    assert_eq!(std::fs::metadata(&existing).expect("meta").modified().expect("mtime"), before);
}

#[tokio::test]
async fn without_no_pull_archives_are_refreshed() {
    let dir = TempDir::new().expect("tempdir");
    let existing = images_dir(&dir).join(image_archive_name("activecm/zeek", "4.2.0", "amd64"));
    write(&existing, "previously staged");
    let registry = FakeRegistry::new(INDEX);

    let report = run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &registry)
        .await
        .expect("stage");

    assert!(report.reused.is_empty());
    assert_eq!(registry.copies().len(), 2);
    assert_ne!(std::fs::read(&existing).expect("read"), b"previously staged");
}

#[tokio::test]
async fn single_manifest_falls_back_to_image_architecture() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(SINGLE);

    let report = run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &registry)
        .await
        .expect("stage");

    assert_eq!(report.architectures, vec!["arm64"]);
    assert_eq!(registry.copies(), vec!["activecm/zeek:4.2.0 arm64"]);
}

#[tokio::test]
async fn archives_of_other_versions_are_pruned() {
    let dir = TempDir::new().expect("tempdir");
    let stale = images_dir(&dir).join(image_archive_name("activecm/zeek", "4.1.0", "amd64"));
    write(&stale, "old release");

    run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &FakeRegistry::new(INDEX))
        .await
        .expect("stage");

    assert!(!stale.exists());
}

#[tokio::test]
async fn invalid_reference_is_rejected_before_registry_access() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(INDEX);

    let err = run_stage(&config(&dir, "activecm/zeek"), false, &registry)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err.downcast_ref::<StageError>(),
        Some(StageError::InvalidReference(_))
    ));
    assert!(registry.copies().is_empty());
}

#[tokio::test]
async fn manifest_without_architectures_fails() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(r#"{"manifests": []}"#);

    let err = run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &registry)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err.downcast_ref::<StageError>(),
        Some(StageError::NoArchitectures(_))
    ));
}

#[tokio::test]
async fn failed_copy_leaves_no_package() {
    let dir = TempDir::new().expect("tempdir");

    let err = run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &FailingRegistry)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err.downcast_ref::<StageError>(),
        Some(StageError::CopyFailed { arch, .. }) if arch == "amd64"
    ));
    assert!(!dir.path().join("zeek-installer-4_2_0.tar").exists());
    assert!(!dir.path().join("zeek-installer/VERSION").exists());
}

#[tokio::test]
async fn arm_index_stages_the_v7_variant_once() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(ARM_VARIANTS);

    let report = run_stage(&config(&dir, "activecm/zeek:4.2.0"), false, &registry)
        .await
        .expect("stage");

    assert_eq!(report.architectures, vec!["arm/v7"]);
    assert_eq!(registry.copies(), vec!["activecm/zeek:4.2.0 arm/v7"]);
    assert!(
        images_dir(&dir)
            .join(image_archive_name("activecm/zeek", "4.2.0", "arm"))
            .is_file()
    );
}

#[tokio::test]
async fn tag_with_shell_metacharacters_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(INDEX);

    let err = run_stage(&config(&dir, "activecm/zeek:4.2.0$(id)"), false, &registry)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err.downcast_ref::<StageError>(),
        Some(StageError::InvalidReference(_))
    ));
    assert!(registry.copies().is_empty());
}

#[tokio::test]
async fn package_staged_from_another_registry_installs() {
    let dir = TempDir::new().expect("tempdir");
    let registry = FakeRegistry::new(INDEX);
    run_stage(&config(&dir, "ghcr.io/activecm/zeek:4.2.0"), false, &registry)
        .await
        .expect("stage");

    let host_root = TempDir::new().expect("tempdir");
    let settings = InstallSettings::new(false, true, true, dir.path().join("zeek-installer"))
        .with_layout(InstallLayout::new(host_root.path()))
        .with_settle(Duration::ZERO);
    let host = ScriptedHost::default();

    let report = install_agent(&settings, &host, &HostFs, &NoopReporter)
        .await
        .expect("install");

    assert_eq!(report.version, "4.2.0");
    assert_eq!(report.archive, "ghcr_io_activecm_zeek_4_2_0_amd64.tar.gz");
    assert!(
        settings
            .layout
            .image_store()
            .join("ghcr_io_activecm_zeek_4_2_0_amd64.tar.gz")
            .is_file()
    );
    assert!(host.called("docker load"));
}
