//! Tests for the installation state machine.

#![allow(clippy::expect_used)]

use std::sync::Mutex;

use zeek_installer::application::ports::{ProgressReporter, Prompt};
use zeek_installer::application::services::orchestrator::{
    InstallDeps, InstallSummary, run_install,
};
use zeek_installer::domain::error::{InstallError, is_cancellation};
use zeek_installer::domain::settings::InstallSettings;
use zeek_installer::domain::stage::InstallStage;
use zeek_installer::infra::fs::HostFs;

use crate::helpers::{FakePath, Fixture, FixedPrompt, NoopReporter, ScriptedHost};

async fn install(
    settings: &InstallSettings,
    host: &ScriptedHost,
    prompt: &FixedPrompt,
) -> anyhow::Result<InstallSummary> {
    let path = FakePath::default();
    let deps = InstallDeps {
        runner: host,
        fs: &HostFs,
        locator: &path,
        prompt,
        reporter: &NoopReporter,
    };
    run_install(settings, &deps).await
}

#[tokio::test]
async fn fresh_host_reaches_done() {
    let fixture = Fixture::new();
    let host = ScriptedHost::without_docker();
    let prompt = FixedPrompt::answering(true);

    let summary = install(&fixture.settings(true), &host, &prompt).await.expect("install");

    assert_eq!(summary.stage, Some(InstallStage::Done));
    assert!(summary.legacy.is_none());
    assert_eq!(summary.legacy_files_removed, 0);
    let agent = summary.agent.expect("agent report");
    assert!(agent.sensor_running);
    assert!(host.called("sh "));
    assert!(prompt.asked().is_empty());
}

#[tokio::test]
async fn repeated_runs_converge() {
    let fixture = Fixture::new();
    let host = ScriptedHost::default();
    let prompt = FixedPrompt::answering(true);
    let settings = fixture.settings(true);
    let layout = fixture.layout();

    let first = install(&settings, &host, &prompt).await.expect("first run");
    std::fs::write(layout.site_dir().join("local.zeek"), "# tuned after install\n").expect("edit");
    let second = install(&settings, &host, &prompt).await.expect("second run");
    let third = install(&settings, &host, &prompt).await.expect("third run");

    for summary in [&first, &second, &third] {
        assert_eq!(summary.stage, Some(InstallStage::Done));
        assert!(summary.agent.as_ref().expect("agent").sensor_running);
    }
    assert!(first.agent.as_ref().expect("agent").default_config_installed);
    assert!(!third.agent.as_ref().expect("agent").default_config_installed);
    assert_eq!(third.agent.as_ref().expect("agent").site_scripts_installed, 0);
    assert_eq!(
        std::fs::read_to_string(layout.site_dir().join("local.zeek")).expect("read"),
        "# tuned after install\n"
    );
    assert_eq!(std::fs::read_link(layout.bin_link()).expect("link"), layout.wrapper());
    assert_eq!(host.count("docker load"), 3);
    assert!(!host.called("sh "));
}

#[tokio::test]
async fn legacy_sensor_is_stopped_and_its_logs_kept() {
    let fixture = Fixture::new();
    fixture.write_host("/opt/bro/bin/broctl", "#!/bin/sh\n");
    fixture.write_host("/opt/bro/logs/current/conn.log", "{}\n");
    fixture.write_host("/etc/cron.d/bro", "*/5 * * * * root broctl cron\n");
    fixture.write_host("/etc/profile.d/bro.sh", "export PATH=$PATH:/opt/bro/bin\n");
    let host = ScriptedHost::default();
    let prompt = FixedPrompt::answering(true);

    let summary = install(&fixture.settings(false), &host, &prompt).await.expect("install");

    let control = fixture.host("/opt/bro/bin/broctl");
    assert_eq!(summary.legacy.as_ref().map(|l| &l.control), Some(&control));
    assert!(summary.logs_migrated);
    assert!(host.called(&format!("{} stop", control.display())));
    assert!(host.called(&format!("{} cron disable", control.display())));
    assert_eq!(
        std::fs::read_link(fixture.layout().log_dir()).expect("link"),
        fixture.host("/opt/bro/logs")
    );
    assert_eq!(summary.legacy_files_removed, 2);
    assert!(!fixture.host("/etc/cron.d/bro").exists());
    assert!(!fixture.host("/etc/profile.d/bro.sh").exists());
    assert_eq!(prompt.asked().len(), 3);
}

#[tokio::test]
async fn legacy_sensor_is_stopped_even_without_sensor_mode() {
    let fixture = Fixture::new();
    fixture.write_host("/opt/bro/bin/broctl", "#!/bin/sh\n");
    let host = ScriptedHost::default();

    let summary = install(&fixture.settings(false), &host, &FixedPrompt::answering(true))
        .await
        .expect("install");

    assert!(!summary.logs_migrated);
    assert_eq!(host.count(&fixture.host("/opt/bro/bin/broctl").display().to_string()), 2);
    assert!(!summary.agent.expect("agent").sensor_running);
}

#[tokio::test]
async fn declining_migration_cancels_before_any_change() {
    let fixture = Fixture::new();
    fixture.write_host("/opt/bro/bin/broctl", "#!/bin/sh\n");
    fixture.mkdir_host("/opt/bro/logs");
    let host = ScriptedHost::default();

    let err = install(&fixture.settings(true), &host, &FixedPrompt::answering(false))
        .await
        .expect_err("must stop");

    assert!(is_cancellation(&err));
    assert!(matches!(
        err.root_cause().downcast_ref::<InstallError>(),
        Some(InstallError::Declined)
    ));
    assert!(!host.called("docker"));
    assert!(!host.called(&fixture.host("/opt/bro/bin/broctl").display().to_string()));
    assert!(!fixture.layout().log_dir().exists());
}

#[tokio::test]
async fn declined_cleanup_keeps_files_and_succeeds() {
    let fixture = Fixture::new();
    fixture.write_host("/etc/cron.d/bro", "*/5 * * * * root broctl cron\n");
    let host = ScriptedHost::default();

    let summary = install(&fixture.settings(false), &host, &FixedPrompt::answering(false))
        .await
        .expect("install");

    assert_eq!(summary.stage, Some(InstallStage::Done));
    assert_eq!(summary.legacy_files_removed, 0);
    assert!(fixture.host("/etc/cron.d/bro").exists());
}

#[tokio::test]
async fn unmanaged_install_aborts_at_checks() {
    let fixture = Fixture::new();
    fixture.write_host("/usr/bin/zeekctl", "#!/bin/sh\n");
    let host = ScriptedHost::default();

    let err = install(&fixture.settings(true), &host, &FixedPrompt::answering(true))
        .await
        .expect_err("must fail");

    assert!(!is_cancellation(&err));
    assert!(format!("{err:#}").contains("checks_passed"));
    assert!(matches!(
        err.root_cause().downcast_ref::<InstallError>(),
        Some(InstallError::UnmanagedInstall(_))
    ));
    assert!(!host.called("docker"));
    assert!(!fixture.layout().wrapper().exists());
}

#[tokio::test]
async fn runtime_failure_stops_before_install() {
    let fixture = Fixture::new();
    let host = ScriptedHost {
        installer_ok: false,
        ..ScriptedHost::without_docker()
    };

    let err = install(&fixture.settings(true), &host, &FixedPrompt::answering(true))
        .await
        .expect_err("must fail");

    assert!(format!("{err:#}").contains("runtime_ready"));
    assert!(!host.called("docker load"));
    assert!(!fixture.layout().profile().exists());
}

#[tokio::test]
async fn failed_legacy_stop_halts_before_runtime() {
    let fixture = Fixture::new();
    fixture.write_host("/opt/bro/bin/broctl", "#!/bin/sh\n");
    fixture.mkdir_host("/opt/bro/logs");
    let host = ScriptedHost {
        legacy_stop_ok: false,
        ..ScriptedHost::default()
    };

    let err = install(&fixture.settings(true), &host, &FixedPrompt::answering(true))
        .await
        .expect_err("must fail");

    assert!(!is_cancellation(&err));
    assert!(format!("{err:#}").contains("checks_passed"));
    assert!(matches!(
        err.root_cause().downcast_ref::<InstallError>(),
        Some(InstallError::LegacyStopFailed { detail, .. }) if detail == "broctl: permission denied"
    ));
    assert_eq!(host.count(&fixture.host("/opt/bro/bin/broctl").display().to_string()), 1);
    assert!(!host.called("docker"));
    assert!(!fixture.layout().log_dir().exists());
}

/// Reporter and operator in one, recording the order of events.
#[derive(Default)]
struct EventLog(Mutex<Vec<&'static str>>);

impl EventLog {
    fn push(&self, event: &'static str) {
        self.0.lock().expect("lock").push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.0.lock().expect("lock").clone()
    }
}

impl ProgressReporter for EventLog {
    fn step(&self, _: &str) {
        self.push("step");
    }
    fn success(&self, _: &str) {
        self.push("success");
    }
    fn warn(&self, _: &str) {
        self.push("warn");
    }
    fn clear(&self) {
        self.push("clear");
    }
}

impl Prompt for EventLog {
    fn confirm(&self, _: &str, _default: bool) -> anyhow::Result<bool> {
        self.push("ask");
        Ok(true)
    }
}

#[tokio::test]
async fn progress_is_cleared_before_every_question() {
    let fixture = Fixture::new();
    fixture.write_host("/opt/bro/bin/broctl", "#!/bin/sh\n");
    fixture.write_host("/etc/cron.d/bro", "*/5 * * * * root broctl cron\n");
    fixture.write_host("/etc/profile.d/bro.sh", "export PATH=$PATH:/opt/bro/bin\n");
    let host = ScriptedHost::default();
    let log = EventLog::default();
    let path = FakePath::default();
    let deps = InstallDeps {
        runner: &host,
        fs: &HostFs,
        locator: &path,
        prompt: &log,
        reporter: &log,
    };

    run_install(&fixture.settings(false), &deps).await.expect("install");

    let events = log.events();
    let asks: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| **e == "ask")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(asks.len(), 3);
    for i in asks {
        assert_eq!(events[i - 1], "clear", "question at {i} asked over a live spinner");
    }
}
