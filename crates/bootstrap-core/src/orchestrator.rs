//! The bootstrap pipeline.
//!
//! Steps run strictly in order, one per stage transition:
//!
//! ```text
//! Idle → EnvironmentResolved → DirectoriesReady → DependenciesInstalled
//!      → ConfigWritten → ExtensionsWired → Complete
//! ```
//!
//! Any fatal step error moves the machine to `Failed`. Nothing is retried
//! and files written by earlier steps are left in place.
//!
//! Precondition: at most one run per bootstrap root at a time. Concurrent
//! runs race on `site_config.json` and are not guarded against.

use crate::config::BootstrapConfig;
use crate::env::ResolvedConfig;
use crate::error::StepResult;
use crate::extensions::{self, ExtensionOutcome};
use crate::report::{Event, Reporter};
use crate::runner::CommandRunner;
use crate::{installer, provision, site_config, web_entry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    EnvironmentResolved,
    DirectoriesReady,
    DependenciesInstalled,
    ConfigWritten,
    ExtensionsWired,
    Complete,
    Failed,
}

impl Stage {
    /// The success path, in order.
    pub fn pipeline() -> &'static [Stage] {
        &[
            Stage::Idle,
            Stage::EnvironmentResolved,
            Stage::DirectoriesReady,
            Stage::DependenciesInstalled,
            Stage::ConfigWritten,
            Stage::ExtensionsWired,
            Stage::Complete,
        ]
    }

    pub fn next(self) -> Option<Stage> {
        let all = Stage::pipeline();
        all.iter()
            .position(|s| *s == self)
            .and_then(|i| all.get(i + 1).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::EnvironmentResolved => "environment_resolved",
            Stage::DirectoriesReady => "directories_ready",
            Stage::DependenciesInstalled => "dependencies_installed",
            Stage::ConfigWritten => "config_written",
            Stage::ExtensionsWired => "extensions_wired",
            Stage::Complete => "complete",
            Stage::Failed => "failed",
        }
    }

    /// Operator-facing heading for the step that leads into this stage.
    pub fn step_label(self) -> &'static str {
        match self {
            Stage::Idle => "Starting",
            Stage::EnvironmentResolved => "Resolving environment",
            Stage::DirectoriesReady => "Creating directories",
            Stage::DependenciesInstalled => "Installing dependencies",
            Stage::ConfigWritten => "Writing site configuration",
            Stage::ExtensionsWired => "Wiring custom extensions",
            Stage::Complete => "Generating web entry point",
            Stage::Failed => "Failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    /// Last stage reached before the failing step.
    pub after: Stage,
    pub message: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stage: Stage,
    pub reached: Vec<Stage>,
    pub extensions: Vec<ExtensionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_entry: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            stage: Stage::Idle,
            reached: vec![Stage::Idle],
            extensions: Vec::new(),
            site_config: None,
            web_entry: None,
            failure: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.stage == Stage::Complete
    }

    pub fn exit_code(&self) -> i32 {
        match (&self.failure, self.stage) {
            (Some(f), _) => f.exit_code,
            (None, Stage::Complete) => 0,
            (None, _) => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

type EnvLookup<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

pub struct Orchestrator<'a> {
    root: PathBuf,
    config: BootstrapConfig,
    runner: &'a dyn CommandRunner,
    env: EnvLookup<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Orchestrator reading the process environment.
    pub fn new(
        root: impl Into<PathBuf>,
        config: BootstrapConfig,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            runner,
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'a,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Drive the pipeline to `Complete` or `Failed`.
    pub fn run(&self, reporter: &mut dyn Reporter) -> RunReport {
        let mut report = RunReport::new();
        tracing::info!(root = %self.root.display(), site = %self.config.site_name, "bootstrap started");

        if let Err(err) = self.drive(reporter, &mut report) {
            tracing::error!(after = %report.stage, error = %err, "bootstrap failed");
            reporter.report(Event::Failed(&err));
            report.failure = Some(Failure {
                after: report.stage,
                message: err.to_string(),
                exit_code: err.exit_code(),
            });
            report.stage = Stage::Failed;
            report.reached.push(Stage::Failed);
        } else {
            tracing::info!("bootstrap complete");
        }

        report.finished_at = Utc::now();
        report
    }

    fn drive(&self, reporter: &mut dyn Reporter, report: &mut RunReport) -> StepResult {
        let root = self.root.as_path();

        // Idle → EnvironmentResolved
        begin(reporter, Stage::EnvironmentResolved);
        let resolved = ResolvedConfig::from_lookup(|key| (self.env)(key))
            .with_site_name(self.config.site_name.clone());
        if resolved.database_url.is_none() {
            reporter.report(Event::Warning(
                "DATABASE_URL not set; the site will use the resolved PG* connection defaults",
            ));
        }
        reach(reporter, report, Stage::EnvironmentResolved);

        // → DirectoriesReady
        begin(reporter, Stage::DirectoriesReady);
        for dir in provision::ensure_directories(root, &self.config.directories)? {
            if dir.created {
                reporter.report(Event::DirectoryCreated(&dir.path));
            } else {
                reporter.report(Event::DirectoryExists(&dir.path));
            }
        }
        reach(reporter, report, Stage::DirectoriesReady);

        // → DependenciesInstalled
        begin(reporter, Stage::DependenciesInstalled);
        installer::install_dependencies(self.runner, root, &self.config.install, reporter)?;
        reach(reporter, report, Stage::DependenciesInstalled);

        // → ConfigWritten
        begin(reporter, Stage::ConfigWritten);
        let written = site_config::write_site_config(
            root,
            &resolved,
            &resolved.site_name,
            &self.config.apps,
        )?;
        reporter.report(Event::FileWritten {
            path: &written.config_path,
            replaced: written.config_replaced,
        });
        reporter.report(Event::FileWritten {
            path: &written.manifest_path,
            replaced: written.manifest_replaced,
        });
        report.site_config = Some(written.config_path);
        reach(reporter, report, Stage::ConfigWritten);

        // → ExtensionsWired (best-effort, never fails)
        begin(reporter, Stage::ExtensionsWired);
        report.extensions = extensions::wire_extensions(
            root,
            &self.config.extensions.target_dir,
            &self.config.extensions.files,
            reporter,
        );
        reach(reporter, report, Stage::ExtensionsWired);

        // → Complete
        begin(reporter, Stage::Complete);
        let (entry, replaced) = web_entry::write_web_entry(root, &self.config.web)?;
        reporter.report(Event::FileWritten {
            path: &entry,
            replaced,
        });
        report.web_entry = Some(entry);
        reach(reporter, report, Stage::Complete);

        Ok(())
    }
}

fn begin(reporter: &mut dyn Reporter, target: Stage) {
    tracing::debug!(stage = %target, "step started");
    reporter.report(Event::StepStarted(target));
}

fn reach(reporter: &mut dyn Reporter, report: &mut RunReport, stage: Stage) {
    debug_assert_eq!(report.stage.next(), Some(stage));
    report.stage = stage;
    report.reached.push(stage);
    reporter.report(Event::StageReached(stage));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandSpec;
    use crate::paths;
    use crate::runner::fake::FakeRunner;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Collects a compact trace of events.
    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
    }

    impl Reporter for Recorder {
        fn report(&mut self, event: Event<'_>) {
            let line = match event {
                Event::StepStarted(s) => format!("start {s}"),
                Event::StageReached(s) => format!("reached {s}"),
                Event::CommandStarted(c) => format!("run {c}"),
                Event::Failed(e) => format!("failed {e}"),
                Event::Warning(w) => format!("warn {w}"),
                _ => return,
            };
            self.lines.push(line);
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn config() -> BootstrapConfig {
        let mut cfg = BootstrapConfig::default();
        cfg.install.commands = vec![
            CommandSpec::new("pip", ["install", "--upgrade", "pip"]),
            CommandSpec::new("pip", ["install", "-r", "requirements.txt"]),
        ];
        cfg
    }

    #[test]
    fn stage_order() {
        assert_eq!(Stage::Idle.next(), Some(Stage::EnvironmentResolved));
        assert_eq!(Stage::ExtensionsWired.next(), Some(Stage::Complete));
        assert_eq!(Stage::Complete.next(), None);
        assert_eq!(Stage::Failed.next(), None);
    }

    #[test]
    fn full_run_reaches_complete() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default();
        let orch = Orchestrator::new(dir.path(), config(), &runner).with_env(env(&[
            ("PGHOST", "dbhost"),
            ("PGPORT", "5433"),
            ("PGDATABASE", "erp"),
            ("PGUSER", "admin"),
            ("PGPASSWORD", "secret"),
        ]));
        let report = orch.run(&mut Recorder::default());

        assert!(report.succeeded());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.reached, Stage::pipeline());
        assert_eq!(runner.calls.borrow().len(), 2);

        let site = site_config::SiteConfigFile::load(dir.path(), "debrasite").unwrap();
        assert_eq!(site.db_host, "dbhost");
        assert_eq!(site.db_port, 5433);
        assert_eq!(site.db_name, "erp");
        assert_eq!(site.db_user, "admin");
        assert_eq!(site.db_password, "secret");
        assert_eq!(site.default_site, "debrasite");

        for d in ["logs", "sites", "public"] {
            assert!(dir.path().join(d).is_dir());
        }
        assert!(dir.path().join(paths::WEB_ENTRY_FILE).exists());
    }

    #[test]
    fn empty_environment_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default();
        let report = Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[]))
            .run(&mut Recorder::default());
        assert!(report.succeeded());

        let site = site_config::SiteConfigFile::load(dir.path(), "debrasite").unwrap();
        assert_eq!(site.db_host, "localhost");
        assert_eq!(site.db_port, 5432);
        assert_eq!(site.db_name, "erpnext");
        assert_eq!(site.db_user, "postgres");
        assert_eq!(site.db_password, "");
    }

    #[test]
    fn missing_extensions_still_complete() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default();
        let report = Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[]))
            .run(&mut Recorder::default());
        assert_eq!(report.stage, Stage::Complete);
        assert_eq!(report.extensions.len(), 4);
        assert!(report
            .extensions
            .iter()
            .all(|o| matches!(o, ExtensionOutcome::SkippedAbsent { .. })));
    }

    #[test]
    fn installer_failure_stops_before_site_config() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::failing(
            "pip install -r requirements.txt",
            1,
            "ERROR: Could not open requirements file",
        );
        let mut recorder = Recorder::default();
        let report = Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[]))
            .run(&mut recorder);

        assert_eq!(report.stage, Stage::Failed);
        assert_ne!(report.exit_code(), 0);
        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.after, Stage::DirectoriesReady);
        assert!(failure.message.contains("Could not open requirements file"));

        assert!(!paths::site_config_path(dir.path(), "debrasite").exists());
        assert!(!paths::apps_manifest_path(dir.path()).exists());
        assert!(!dir.path().join(paths::WEB_ENTRY_FILE).exists());
        assert!(report.site_config.is_none());
        assert!(report.extensions.is_empty());
        assert!(!report.reached.contains(&Stage::ConfigWritten));
        assert!(recorder.lines.last().unwrap().starts_with("failed "));
    }

    #[test]
    fn installer_timeout_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::timing_out("pip install --upgrade pip");
        let report = Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[]))
            .run(&mut Recorder::default());
        assert_eq!(report.stage, Stage::Failed);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn directory_failure_stops_before_install() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("logs"), b"").unwrap();
        let runner = FakeRunner::default();
        let report = Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[]))
            .run(&mut Recorder::default());
        assert_eq!(report.stage, Stage::Failed);
        assert_eq!(
            report.failure.as_ref().unwrap().after,
            Stage::EnvironmentResolved
        );
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn warns_without_database_url() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default();
        let mut recorder = Recorder::default();
        Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[]))
            .run(&mut recorder);
        assert!(recorder.lines.iter().any(|l| l.starts_with("warn DATABASE_URL")));

        let mut quiet = Recorder::default();
        Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[("DATABASE_URL", "postgres://db/erp")]))
            .run(&mut quiet);
        assert!(!quiet.lines.iter().any(|l| l.starts_with("warn")));
    }

    #[test]
    fn narration_follows_stage_order() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default();
        let mut recorder = Recorder::default();
        Orchestrator::new(dir.path(), config(), &runner)
            .with_env(env(&[("DATABASE_URL", "postgres://db/erp")]))
            .run(&mut recorder);
        let reached: Vec<&str> = recorder
            .lines
            .iter()
            .filter_map(|l| l.strip_prefix("reached "))
            .collect();
        assert_eq!(
            reached,
            vec![
                "environment_resolved",
                "directories_ready",
                "dependencies_installed",
                "config_written",
                "extensions_wired",
                "complete",
            ]
        );
    }

    #[test]
    fn rerun_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::default();
        let orch = Orchestrator::new(dir.path(), config(), &runner).with_env(env(&[]));
        assert!(orch.run(&mut Recorder::default()).succeeded());
        assert!(orch.run(&mut Recorder::default()).succeeded());
    }
}
