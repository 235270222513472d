use crate::output::print_json;
use anyhow::Context;
use bootstrap_core::{
    config::BootstrapConfig,
    extensions::ExtensionOutcome,
    orchestrator::Orchestrator,
    report::{Event, Reporter, SilentReporter},
    runner::SystemRunner,
};
use std::path::{Path, PathBuf};

/// `site-bootstrap run`: drive the pipeline once and report the outcome.
///
/// The failure reason is returned as the error so it is the last line the
/// operator sees.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = BootstrapConfig::load(root).context("failed to load bootstrap.yaml")?;
    let site = config.site_name.clone();
    let runner = SystemRunner;
    let orchestrator = Orchestrator::new(root, config, &runner);

    let report = if json {
        let report = orchestrator.run(&mut SilentReporter);
        print_json(&report)?;
        report
    } else {
        println!("Bootstrapping site '{site}' in: {}", root.display());
        orchestrator.run(&mut ConsoleReporter::new(root))
    };

    if let Some(failure) = &report.failure {
        anyhow::bail!("bootstrap failed after {}: {}", failure.after, failure.message);
    }

    if !json {
        println!("\nSite '{site}' bootstrapped successfully.");
        println!("Next: site-bootstrap serve");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ConsoleReporter
// ---------------------------------------------------------------------------

/// Narrates progress to stdout with paths shown relative to the root.
struct ConsoleReporter {
    root: PathBuf,
}

impl ConsoleReporter {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: Event<'_>) {
        match event {
            Event::StepStarted(stage) => println!("\n{}", stage.step_label()),
            Event::StageReached(_) => {}
            Event::DirectoryCreated(p) => println!("  created: {}", self.rel(p)),
            Event::DirectoryExists(p) => println!("  exists:  {}", self.rel(p)),
            Event::CommandStarted(cmd) => println!("  running: {cmd}"),
            Event::FileWritten { path, replaced } => {
                let verb = if replaced { "updated:" } else { "created:" };
                println!("  {verb} {}", self.rel(path));
            }
            Event::Extension(ExtensionOutcome::SkippedAbsent { source }) => {
                println!("  skipped: {} (not found)", source.display())
            }
            Event::Extension(ExtensionOutcome::Copied { source, dest }) => {
                println!("  copied:  {} -> {}", source.display(), self.rel(dest))
            }
            Event::Extension(ExtensionOutcome::CopyFailedTolerated { source, reason }) => {
                println!("  warning: could not copy {} ({reason}), continuing", source.display())
            }
            Event::Warning(msg) => println!("  warning: {msg}"),
            Event::Failed(_) => println!("  failed"),
        }
    }
}
