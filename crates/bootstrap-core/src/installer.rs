use crate::config::InstallConfig;
use crate::error::{BootstrapError, StepResult};
use crate::report::{Event, Reporter};
use crate::runner::CommandRunner;
use std::path::Path;

/// Lines of captured stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Run every install command in order, stopping at the first failure.
///
/// Installation is opaque: a non-zero exit, a timeout, or a missing program
/// is fatal and nothing already installed is undone.
pub fn install_dependencies(
    runner: &dyn CommandRunner,
    root: &Path,
    install: &InstallConfig,
    reporter: &mut dyn Reporter,
) -> StepResult {
    for cmd in &install.commands {
        let shown = cmd.display();
        reporter.report(Event::CommandStarted(&shown));
        tracing::info!(command = %shown, "running install command");

        let output = runner.run(cmd, root, install.timeout())?;
        if !output.success() {
            return Err(BootstrapError::CommandFailed {
                command: shown,
                status: output.status_text(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        tracing::debug!(command = %shown, stdout = %output.stdout, "install command finished");
    }
    Ok(())
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    if lines.is_empty() {
        return "(no stderr output)".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
