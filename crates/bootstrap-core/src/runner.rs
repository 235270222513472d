//! Child-process invocation behind a narrow trait.
//!
//! Callers hand a [`CommandSpec`] (program plus argument list, never a shell
//! string) to a [`CommandRunner`] and get back the exit status and captured
//! streams. [`SystemRunner`] spawns real processes; tests substitute a fake.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::CommandSpec;
use crate::error::{BootstrapError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "a signal".to_string(),
        }
    }
}

pub trait CommandRunner {
    /// Run `cmd` in `cwd` to completion. A `timeout` bounds the wall-clock
    /// time; exceeding it kills the child and yields
    /// [`BootstrapError::CommandTimedOut`].
    fn run(&self, cmd: &CommandSpec, cwd: &Path, timeout: Option<Duration>)
        -> Result<CommandOutput>;
}

/// Spawns real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let program = which::which_in(&cmd.program, std::env::var_os("PATH"), cwd)
            .map_err(|_| BootstrapError::ProgramNotFound(cmd.program.clone()))?;

        let mut child = Command::new(&program)
            .args(&cmd.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BootstrapError::CommandSpawnFailed {
                program: cmd.program.clone(),
                reason: e.to_string(),
            })?;

        // Drain both pipes on their own threads so a chatty child never
        // blocks on a full pipe while we wait for it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let code = match timeout {
            None => child.wait().map_err(|e| spawn_failed(cmd, e))?.code(),
            Some(limit) => {
                let finished =
                    wait_with_deadline(&mut child, limit).map_err(|e| spawn_failed(cmd, e))?;
                let Some(code) = finished else {
                    tracing::warn!(
                        command = %cmd.display(),
                        secs = limit.as_secs(),
                        "killing timed-out command"
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BootstrapError::CommandTimedOut {
                        command: cmd.display(),
                        seconds: limit.as_secs(),
                    });
                };
                code
            }
        };

        Ok(CommandOutput {
            code,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

fn spawn_failed(cmd: &CommandSpec, e: std::io::Error) -> BootstrapError {
    BootstrapError::CommandSpawnFailed {
        program: cmd.program.clone(),
        reason: e.to_string(),
    }
}

/// `Ok(Some(code))` when the child exits before `limit`, `Ok(None)` on timeout.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> std::io::Result<Option<Option<i32>>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code()));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;

    /// Records every invocation; fails or times out on the configured program.
    #[derive(Debug, Default)]
    pub struct FakeRunner {
        pub calls: RefCell<Vec<String>>,
        pub fail_on: Option<(String, i32, String)>,
        pub timeout_on: Option<String>,
    }

    impl FakeRunner {
        pub fn failing(display: &str, code: i32, stderr: &str) -> Self {
            Self {
                fail_on: Some((display.to_string(), code, stderr.to_string())),
                ..Default::default()
            }
        }

        pub fn timing_out(display: &str) -> Self {
            Self {
                timeout_on: Some(display.to_string()),
                ..Default::default()
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(
            &self,
            cmd: &CommandSpec,
            _cwd: &Path,
            timeout: Option<Duration>,
        ) -> Result<CommandOutput> {
            let display = cmd.display();
            self.calls.borrow_mut().push(display.clone());
            if self.timeout_on.as_deref() == Some(display.as_str()) {
                return Err(BootstrapError::CommandTimedOut {
                    command: display,
                    seconds: timeout.map(|t| t.as_secs()).unwrap_or(0),
                });
            }
            if let Some((target, code, stderr)) = &self.fail_on {
                if *target == display {
                    return Ok(CommandOutput {
                        code: Some(*code),
                        stdout: String::new(),
                        stderr: stderr.clone(),
                    });
                }
            }
            Ok(CommandOutput {
                code: Some(0),
                stdout: format!("ran {display}\n"),
                stderr: String::new(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
