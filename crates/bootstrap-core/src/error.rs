use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid site name '{0}': must be lowercase alphanumeric with hyphens or underscores")]
    InvalidSiteName(String),

    #[error("invalid bootstrap.yaml: {0}")]
    InvalidConfig(String),

    #[error("failed to {op} {}: {source}", path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program not found on PATH: {0}")]
    ProgramNotFound(String),

    #[error("failed to spawn '{program}': {reason}")]
    CommandSpawnFailed { program: String, reason: String },

    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{command}' timed out after {seconds}s")]
    CommandTimedOut { command: String, seconds: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BootstrapError {
    /// Wrap an io error with the operation and path that produced it.
    pub fn fs(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }

    /// Process exit signal for this failure.
    ///
    /// Configuration problems are caught before any step runs and exit with 2;
    /// every pipeline failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidSiteName(_) | Self::InvalidConfig(_) | Self::Yaml(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Outcome of a single pipeline step.
pub type StepResult = Result<()>;
