use crate::error::BootstrapError;
use crate::extensions::ExtensionOutcome;
use crate::orchestrator::Stage;
use std::path::Path;

/// Progress notifications emitted while the pipeline runs.
#[derive(Debug)]
pub enum Event<'a> {
    /// Work toward this stage has begun.
    StepStarted(Stage),
    StageReached(Stage),
    DirectoryCreated(&'a Path),
    DirectoryExists(&'a Path),
    CommandStarted(&'a str),
    FileWritten { path: &'a Path, replaced: bool },
    Extension(&'a ExtensionOutcome),
    Warning(&'a str),
    Failed(&'a BootstrapError),
}

/// Receives pipeline progress. The CLI narrates it to the operator.
pub trait Reporter {
    fn report(&mut self, event: Event<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn report(&mut self, _event: Event<'_>) {}
}
