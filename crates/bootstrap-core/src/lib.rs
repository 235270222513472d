pub mod config;
pub mod env;
pub mod error;
pub mod extensions;
pub mod installer;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod provision;
pub mod report;
pub mod runner;
pub mod site_config;
pub mod web_entry;

pub use error::{BootstrapError, Result, StepResult};
