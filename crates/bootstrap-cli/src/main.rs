mod cmd;
mod output;
mod root;

use bootstrap_core::BootstrapError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "site-bootstrap",
    about = "Provision a site: resolve environment, install dependencies, write site config",
    version,
    propagate_version = true
)]
struct Cli {
    /// Bootstrap root (default: nearest directory with bootstrap.yaml, else cwd)
    #[arg(long, global = true, env = "BOOTSTRAP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full bootstrap pipeline
    Run,

    /// Show the configuration resolved from the environment (secrets masked)
    Resolve,

    /// Start the status web server
    Serve {
        /// Port to listen on (default: $PORT, else 8000)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Run => cmd::run::run(&root, cli.json),
        Commands::Resolve => cmd::resolve::run(&root, cli.json),
        Commands::Serve { port } => cmd::serve::run(port),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let code = e
            .downcast_ref::<BootstrapError>()
            .map(BootstrapError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
