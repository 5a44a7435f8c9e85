//! WBA CLI - run and watch WB seller-analytics backend jobs
//!
//! # Usage
//!
//! ```bash
//! # Analyze reviews of a product card
//! wba run review-analysis --body '{"nm_id": 123456}'
//!
//! # Watch a task that was already submitted
//! wba watch keyword-clustering 5f1c2e
//!
//! # Show configuration and routes
//! wba info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{info, run, watch};

/// Long-running analytics jobs from the terminal.
///
/// Reads WBA_API_URL and WBA_INIT_DATA from the environment.
#[derive(Parser)]
#[command(
    name = "wba",
    version,
    about = "WBA CLI - WB seller-analytics jobs",
    long_about = "Submits AI analysis, clustering and SEO generation jobs to the\n\
                  analytics backend and follows them until they finish,\n\
                  showing queue position along the way."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job and wait for its outcome
    #[command(name = "run")]
    Run(run::RunArgs),

    /// Poll an already-submitted job
    #[command(name = "watch")]
    Watch(watch::WatchArgs),

    /// Show configuration and routes
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Watch(args) => watch::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
