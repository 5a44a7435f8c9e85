//! Watch command - follow a task submitted elsewhere
//!
//! Usage:
//! ```bash
//! wba watch keyword-clustering 5f1c2e --interval-ms 1000
//! ```

use anyhow::Result;
use clap::Args;
use wba_tasks::{AsyncTaskClient, Job, JobKind};

use super::{
    endpoints_for, follow, load_config, poll_options, print_metrics, report, Console, PollArgs,
    RouteArgs,
};

/// Arguments for the watch command
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Job kind the task belongs to
    pub kind: JobKind,

    /// Backend task id
    pub task_id: String,

    /// Output the raw JSON payload only
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub poll: PollArgs,

    #[command(flatten)]
    pub routes: RouteArgs,
}

/// Run the watch command
pub async fn run(args: WatchArgs) -> Result<()> {
    let config = load_config()?;
    let endpoints = endpoints_for(&args.kind, &config, &args.routes)?;
    let job = Job::new(args.task_id, args.kind.clone(), endpoints, config.auth_headers());

    let console = Console::new(args.raw);
    let client = AsyncTaskClient::from_config(&config)?;
    let options = poll_options(&args.kind, &config, &args.poll, console);
    let outcome = follow(&client, &job, options, console).await;
    print_metrics(&client, &args.poll);
    report(outcome, console)
}
