//! Run command - submit a job and follow it to the end
//!
//! Usage:
//! ```bash
//! wba run review-analysis --body '{"nm_id": 123456}'
//! wba run content-generation --body-file card.json --raw
//! ```

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use wba_tasks::{AsyncTaskClient, JobKind, Submission, TaskRequest};

use super::{
    endpoints_for, follow, load_config, poll_options, print_metrics, report, Console, PollArgs,
    RouteArgs,
};

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job kind (review-analysis, keyword-clustering, content-generation, or a custom label)
    pub kind: JobKind,

    /// JSON request body
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the JSON request body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Output the raw JSON payload only
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub poll: PollArgs,

    #[command(flatten)]
    pub routes: RouteArgs,
}

fn read_body(args: &RunArgs) -> Result<Value> {
    let text = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => "{}".to_string(),
    };
    serde_json::from_str(&text).context("Request body is not valid JSON")
}

/// Run the run command
pub async fn run(args: RunArgs) -> Result<()> {
    let console = Console::new(args.raw);
    let config = load_config()?;
    let body = read_body(&args)?;
    let endpoints = endpoints_for(&args.kind, &config, &args.routes)?;

    let headers = config.auth_headers();
    if headers.is_empty() {
        console.warning("WBA_INIT_DATA is not set, sending the request unauthenticated");
    }

    let client = AsyncTaskClient::from_config(&config)?;
    let request = TaskRequest::new(args.kind.clone(), endpoints, body);

    let submission = match client.submit(&request, &headers).await {
        Ok(submission) => submission,
        Err(e) => {
            console.error(&e.message());
            return Err(e).context("Submission failed");
        }
    };

    let outcome = match submission {
        Submission::Resolved(outcome) => {
            console.info("Backend answered immediately");
            outcome
        }
        Submission::Accepted(job) => {
            let options = poll_options(&args.kind, &config, &args.poll, console);
            follow(&client, &job, options, console).await
        }
    };
    print_metrics(&client, &args.poll);
    report(outcome, console)
}
