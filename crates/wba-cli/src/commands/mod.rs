//! Subcommands and the helpers they share

pub mod info;
pub mod run;
pub mod watch;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::future::Future;
use std::time::Duration;

use wba_tasks::{AsyncTaskClient, ClientConfig, Job, JobKind, JobOutcome, PollOptions, TaskEndpoints};

/// Where human-readable lines go. With `--raw`, stdout carries only the payload.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    raw: bool,
}

impl Console {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    /// Whether status lines are written to stderr
    pub fn uses_stderr(&self) -> bool {
        self.raw
    }

    pub fn line(&self, msg: &str) {
        if self.raw {
            eprintln!("{msg}");
        } else {
            println!("{msg}");
        }
    }

    pub fn success(&self, msg: &str) {
        self.line(&format!("{} {}", "✓".green().bold(), msg));
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", "✗".red().bold(), msg);
    }

    pub fn warning(&self, msg: &str) {
        self.line(&format!("{} {}", "⚠".yellow().bold(), msg));
    }

    pub fn info(&self, msg: &str) {
        self.line(&format!("{} {}", "ℹ".blue().bold(), msg));
    }
}

/// Polling cadence overrides
#[derive(Args, Debug, Default)]
pub struct PollArgs {
    /// Milliseconds between polls (default depends on the job kind)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Maximum number of result polls (default depends on the job kind)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Print client counters in Prometheus text format to stderr when done
    #[arg(long)]
    pub metrics: bool,
}

/// Explicit routes, required for custom job kinds
#[derive(Args, Debug, Default)]
pub struct RouteArgs {
    /// Submission URL
    #[arg(long)]
    pub submit_url: Option<String>,

    /// Queue status URL prefix, the task id is appended
    #[arg(long)]
    pub queue_url: Option<String>,

    /// Result URL prefix, the task id is appended
    #[arg(long)]
    pub result_url: Option<String>,
}

/// Load configuration from the environment
pub fn load_config() -> Result<ClientConfig> {
    ClientConfig::try_from_env().context("Invalid WBA_* environment")
}

/// Routes for a kind, with command-line overrides applied
pub fn endpoints_for(kind: &JobKind, config: &ClientConfig, routes: &RouteArgs) -> Result<TaskEndpoints> {
    let defaults = kind.endpoints(&config.base_url);
    let pick = |explicit: &Option<String>, default: Option<&String>, what: &str| -> Result<String> {
        explicit
            .clone()
            .or_else(|| default.cloned())
            .ok_or_else(|| anyhow!("No {what} route for job kind '{kind}', pass --{what}-url"))
    };

    Ok(TaskEndpoints {
        submit: pick(&routes.submit_url, defaults.as_ref().map(|e| &e.submit), "submit")?,
        queue: pick(&routes.queue_url, defaults.as_ref().map(|e| &e.queue), "queue")?,
        result: pick(&routes.result_url, defaults.as_ref().map(|e| &e.result), "result")?,
    })
}

/// Options that print queue position and backend messages as they arrive
pub fn poll_options(
    kind: &JobKind,
    config: &ClientConfig,
    args: &PollArgs,
    console: Console,
) -> PollOptions {
    let mut options = PollOptions::for_kind(kind, config)
        .on_status(move |status| {
            let lane = if status.is_priority {
                " (priority lane)".yellow().to_string()
            } else {
                String::new()
            };
            match status.position {
                Some(position) => {
                    console.line(&format!("  {} queue position {}{}", "⏳".cyan(), position, lane))
                }
                None => console.line(&format!("  {} processing{}", "⏳".cyan(), lane)),
            }
        })
        .on_info(move |msg| console.line(&format!("  {} {}", "•".cyan(), msg.dimmed())));

    if let Some(ms) = args.interval_ms {
        options.interval = Duration::from_millis(ms);
    }
    if let Some(max) = args.max_attempts {
        options.max_attempts = max;
    }
    options
}

/// Poll a job, cancelling it on Ctrl-C
pub async fn follow(
    client: &AsyncTaskClient,
    job: &Job,
    options: PollOptions,
    console: Console,
) -> JobOutcome {
    console.info(&format!(
        "Following {} job {} submitted {} (every {:?}, up to {} polls)",
        job.kind(),
        job.id().bold(),
        job.submitted_at().format("%H:%M:%S"),
        options.interval,
        options.max_attempts
    ));
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // no handler, never interrupt
            std::future::pending::<()>().await;
        }
    };
    follow_until(client, job, options, interrupted).await
}

/// Poll a job until it resolves or `stop` completes, whichever comes first
pub async fn follow_until<F>(
    client: &AsyncTaskClient,
    job: &Job,
    options: PollOptions,
    stop: F,
) -> JobOutcome
where
    F: Future<Output = ()>,
{
    let token = options.cancel.clone().unwrap_or_default();
    let poll = client.poll(job, options.with_cancel(token.clone()));
    tokio::pin!(poll);
    tokio::pin!(stop);

    tokio::select! {
        biased;
        outcome = &mut poll => return outcome,
        _ = &mut stop => token.cancel(),
    }
    poll.await
}

/// Print counters when `--metrics` was given
pub fn print_metrics(client: &AsyncTaskClient, args: &PollArgs) {
    if args.metrics {
        eprint!("{}", client.metrics().to_prometheus());
    }
}

/// Print an outcome. Anything but success becomes an error exit.
pub fn report(outcome: JobOutcome, console: Console) -> Result<()> {
    match outcome {
        JobOutcome::Success { payload } => {
            if console.uses_stderr() {
                println!("{}", serde_json::to_string(&payload)?);
            } else {
                console.success("Job finished");
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            Ok(())
        }
        JobOutcome::Failure { reason } => {
            console.error(&format!("Job failed: {reason}"));
            bail!("job failed")
        }
        JobOutcome::TimedOut => {
            console.warning("Job did not finish in time, it may still complete on the backend");
            bail!("timed out")
        }
        JobOutcome::Cancelled => {
            console.warning("Stopped watching the job");
            bail!("cancelled")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use wba_tasks::{HttpReply, MockTransport};

    #[test]
    fn test_builtin_routes_need_no_overrides() {
        let config = ClientConfig::default();
        let endpoints =
            endpoints_for(&JobKind::ReviewAnalysis, &config, &RouteArgs::default()).unwrap();
        assert_eq!(endpoints.submit, "http://localhost:8000/api/analysis/reviews");
    }

    #[test]
    fn test_custom_kind_requires_routes() {
        let config = ClientConfig::default();
        let kind = JobKind::Custom("supply-plan".into());
        assert!(endpoints_for(&kind, &config, &RouteArgs::default()).is_err());

        let routes = RouteArgs {
            submit_url: Some("http://b/api/supply".into()),
            queue_url: Some("http://b/api/supply/queue".into()),
            result_url: Some("http://b/api/supply/result".into()),
        };
        let endpoints = endpoints_for(&kind, &config, &routes).unwrap();
        assert_eq!(endpoints.result_url("t"), "http://b/api/supply/result/t");
    }

    #[test]
    fn test_poll_args_override_kind_defaults() {
        let config = ClientConfig::default();
        let args = PollArgs {
            interval_ms: Some(250),
            max_attempts: None,
            metrics: false,
        };
        let options = poll_options(&JobKind::ContentGeneration, &config, &args, Console::new(false));
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.max_attempts, 120);
    }

    #[test]
    fn test_raw_output_keeps_stdout_for_payload() {
        assert!(Console::new(true).uses_stderr());
        assert!(!Console::new(false).uses_stderr());
    }

    fn pending_transport(job_id: &str) -> (Arc<MockTransport>, AsyncTaskClient, Job) {
        let transport = Arc::new(MockTransport::new());
        transport.reply(
            &format!("http://wb/result/{job_id}"),
            HttpReply::ok(json!({"status": "PENDING"})),
        );
        let client = AsyncTaskClient::new(transport.clone(), "http://wb");
        let endpoints = TaskEndpoints::new("http://wb/submit", "http://wb/queue", "http://wb/result");
        let job = Job::new(job_id, JobKind::ReviewAnalysis, endpoints, Default::default());
        (transport, client, job)
    }

    #[tokio::test]
    async fn test_immediate_interrupt_cancels() {
        let (_transport, client, job) = pending_transport("early");
        let options = PollOptions::new(Duration::from_secs(30), 5);

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            follow_until(&client, &job, options, async {}),
        )
        .await
        .expect("interrupt should end the poll");

        assert_eq!(outcome, JobOutcome::Cancelled);
        assert!(client.active_jobs().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_during_wait_cancels() {
        let (transport, client, job) = pending_transport("late");
        let options = PollOptions::new(Duration::from_secs(30), 5);
        let stop = tokio::time::sleep(Duration::from_millis(20));

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            follow_until(&client, &job, options, stop),
        )
        .await
        .expect("interrupt should end the poll");

        assert_eq!(outcome, JobOutcome::Cancelled);
        assert_eq!(transport.count("http://wb/result/late"), 1);
    }

    #[tokio::test]
    async fn test_resolution_without_interrupt() {
        let (transport, client, job) = pending_transport("done");
        transport.reply("http://wb/result/done", HttpReply::ok(json!({"status": "SUCCESS", "data": [1]})));
        let options = PollOptions::new(Duration::from_millis(5), 5);

        let outcome = follow_until(&client, &job, options, std::future::pending()).await;
        assert_eq!(outcome, JobOutcome::success(json!([1])));
    }
}
