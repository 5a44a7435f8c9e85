//! Submit-then-poll client for backend jobs

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::auth::AuthHeaders;
use crate::config::ClientConfig;
use crate::error::SubmissionError;
use crate::http::HttpTransport;
use crate::job::{Job, JobId, JobOutcome, QueueStatus};
use crate::metrics::{TaskMetrics, TaskMetricsSnapshot};
use crate::options::PollOptions;
use crate::routes::{JobKind, TaskEndpoints};
use crate::transport::{TaskTransport, TransportError};
use crate::wire::{self, ResultState, SubmitReply};

/// A job submission: what to run and where
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub kind: JobKind,
    pub endpoints: TaskEndpoints,
    pub body: Value,
}

impl TaskRequest {
    pub fn new(kind: JobKind, endpoints: TaskEndpoints, body: Value) -> Self {
        Self {
            kind,
            endpoints,
            body,
        }
    }
}

/// Result of a submission
#[derive(Debug, Clone)]
pub enum Submission {
    /// Backend queued the work, poll the job
    Accepted(Job),
    /// Backend answered synchronously, nothing to poll
    Resolved(JobOutcome),
}

/// Cancellation tokens of in-flight polls, keyed by job id
#[derive(Debug, Default)]
struct ActivePolls {
    next_ticket: AtomicU64,
    tokens: Mutex<HashMap<JobId, Vec<(u64, CancellationToken)>>>,
}

impl ActivePolls {
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Vec<(u64, CancellationToken)>>> {
        // entries stay consistent even if a holder panicked
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, job_id: &str, token: CancellationToken) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .entry(job_id.to_string())
            .or_default()
            .push((ticket, token));
        ticket
    }

    fn release(&self, job_id: &str, ticket: u64) {
        let mut tokens = self.lock();
        if let Some(entries) = tokens.get_mut(job_id) {
            entries.retain(|(t, _)| *t != ticket);
            if entries.is_empty() {
                tokens.remove(job_id);
            }
        }
    }

    fn cancel(&self, job_id: &str) -> bool {
        match self.lock().get(job_id) {
            Some(entries) => {
                for (_, token) in entries {
                    token.cancel();
                }
                !entries.is_empty()
            }
            None => false,
        }
    }

    fn ids(&self) -> Vec<JobId> {
        self.lock().keys().cloned().collect()
    }
}

/// Removes a poll's registration however the poll ends
struct Registration<'a> {
    active: &'a ActivePolls,
    job_id: &'a str,
    ticket: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.active.release(self.job_id, self.ticket);
    }
}

/// Client for long-running backend jobs (review analysis, clustering, SEO generation)
///
/// Each `poll` owns its loop state. The client itself only holds the
/// transport, shared counters and the cancellation registry, so one
/// instance can drive many concurrent jobs behind an `Arc`.
#[derive(Debug)]
pub struct AsyncTaskClient {
    transport: Arc<dyn TaskTransport>,
    base_url: String,
    metrics: TaskMetrics,
    active: ActivePolls,
}

impl AsyncTaskClient {
    /// Create a client over any transport
    pub fn new(transport: Arc<dyn TaskTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            metrics: TaskMetrics::new(),
            active: ActivePolls::default(),
        }
    }

    /// Create an HTTP client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.http_timeout)?;
        Ok(Self::new(Arc::new(transport), config.base_url.clone()))
    }

    pub fn metrics(&self) -> TaskMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Ids of jobs with a poll in flight
    pub fn active_jobs(&self) -> Vec<JobId> {
        self.active.ids()
    }

    /// Build a request for a built-in job kind against the configured base URL
    pub fn request(&self, kind: JobKind, body: Value) -> Result<TaskRequest, SubmissionError> {
        let endpoints = kind
            .endpoints(&self.base_url)
            .ok_or_else(|| SubmissionError::NoRoute(kind.to_string()))?;
        Ok(TaskRequest::new(kind, endpoints, body))
    }

    /// Submit one job. Performs exactly one network call.
    pub async fn submit(
        &self,
        request: &TaskRequest,
        headers: &AuthHeaders,
    ) -> Result<Submission, SubmissionError> {
        let result = self
            .transport
            .post_json(&request.endpoints.submit, &request.body, headers)
            .await
            .map_err(SubmissionError::from)
            .and_then(wire::interpret_submit);
        self.metrics.record_submission(result.is_err());

        match result {
            Ok(SubmitReply::Accepted { task_id, queue }) => {
                let mut initial = QueueStatus::default();
                initial.merge(queue);
                info!(
                    job_id = %task_id,
                    kind = %request.kind,
                    transport = self.transport.name(),
                    position = ?initial.position,
                    priority = initial.is_priority,
                    "Job accepted"
                );
                let job = Job::new(
                    task_id,
                    request.kind.clone(),
                    request.endpoints.clone(),
                    headers.clone(),
                )
                .with_initial_status(initial);
                Ok(Submission::Accepted(job))
            }
            Ok(SubmitReply::Resolved(outcome)) => {
                self.metrics.record_immediate();
                info!(kind = %request.kind, outcome = outcome.label(), "Job resolved on submission");
                Ok(Submission::Resolved(outcome))
            }
            Err(e) => {
                warn!(
                    kind = %request.kind,
                    transport = self.transport.name(),
                    error = %e,
                    "Job submission failed"
                );
                Err(e)
            }
        }
    }

    /// Poll a submitted job until it resolves. Produces exactly one outcome.
    pub async fn poll(&self, job: &Job, options: PollOptions) -> JobOutcome {
        let token = options.cancel.clone().unwrap_or_default();
        let _registration = Registration {
            active: &self.active,
            job_id: job.id(),
            ticket: self.active.register(job.id(), token.clone()),
        };

        let span = tracing::info_span!("poll", job_id = %job.id(), kind = %job.kind());
        let start = Instant::now();
        let (outcome, attempts) = self.observe(job, &options, &token).instrument(span).await;
        self.metrics.record_outcome(&outcome);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            JobOutcome::TimedOut => warn!(
                job_id = %job.id(),
                attempts,
                elapsed_ms,
                "Job did not finish within the attempt budget"
            ),
            other => info!(
                job_id = %job.id(),
                outcome = other.label(),
                attempts,
                elapsed_ms,
                "Job resolved"
            ),
        }
        outcome
    }

    /// Submit and poll. Synchronous backend answers skip polling.
    pub async fn run(
        &self,
        request: &TaskRequest,
        headers: &AuthHeaders,
        options: PollOptions,
    ) -> Result<JobOutcome, SubmissionError> {
        match self.submit(request, headers).await? {
            Submission::Resolved(outcome) => Ok(outcome),
            Submission::Accepted(job) => Ok(self.poll(&job, options).await),
        }
    }

    /// `run` for a built-in job kind
    pub async fn run_kind(
        &self,
        kind: JobKind,
        body: Value,
        headers: &AuthHeaders,
        options: PollOptions,
    ) -> Result<JobOutcome, SubmissionError> {
        let request = self.request(kind, body)?;
        self.run(&request, headers, options).await
    }

    /// Stop observing a job. Returns whether an in-flight poll was signalled.
    ///
    /// Idempotent, and a no-op once the poll has resolved. The backend job
    /// itself keeps running.
    pub fn cancel(&self, job_id: &str) -> bool {
        let signalled = self.active.cancel(job_id);
        if signalled {
            debug!(job_id, "Cancellation requested");
        }
        signalled
    }

    /// The polling loop. Returns the outcome and the number of result fetches.
    async fn observe(
        &self,
        job: &Job,
        options: &PollOptions,
        token: &CancellationToken,
    ) -> (JobOutcome, u32) {
        let mut status = job.initial_status().clone();
        if status != QueueStatus::default() && !token.is_cancelled() {
            if let Some(on_status) = &options.on_status {
                on_status(&status);
            }
        }

        let queue_url = job.queue_url();
        let result_url = job.result_url();
        let mut fetched = 0;

        for attempt in 1..=options.max_attempts {
            if token.is_cancelled() {
                return (JobOutcome::Cancelled, fetched);
            }

            // Queue position is best effort
            let update = match self.transport.get_json(&queue_url, job.headers()).await {
                Ok(reply) => wire::interpret_queue(reply),
                Err(e) => {
                    debug!(attempt, error = %e, "Queue status request failed");
                    None
                }
            };
            self.metrics.record_status_poll(update.is_none());
            if token.is_cancelled() {
                return (JobOutcome::Cancelled, fetched);
            }
            if let Some(update) = update.filter(|u| !u.is_empty()) {
                status.merge(update);
                if let Some(on_status) = &options.on_status {
                    on_status(&status);
                }
            }

            let reply = self.transport.get_json(&result_url, job.headers()).await;
            fetched = attempt;
            if token.is_cancelled() {
                return (JobOutcome::Cancelled, fetched);
            }
            let state = match reply {
                Ok(reply) => wire::interpret_result(reply),
                Err(e) => {
                    debug!(attempt, error = %e, "Result request failed");
                    None
                }
            };
            self.metrics.record_result_poll(state.is_none());

            match state {
                Some(ResultState::Terminal(outcome)) => return (outcome, fetched),
                Some(ResultState::Pending { info }) => {
                    debug!(attempt, position = ?status.position, "Job still pending");
                    if let (Some(info), Some(on_info)) = (info, &options.on_info) {
                        on_info(info.as_str());
                    }
                }
                None => debug!(attempt, "Result not ready"),
            }

            if attempt < options.max_attempts {
                tokio::select! {
                    _ = token.cancelled() => return (JobOutcome::Cancelled, fetched),
                    _ = tokio::time::sleep(options.interval) => {}
                }
            }
        }

        (JobOutcome::TimedOut, fetched)
    }
}
