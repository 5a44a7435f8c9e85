//! Client-side task metrics

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::job::JobOutcome;

/// Counters shared by every poll running on one client
#[derive(Debug, Default)]
pub struct TaskMetrics {
    pub submissions: AtomicU64,
    pub submission_errors: AtomicU64,
    /// Submissions answered synchronously
    pub immediate: AtomicU64,
    pub status_polls: AtomicU64,
    pub result_polls: AtomicU64,
    /// Swallowed transport/parse errors while polling
    pub transient_errors: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub timed_out: AtomicU64,
    pub cancelled: AtomicU64,
}

impl TaskMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submission(&self, error: bool) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        if error {
            self.submission_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_immediate(&self) {
        self.immediate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_poll(&self, error: bool) {
        self.status_polls.fetch_add(1, Ordering::Relaxed);
        if error {
            self.transient_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_result_poll(&self, error: bool) {
        self.result_polls.fetch_add(1, Ordering::Relaxed);
        if error {
            self.transient_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_outcome(&self, outcome: &JobOutcome) {
        let counter = match outcome {
            JobOutcome::Success { .. } => &self.succeeded,
            JobOutcome::Failure { .. } => &self.failed,
            JobOutcome::TimedOut => &self.timed_out,
            JobOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TaskMetricsSnapshot {
        TaskMetricsSnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            submission_errors: self.submission_errors.load(Ordering::Relaxed),
            immediate: self.immediate.load(Ordering::Relaxed),
            status_polls: self.status_polls.load(Ordering::Relaxed),
            result_polls: self.result_polls.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetricsSnapshot {
    pub submissions: u64,
    pub submission_errors: u64,
    pub immediate: u64,
    pub status_polls: u64,
    pub result_polls: u64,
    pub transient_errors: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
}

impl TaskMetricsSnapshot {
    /// Jobs that reached any terminal outcome through polling
    pub fn resolved(&self) -> u64 {
        self.succeeded + self.failed + self.timed_out + self.cancelled
    }

    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        let counters = [
            ("wba_task_submissions_total", "Job submissions sent", self.submissions),
            ("wba_task_submission_errors_total", "Job submissions that failed", self.submission_errors),
            ("wba_task_immediate_total", "Submissions resolved without polling", self.immediate),
            ("wba_task_status_polls_total", "Queue status requests", self.status_polls),
            ("wba_task_result_polls_total", "Result requests", self.result_polls),
            ("wba_task_transient_errors_total", "Swallowed polling errors", self.transient_errors),
        ];
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {name} {help}\n"));
            output.push_str(&format!("# TYPE {name} counter\n"));
            output.push_str(&format!("{name} {value}\n"));
        }

        output.push_str("# HELP wba_task_outcomes_total Terminal outcomes by kind\n");
        output.push_str("# TYPE wba_task_outcomes_total counter\n");
        for (label, value) in [
            ("success", self.succeeded),
            ("failure", self.failed),
            ("timed_out", self.timed_out),
            ("cancelled", self.cancelled),
        ] {
            output.push_str(&format!(
                "wba_task_outcomes_total{{outcome=\"{label}\"}} {value}\n"
            ));
        }

        output
    }
}
