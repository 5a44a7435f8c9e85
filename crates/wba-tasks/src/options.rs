//! Polling options

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::job::QueueStatus;
use crate::routes::JobKind;

/// Callback receiving each merged queue snapshot
pub type StatusCallback = Arc<dyn Fn(&QueueStatus) + Send + Sync>;
/// Callback receiving informational messages from pending results
pub type InfoCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// How a job is observed until it resolves
#[derive(Clone)]
pub struct PollOptions {
    /// Wait between iterations
    pub interval: Duration,
    /// Maximum number of result fetches
    pub max_attempts: u32,
    pub on_status: Option<StatusCallback>,
    pub on_info: Option<InfoCallback>,
    /// Cooperative cancellation, checked every iteration and during waits
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_attempts: 60,
            on_status: None,
            on_info: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .field("on_status", &self.on_status.is_some())
            .field("on_info", &self.on_info.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl PollOptions {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            ..Default::default()
        }
    }

    /// Cadence for a job kind, with configured overrides applied
    pub fn for_kind(kind: &JobKind, config: &ClientConfig) -> Self {
        Self::new(
            config.poll_interval.unwrap_or_else(|| kind.default_interval()),
            config
                .max_attempts
                .unwrap_or_else(|| kind.default_max_attempts()),
        )
    }

    pub fn on_status<F>(mut self, callback: F) -> Self
    where
        F: Fn(&QueueStatus) + Send + Sync + 'static,
    {
        self.on_status = Some(Arc::new(callback));
        self
    }

    pub fn on_info<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_info = Some(Arc::new(callback));
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_applies_overrides() {
        let config = ClientConfig::default();
        let options = PollOptions::for_kind(&JobKind::KeywordClustering, &config);
        assert_eq!(options.interval, Duration::from_millis(2000));
        assert_eq!(options.max_attempts, 90);

        let config = ClientConfig {
            max_attempts: Some(5),
            ..Default::default()
        };
        let options = PollOptions::for_kind(&JobKind::ReviewAnalysis, &config);
        assert_eq!(options.interval, Duration::from_millis(3000));
        assert_eq!(options.max_attempts, 5);
    }
}
