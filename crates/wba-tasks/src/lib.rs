//! # WBA Tasks
//!
//! Async task-polling client for the WB seller-analytics backend.
//!
//! Long-running features (review analysis, keyword clustering, SEO content
//! generation) are submitted as backend jobs, then polled for queue position
//! and result until they reach exactly one terminal outcome.
//!
//! ## Job kinds
//!
//! | Kind | Submit route | Default cadence |
//! |------|--------------|-----------------|
//! | `review-analysis` | `/api/analysis/reviews` | 3 s × 60 |
//! | `keyword-clustering` | `/api/seo/clusters` | 2 s × 90 |
//! | `content-generation` | `/api/seo/generate` | 3 s × 120 |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wba_tasks::{AsyncTaskClient, ClientConfig, JobKind, JobOutcome, PollOptions};
//!
//! let config = ClientConfig::from_env();
//! let client = AsyncTaskClient::from_config(&config)?;
//!
//! let kind = JobKind::ReviewAnalysis;
//! let options = PollOptions::for_kind(&kind, &config)
//!     .on_status(|s| println!("position {:?}", s.position));
//!
//! match client
//!     .run_kind(kind, serde_json::json!({"nm_id": 123456}), &config.auth_headers(), options)
//!     .await?
//! {
//!     JobOutcome::Success { payload } => println!("{payload}"),
//!     other => println!("{}", other.label()),
//! }
//! ```
//!
//! ## Testing
//!
//! ```rust
//! use std::sync::Arc;
//! use wba_tasks::{AsyncTaskClient, HttpReply, MockTransport};
//!
//! let mock = Arc::new(MockTransport::new());
//! mock.reply(
//!     "http://wb/api/seo/result/t1",
//!     HttpReply::ok(serde_json::json!({"status": "SUCCESS", "data": []})),
//! );
//! let client = AsyncTaskClient::new(mock, "http://wb");
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod job;
pub mod metrics;
pub mod mock;
pub mod options;
pub mod routes;
pub mod transport;
pub mod wire;

pub use auth::{AuthHeaders, TELEGRAM_INIT_DATA_HEADER};
pub use client::{AsyncTaskClient, Submission, TaskRequest};
pub use config::{ClientConfig, ConfigError};
pub use error::SubmissionError;
pub use http::HttpTransport;
pub use job::{Job, JobId, JobOutcome, QueueStatus, QueueUpdate};
pub use metrics::{TaskMetrics, TaskMetricsSnapshot};
pub use mock::MockTransport;
pub use options::PollOptions;
pub use routes::{JobKind, TaskEndpoints};
pub use transport::{HttpReply, TaskTransport, TransportError};
pub use tokio_util::sync::CancellationToken;
