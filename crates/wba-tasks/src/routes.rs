//! Job kinds and the backend routes serving them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Operation requested from the backend. Used for routing and labeling only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum JobKind {
    /// AI analysis of product reviews
    ReviewAnalysis,
    /// Search keyword clustering
    KeywordClustering,
    /// SEO card content generation
    ContentGeneration,
    /// Anything else, routed through explicit `TaskEndpoints`
    Custom(String),
}

impl JobKind {
    /// Built-in kinds with known routes
    pub fn builtin() -> [JobKind; 3] {
        [
            JobKind::ReviewAnalysis,
            JobKind::KeywordClustering,
            JobKind::ContentGeneration,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobKind::ReviewAnalysis => "review-analysis",
            JobKind::KeywordClustering => "keyword-clustering",
            JobKind::ContentGeneration => "content-generation",
            JobKind::Custom(label) => label,
        }
    }

    /// Routes relative to the API base, `None` for custom kinds
    fn paths(&self) -> Option<(&'static str, &'static str, &'static str)> {
        match self {
            JobKind::ReviewAnalysis => Some((
                "/api/analysis/reviews",
                "/api/analysis/queue",
                "/api/analysis/result",
            )),
            JobKind::KeywordClustering => {
                Some(("/api/seo/clusters", "/api/seo/queue", "/api/seo/result"))
            }
            JobKind::ContentGeneration => {
                Some(("/api/seo/generate", "/api/seo/queue", "/api/seo/result"))
            }
            JobKind::Custom(_) => None,
        }
    }

    /// Resolve endpoints against an API base URL
    pub fn endpoints(&self, base_url: &str) -> Option<TaskEndpoints> {
        let base = base_url.trim_end_matches('/');
        self.paths().map(|(submit, queue, result)| TaskEndpoints {
            submit: format!("{base}{submit}"),
            queue: format!("{base}{queue}"),
            result: format!("{base}{result}"),
        })
    }

    /// Polling cadence the feature screens use for this kind
    pub fn default_interval(&self) -> Duration {
        match self {
            JobKind::KeywordClustering => Duration::from_millis(2000),
            _ => Duration::from_millis(3000),
        }
    }

    pub fn default_max_attempts(&self) -> u32 {
        match self {
            JobKind::ReviewAnalysis => 60,
            JobKind::KeywordClustering => 90,
            JobKind::ContentGeneration => 120,
            JobKind::Custom(_) => 60,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "review-analysis" | "reviews" => JobKind::ReviewAnalysis,
            "keyword-clustering" | "clustering" => JobKind::KeywordClustering,
            "content-generation" | "seo" => JobKind::ContentGeneration,
            other => JobKind::Custom(other.to_string()),
        })
    }
}

impl From<String> for JobKind {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<JobKind> for String {
    fn from(kind: JobKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Where to submit a job and where to observe it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEndpoints {
    /// `POST` target for submission
    pub submit: String,
    /// Queue status prefix, the task id is appended
    pub queue: String,
    /// Result prefix, the task id is appended
    pub result: String,
}

impl TaskEndpoints {
    pub fn new(
        submit: impl Into<String>,
        queue: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            submit: submit.into(),
            queue: queue.into(),
            result: result.into(),
        }
    }

    pub fn queue_url(&self, task_id: &str) -> String {
        format!("{}/{}", self.queue.trim_end_matches('/'), task_id)
    }

    pub fn result_url(&self, task_id: &str) -> String {
        format!("{}/{}", self.result.trim_end_matches('/'), task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_round_trip() {
        for kind in JobKind::builtin() {
            let parsed: JobKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        let custom: JobKind = "Stock-Forecast".parse().unwrap();
        assert_eq!(custom, JobKind::Custom("stock-forecast".to_string()));
    }

    #[test]
    fn test_endpoints_resolution() {
        let endpoints = JobKind::KeywordClustering
            .endpoints("https://api.example.com/")
            .unwrap();
        assert_eq!(endpoints.submit, "https://api.example.com/api/seo/clusters");
        assert_eq!(
            endpoints.queue_url("abc"),
            "https://api.example.com/api/seo/queue/abc"
        );
        assert_eq!(
            endpoints.result_url("abc"),
            "https://api.example.com/api/seo/result/abc"
        );
        assert!(JobKind::Custom("x".into()).endpoints("http://h").is_none());
    }

    #[test]
    fn test_default_cadence() {
        assert_eq!(
            JobKind::KeywordClustering.default_interval(),
            Duration::from_millis(2000)
        );
        assert_eq!(JobKind::ContentGeneration.default_max_attempts(), 120);
    }
}
