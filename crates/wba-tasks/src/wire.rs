//! Interpretation of backend response bodies
//!
//! The backend speaks loosely-typed JSON: fields come and go between
//! releases and features, so bodies are read from `serde_json::Value`
//! field by field instead of through strict structs.

use serde_json::Value;

use crate::error::SubmissionError;
use crate::job::{JobOutcome, QueueUpdate};
use crate::transport::HttpReply;

/// Reason used when the backend reports failure without a message
pub const DEFAULT_FAILURE_REASON: &str = "task failed";
/// Reason used when the backend reports success without a payload
pub const EMPTY_RESULT_REASON: &str = "empty result";

/// What a submission call produced
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReply {
    /// Job accepted, poll `task_id`
    Accepted { task_id: String, queue: QueueUpdate },
    /// Backend answered synchronously
    Resolved(JobOutcome),
}

/// State reported by one result poll
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    Terminal(JobOutcome),
    Pending { info: Option<String> },
}

/// Non-null field lookup
fn field<'a>(body: &'a Value, name: &str) -> Option<&'a Value> {
    body.get(name).filter(|v| !v.is_null())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn task_id(body: &Value) -> Option<String> {
    match field(body, "task_id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn normalized_status(body: &Value) -> Option<String> {
    field(body, "status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_uppercase())
}

/// Queue fields shared by submit and queue-status bodies
pub fn queue_update(body: &Value) -> QueueUpdate {
    QueueUpdate {
        position: field(body, "position")
            .and_then(Value::as_u64)
            .map(|p| u32::try_from(p).unwrap_or(u32::MAX)),
        is_priority: field(body, "is_priority").and_then(Value::as_bool),
        queue: field(body, "queue").and_then(Value::as_str).map(str::to_string),
    }
}

/// Backend message of a rejected request: `detail`, then `error`, then `message`.
/// FastAPI validation errors arrive as a `detail` list of `{msg}` objects.
fn rejection_message(body: &Value) -> Option<String> {
    if let Some(Value::Array(items)) = field(body, "detail") {
        let joined = items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; ");
        if !joined.is_empty() {
            return Some(joined);
        }
    }
    ["detail", "error", "message"]
        .iter()
        .find_map(|name| field(body, name).and_then(text))
}

/// Interpret the reply to a submission
pub fn interpret_submit(reply: HttpReply) -> Result<SubmitReply, SubmissionError> {
    let status = reply.status;
    let success = reply.is_success();

    let Some(body) = reply.body else {
        return Err(if success {
            SubmissionError::InvalidResponse("empty or non-JSON body".to_string())
        } else {
            SubmissionError::Rejected {
                status,
                message: format!("HTTP {status}"),
            }
        });
    };

    if let Some(task_id) = task_id(&body) {
        return Ok(SubmitReply::Accepted {
            task_id,
            queue: queue_update(&body),
        });
    }

    if !success {
        return Err(SubmissionError::Rejected {
            status,
            message: rejection_message(&body).unwrap_or_else(|| format!("HTTP {status}")),
        });
    }

    match normalized_status(&body).as_deref() {
        Some("SUCCESS") => Ok(SubmitReply::Resolved(JobOutcome::success(body))),
        Some("ERROR") | Some("FAILURE") => Ok(SubmitReply::Resolved(JobOutcome::failure(
            rejection_message(&body).unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
        ))),
        _ => Err(SubmissionError::MissingHandle),
    }
}

/// Interpret a queue-status reply. `None` means no update this poll.
pub fn interpret_queue(reply: HttpReply) -> Option<QueueUpdate> {
    if !reply.is_success() {
        return None;
    }
    let body = reply.body?;
    body.is_object().then(|| queue_update(&body))
}

/// Interpret a result reply. `None` means not ready (bad status or body).
pub fn interpret_result(reply: HttpReply) -> Option<ResultState> {
    if !reply.is_success() {
        return None;
    }
    let body = reply.body?;
    if !body.is_object() {
        return None;
    }

    let state = match normalized_status(&body).as_deref() {
        Some("SUCCESS") => {
            let payload = field(&body, "data").or_else(|| field(&body, "result"));
            ResultState::Terminal(match payload {
                Some(payload) => JobOutcome::success(payload.clone()),
                None => JobOutcome::failure(EMPTY_RESULT_REASON),
            })
        }
        Some("FAILURE") | Some("REVOKED") => {
            let reason = field(&body, "error")
                .and_then(text)
                .or_else(|| {
                    field(&body, "result")
                        .and_then(|r| field(r, "error"))
                        .and_then(text)
                })
                .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
            ResultState::Terminal(JobOutcome::failure(reason))
        }
        _ => ResultState::Pending {
            info: field(&body, "info").and_then(text),
        },
    };
    Some(state)
}
