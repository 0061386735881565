//! Structured invocation responses.

use super::{InvocationMetrics, PipelineError, Stage, StoredArtifact};
use serde::Serialize;
use serde_json::json;

pub const SUCCESS_MESSAGE: &str = "Inbound EDI pipeline succeeded";

/// Result of one successful run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The mapped document was uploaded.
    Stored {
        artifact: StoredArtifact,
        metrics: InvocationMetrics,
    },

    /// The event was ignored without calling any collaborator.
    Skipped { reason: String },
}

/// Response returned to the invoking platform.
///
/// `body` is a JSON string, matching what event-driven hosts expect from a
/// function handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn from_outcome(outcome: &Outcome) -> Self {
        let body = match outcome {
            Outcome::Stored { artifact, metrics } => json!({
                "message": SUCCESS_MESSAGE,
                "result": artifact,
                "metrics": metrics,
            }),
            Outcome::Skipped { reason } => json!({
                "message": "skipped",
                "reason": reason,
            }),
        };

        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    pub fn from_error(err: &PipelineError) -> Self {
        let stage: Stage = err.stage();
        let body = json!({
            "message": err.to_string(),
            "stage": stage,
            "retryable": err.is_retryable(),
        });

        Self {
            status_code: 500,
            body: body.to_string(),
        }
    }

    /// Parse the body back into JSON.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

impl From<Result<Outcome, PipelineError>> for InvocationResponse {
    fn from(result: Result<Outcome, PipelineError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(&outcome),
            Err(err) => Self::from_error(&err),
        }
    }
}
