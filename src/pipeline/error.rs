//! Typed failures for each pipeline stage.

use crate::event::EventError;
use crate::stedi::ServiceError;
use serde::Serialize;

/// Pipeline stage names, as reported in failure responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Event,
    Fetch,
    Translate,
    Map,
    Store,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Event => "event",
            Stage::Fetch => "fetch",
            Stage::Translate => "translate",
            Stage::Map => "map",
            Stage::Store => "store",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid event: {0}")]
    Event(#[from] EventError),

    #[error("no store for bucket '{bucket}': {source}")]
    Resolve {
        bucket: String,
        #[source]
        source: object_store::Error,
    },

    #[error("failed to fetch s3://{bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("object s3://{bucket}/{key} is not valid UTF-8 text")]
    Payload { bucket: String, key: String },

    #[error("translate failed: {0}")]
    Translate(#[source] ServiceError),

    #[error("map failed: {0}")]
    Map(#[source] ServiceError),

    #[error("mapped document has no usable '{field}' field")]
    MissingIdentifier { field: String },

    #[error("invalid artifact key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("failed to serialize mapped document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to store s3://{bucket}/{key}: {source}")]
    Store {
        bucket: String,
        key: String,
        #[source]
        source: object_store::Error,
    },
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Event(_) => Stage::Event,
            PipelineError::Resolve { .. }
            | PipelineError::Fetch { .. }
            | PipelineError::Payload { .. } => Stage::Fetch,
            PipelineError::Translate(_) => Stage::Translate,
            PipelineError::Map(_) => Stage::Map,
            PipelineError::MissingIdentifier { .. }
            | PipelineError::InvalidKey { .. }
            | PipelineError::Serialize(_)
            | PipelineError::Store { .. } => Stage::Store,
        }
    }

    /// Whether re-delivering the same event could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Fetch { source, .. } | PipelineError::Store { source, .. } => {
                store_error_is_retryable(source)
            }
            PipelineError::Translate(e) | PipelineError::Map(e) => e.is_retryable(),
            PipelineError::Event(_)
            | PipelineError::Resolve { .. }
            | PipelineError::Payload { .. }
            | PipelineError::MissingIdentifier { .. }
            | PipelineError::InvalidKey { .. }
            | PipelineError::Serialize(_) => false,
        }
    }
}

fn store_error_is_retryable(err: &object_store::Error) -> bool {
    !matches!(
        err,
        object_store::Error::NotFound { .. }
            | object_store::Error::InvalidPath { .. }
            | object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. }
            | object_store::Error::NotSupported { .. }
            | object_store::Error::NotImplemented { .. }
            | object_store::Error::AlreadyExists { .. }
            | object_store::Error::Precondition { .. }
            | object_store::Error::NotModified { .. }
            | object_store::Error::UnknownConfigurationKey { .. }
    )
}
