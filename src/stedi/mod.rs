//! Clients for the external translation and mapping services.

mod client;
mod mapping;
mod translate;

pub use client::{build_http_client, http_client_builder, ServiceError};
pub use mapping::MappingClient;
pub use translate::{TranslateClient, TranslateRequest};

use crate::document::{IntermediateDocument, OutputDocument};
use async_trait::async_trait;

/// Converts raw EDI text into an intermediate document.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, edi: &str) -> Result<IntermediateDocument, ServiceError>;
}

/// Applies a mapping to an intermediate document.
#[async_trait]
pub trait Map: Send + Sync {
    async fn map(&self, document: &IntermediateDocument) -> Result<OutputDocument, ServiceError>;
}
