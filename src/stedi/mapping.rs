//! JEDI → target schema mapping.

use super::client::{read_json, ServiceError};
use super::Map;
use crate::config::StediConfig;
use crate::document::{IntermediateDocument, OutputDocument};
use async_trait::async_trait;

/// HTTP client for a single configured mapping.
#[derive(Debug, Clone)]
pub struct MappingClient {
    http: reqwest::Client,
    base_url: String,
    mapping_id: String,
}

impl MappingClient {
    /// Create a client sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client, config: &StediConfig) -> Self {
        Self {
            http,
            base_url: config.mappings_base_url.trim_end_matches('/').to_string(),
            mapping_id: config.mapping_id.trim().to_string(),
        }
    }

    /// Endpoint for the configured mapping.
    ///
    /// The id becomes a single path segment, so only `[A-Za-z0-9_-]` is accepted.
    pub fn map_url(&self) -> Result<String, ServiceError> {
        if self.mapping_id.is_empty() {
            return Err(ServiceError::Config("mapping id is not set".to_string()));
        }
        if !self
            .mapping_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ServiceError::Config(format!(
                "mapping id '{}' may only contain letters, digits, '_' and '-'",
                self.mapping_id
            )));
        }
        Ok(format!("{}/{}/map", self.base_url, self.mapping_id))
    }
}

#[async_trait]
impl Map for MappingClient {
    #[tracing::instrument(skip_all, fields(mapping_id = %self.mapping_id))]
    async fn map(&self, document: &IntermediateDocument) -> Result<OutputDocument, ServiceError> {
        let url = self.map_url()?;
        let res = self.http.post(&url).json(document).send().await?;
        let mapped = read_json(res).await?;

        tracing::info!(
            "/map response: {}",
            serde_json::to_string_pretty(&mapped).unwrap_or_default()
        );

        Ok(OutputDocument(mapped))
    }
}
