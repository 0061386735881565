//! EDI → JEDI translation.

use super::client::{read_json, ServiceError};
use super::Translate;
use crate::config::StediConfig;
use crate::document::IntermediateDocument;
use async_trait::async_trait;
use serde::Serialize;

/// Body of a translate request.
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub input_format: &'a str,
    pub input: &'a str,
    pub output_format: &'a str,
}

/// HTTP client for the translation endpoint.
#[derive(Debug, Clone)]
pub struct TranslateClient {
    http: reqwest::Client,
    url: String,
    input_format: String,
    output_format: String,
}

impl TranslateClient {
    /// Create a client sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client, config: &StediConfig) -> Self {
        Self {
            http,
            url: config.translate_url.clone(),
            input_format: config.input_format.clone(),
            output_format: config.output_format.clone(),
        }
    }

    fn request<'a>(&'a self, edi: &'a str) -> TranslateRequest<'a> {
        TranslateRequest {
            input_format: &self.input_format,
            input: edi,
            output_format: &self.output_format,
        }
    }
}

#[async_trait]
impl Translate for TranslateClient {
    #[tracing::instrument(skip_all, fields(url = %self.url, bytes = edi.len()))]
    async fn translate(&self, edi: &str) -> Result<IntermediateDocument, ServiceError> {
        let res = self.http.post(&self.url).json(&self.request(edi)).send().await?;
        let jedi = read_json(res).await?;

        tracing::info!(
            "/translate response: {}",
            serde_json::to_string_pretty(&jedi).unwrap_or_default()
        );

        Ok(IntermediateDocument(jedi))
    }
}
