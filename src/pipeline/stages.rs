//! The four-stage inbound pipeline.
//!
//! ```text
//! ┌─────────┐     ┌───────────┐     ┌─────────┐     ┌─────────┐
//! │  Fetch  │────▶│ Translate │────▶│   Map   │────▶│  Store  │
//! │ (S3 get)│     │ EDI→JEDI  │     │JEDI→PO  │     │ (S3 put)│
//! └─────────┘     └───────────┘     └─────────┘     └─────────┘
//! ```
//!
//! Stages run strictly in sequence. Each returns a `Result` and the first
//! failure ends the invocation, so later stages never see invalid input.

use crate::config::{Config, OutputConfig};
use crate::document::{IntermediateDocument, OutputDocument, RawPayload};
use crate::event::{InboundEvent, ObjectRef};
use crate::io::{self, BucketStore, StoreResolver};
use crate::pipeline::{
    InvocationMetrics, InvocationResponse, KeyGenerator, Outcome, PipelineError, Stage,
    StoredArtifact,
};
use crate::stedi::{build_http_client, Map, MappingClient, Translate, TranslateClient};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

const ARTIFACT_CONTENT_TYPE: &str = "application/json";

/// Pipeline orchestrator. One instance serves any number of independent invocations.
pub struct Pipeline {
    stores: Arc<dyn StoreResolver>,
    translator: Arc<dyn Translate>,
    mapper: Arc<dyn Map>,
    keys: KeyGenerator,
    skip_own_artifacts: bool,
}

impl Pipeline {
    /// Create a pipeline from explicit collaborators.
    pub fn new(
        stores: Arc<dyn StoreResolver>,
        translator: Arc<dyn Translate>,
        mapper: Arc<dyn Map>,
        output: &OutputConfig,
    ) -> Self {
        Self {
            stores,
            translator,
            mapper,
            keys: KeyGenerator::new(output),
            skip_own_artifacts: output.skip_own_artifacts,
        }
    }

    /// Create a pipeline backed by the real object store and HTTP services.
    pub fn from_config(config: &Config) -> Result<Self> {
        let stores = io::create_store_resolver(&config.storage)?;
        let http = build_http_client(&config.stedi).context("Failed to build HTTP client")?;

        let translator = Arc::new(TranslateClient::with_client(http.clone(), &config.stedi));
        let mapper = Arc::new(MappingClient::with_client(http, &config.stedi));

        Ok(Self::new(stores, translator, mapper, &config.output))
    }

    /// Handle one event, converting every failure into a 500 response.
    pub async fn handle(&self, event: &InboundEvent) -> InvocationResponse {
        tracing::info!("Event: {}", serde_json::to_string(event).unwrap_or_default());

        let result = self.run(event).await;
        match &result {
            Ok(Outcome::Stored { artifact, metrics }) => {
                tracing::info!("Stored {} ({})", artifact.url, metrics);
            }
            Ok(Outcome::Skipped { reason }) => {
                tracing::info!("Skipped event: {}", reason);
            }
            Err(e) => {
                tracing::error!(
                    stage = %e.stage(),
                    retryable = e.is_retryable(),
                    "Pipeline failed: {}",
                    e
                );
            }
        }

        InvocationResponse::from(result)
    }

    /// Run all stages for one event.
    pub async fn run(&self, event: &InboundEvent) -> Result<Outcome, PipelineError> {
        let object = event.object_ref()?;

        if self.skip_own_artifacts && self.keys.is_artifact_key(&object.key) {
            return Ok(Outcome::Skipped {
                reason: format!("{} is under the artifact prefix '{}/'", object, self.keys.prefix()),
            });
        }

        let mut metrics = InvocationMetrics::new();

        // 1. Fetch the object that triggered the event
        let start = Instant::now();
        let store = self
            .stores
            .resolve(&object.bucket)
            .map_err(|source| PipelineError::Resolve {
                bucket: object.bucket.clone(),
                source,
            })?;
        let payload = self.fetch(&store, &object).await?;
        metrics.finish_stage(Stage::Fetch, start);
        metrics.add_bytes_fetched(payload.len() as u64);

        let edi = payload.as_text().map_err(|_| PipelineError::Payload {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
        })?;

        // 2. EDI -> intermediate document
        let start = Instant::now();
        let intermediate = self.translate(edi).await?;
        metrics.finish_stage(Stage::Translate, start);

        // 3. Intermediate document -> target schema
        let start = Instant::now();
        let mapped = self.map(&intermediate).await?;
        metrics.finish_stage(Stage::Map, start);

        // 4. Upload under a derived key
        let start = Instant::now();
        let artifact = self.store(&store, &object.bucket, &mapped).await?;
        metrics.finish_stage(Stage::Store, start);
        metrics.add_bytes_stored(artifact.size);

        Ok(Outcome::Stored { artifact, metrics })
    }

    #[tracing::instrument(skip_all, fields(object = %object))]
    async fn fetch(&self, store: &BucketStore, object: &ObjectRef) -> Result<RawPayload, PipelineError> {
        let bytes = store.get(&object.key).await.map_err(|source| PipelineError::Fetch {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            source,
        })?;

        tracing::info!("Fetched {} bytes", bytes.len());
        Ok(RawPayload::new(bytes))
    }

    #[tracing::instrument(skip_all)]
    async fn translate(&self, edi: &str) -> Result<IntermediateDocument, PipelineError> {
        self.translator
            .translate(edi)
            .await
            .map_err(PipelineError::Translate)
    }

    #[tracing::instrument(skip_all)]
    async fn map(&self, document: &IntermediateDocument) -> Result<OutputDocument, PipelineError> {
        self.mapper.map(document).await.map_err(PipelineError::Map)
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket))]
    async fn store(
        &self,
        store: &BucketStore,
        bucket: &str,
        document: &OutputDocument,
    ) -> Result<StoredArtifact, PipelineError> {
        let key = self.keys.generate(document)?;
        io::parse_key(&key).map_err(|source| PipelineError::InvalidKey {
            key: key.clone(),
            source,
        })?;

        let body = document.to_json_bytes().map_err(PipelineError::Serialize)?;
        let size = body.len() as u64;

        store
            .put(&key, body, ARTIFACT_CONTENT_TYPE)
            .await
            .map_err(|source| PipelineError::Store {
                bucket: bucket.to_string(),
                key: key.clone(),
                source,
            })?;

        let artifact = StoredArtifact::new(bucket, &key, size);
        tracing::info!("File uploaded successfully at {}", artifact.url);
        Ok(artifact)
    }
}
