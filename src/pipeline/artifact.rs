//! Naming and describing stored artifacts.

use crate::config::OutputConfig;
use crate::document::OutputDocument;
use crate::pipeline::PipelineError;
use rand::Rng;
use serde::Serialize;

/// Reference to an uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredArtifact {
    pub bucket: String,
    pub key: String,
    pub url: String,
    pub size: u64,
}

impl StoredArtifact {
    pub fn new(bucket: &str, key: &str, size: u64) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            url: format!("https://{}.s3.amazonaws.com/{}", bucket, key),
            size,
        }
    }
}

/// Derives artifact keys of the form `{prefix}/{identifier}-{n}.json`.
///
/// `n` is drawn uniformly from `0..suffix_bound`. The suffix only makes
/// collisions less likely; two deliveries of the same event usually produce
/// two artifacts.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
    id_field: String,
    suffix_bound: u32,
}

impl KeyGenerator {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            prefix: config.prefix.trim_matches('/').to_string(),
            id_field: config.id_field.clone(),
            suffix_bound: config.suffix_bound.max(1),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `key` lies under the artifact prefix.
    pub fn is_artifact_key(&self, key: &str) -> bool {
        key.strip_prefix(&self.prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Generate a key using the thread-local RNG.
    pub fn generate(&self, document: &OutputDocument) -> Result<String, PipelineError> {
        self.generate_with(document, &mut rand::rng())
    }

    /// Generate a key drawing the suffix from `rng`.
    pub fn generate_with<R: Rng>(
        &self,
        document: &OutputDocument,
        rng: &mut R,
    ) -> Result<String, PipelineError> {
        let id = document
            .identifier(&self.id_field)
            .ok_or_else(|| PipelineError::MissingIdentifier {
                field: self.id_field.clone(),
            })?;

        let suffix = rng.random_range(0..self.suffix_bound);
        Ok(format!("{}/{}-{}.json", self.prefix, id, suffix))
    }
}
