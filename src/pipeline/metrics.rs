//! Per-invocation timing and size metrics.
//!
//! Metrics live for a single invocation; nothing is shared between events.

use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

use super::Stage;

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Metrics for one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvocationMetrics {
    /// Bytes read from the triggering object
    pub bytes_fetched: u64,

    /// Bytes written to the stored artifact
    pub bytes_stored: u64,

    /// Time spent fetching the object (seconds)
    #[serde(serialize_with = "serialize_duration")]
    pub fetch: Duration,

    /// Time spent in the translation service (seconds)
    #[serde(serialize_with = "serialize_duration")]
    pub translate: Duration,

    /// Time spent in the mapping service (seconds)
    #[serde(serialize_with = "serialize_duration")]
    pub map: Duration,

    /// Time spent uploading the artifact (seconds)
    #[serde(serialize_with = "serialize_duration")]
    pub store: Duration,
}

impl InvocationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record time spent in a stage.
    pub fn add_stage_time(&mut self, stage: Stage, duration: Duration) {
        match stage {
            Stage::Fetch => self.fetch += duration,
            Stage::Translate => self.translate += duration,
            Stage::Map => self.map += duration,
            Stage::Store => self.store += duration,
            Stage::Event => {}
        }
    }

    /// Record time since `start` for a stage.
    pub fn finish_stage(&mut self, stage: Stage, start: Instant) {
        self.add_stage_time(stage, start.elapsed());
    }

    pub fn add_bytes_fetched(&mut self, bytes: u64) {
        self.bytes_fetched += bytes;
    }

    pub fn add_bytes_stored(&mut self, bytes: u64) {
        self.bytes_stored += bytes;
    }

    /// Total time across all stages.
    pub fn total(&self) -> Duration {
        self.fetch + self.translate + self.map + self.store
    }
}

impl std::fmt::Display for InvocationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fetched: {} B | Stored: {} B | \
             Time: fetch {:.0}ms | translate {:.0}ms | map {:.0}ms | store {:.0}ms | total {:.0}ms",
            self.bytes_fetched,
            self.bytes_stored,
            self.fetch.as_secs_f64() * 1000.0,
            self.translate.as_secs_f64() * 1000.0,
            self.map.as_secs_f64() * 1000.0,
            self.store.as_secs_f64() * 1000.0,
            self.total().as_secs_f64() * 1000.0,
        )
    }
}
