//! Inbound EDI pipeline
//!
//! Turns EDI files dropped into an S3 bucket into purchase-order JSON stored
//! back in the same bucket.
//!
//! # Architecture
//!
//! Each object-created notification runs four stages in sequence:
//!
//! - **Fetch**: read the object named by the event from the object store
//! - **Translate**: convert the EDI text to an intermediate JSON document over HTTP
//! - **Map**: apply the configured mapping to produce the target document
//! - **Store**: upload the document as `orders/{po_number}-{n}.json`
//!
//! The first failing stage ends the invocation and is reported in the
//! response; nothing downstream runs on bad input.
//!
//! # Usage
//!
//! ```no_run
//! use edi_inbound::{Config, InboundEvent, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!
//!     let pipeline = Pipeline::from_config(&config)?;
//!     let event = InboundEvent::for_object("my-bucket", "inbound/850.edi");
//!     let response = pipeline.handle(&event).await;
//!     println!("{}", response.body);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod event;
pub mod io;
pub mod pipeline;
pub mod stedi;

pub use config::Config;
pub use document::{IntermediateDocument, OutputDocument, RawPayload};
pub use event::{InboundEvent, ObjectRef};
pub use pipeline::{InvocationResponse, Outcome, Pipeline, PipelineError, Stage, StoredArtifact};

use anyhow::Result;

/// Validate the configuration, build a pipeline and handle a single event.
pub async fn invoke(config: &Config, event: &InboundEvent) -> Result<InvocationResponse> {
    config.validate()?;

    tracing::debug!("Configuration loaded: {:?}", config);
    let pipeline = Pipeline::from_config(config)?;

    Ok(pipeline.handle(event).await)
}

/// Build the Tokio runtime used for invocations.
///
/// An invocation is a single sequential task, so a current-thread runtime is enough.
pub fn build_runtime() -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_current_thread();
    builder.enable_all();
    Ok(builder.build()?)
}
