//! Pipeline orchestration for inbound EDI events.

mod artifact;
mod error;
mod metrics;
mod response;
mod stages;


pub use artifact::{KeyGenerator, StoredArtifact};
pub use error::{PipelineError, Stage};
pub use metrics::InvocationMetrics;
pub use response::{InvocationResponse, Outcome, SUCCESS_MESSAGE};
pub use stages::Pipeline;
