//! Core data models for annotation requests.

mod groups;
mod request;

pub use groups::{GroupSelection, SemanticGroup};
pub use request::{Annotations, Credentials, ExportFormat, Payload, DEFAULT_TOOL};
