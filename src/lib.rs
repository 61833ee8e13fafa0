//! # becas
//!
//! Client library for the becas biomedical concept annotation API.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Credentials, semantic groups, export formats and payloads
//! - [`client`]: Endpoint resolution, rate-limited requests and the four API operations
//! - [`utils`]: Validation, rate limiting and HTTP client construction
//! - [`config`]: Configuration file and environment handling
//! - [`ui`]: Terminal output helpers used by the `becas` binary

pub mod client;
pub mod config;
pub mod models;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use client::{BecasClient, BecasError, ClientConfig, Result};
pub use models::{Annotations, Credentials, ExportFormat, GroupSelection, SemanticGroup};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
