//! Utility modules supporting annotation requests.
//!
//! - [`RateLimiter`]: minimum spacing between request starts
//! - [`build_client`] / [`HttpSettings`]: reqwest client construction
//! - [`validate_text`], [`validate_pmid`], [`validate_groups`],
//!   [`validate_format`], [`validate_authentication`]: pre-flight checks
//!
//! # Rate Limiting
//!
//! ```rust,no_run
//! use becas::utils::RateLimiter;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = RateLimiter::default();
//! limiter.acquire().await; // returns immediately
//! limiter.acquire().await; // waits until 500ms after the first start
//! # }
//! ```

mod http;
mod rate_limit;
mod validate;

pub use http::{build_client, HttpSettings, USER_AGENT};
pub use rate_limit::{RateLimiter, DEFAULT_MIN_INTERVAL};
pub use validate::{
    parse_pmid, validate_authentication, validate_format, validate_groups, validate_pmid,
    validate_text,
};
