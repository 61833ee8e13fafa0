//! Error taxonomy for the becas client.
//!
//! Every failure surfaced by the library is a [`BecasError`]. Local,
//! pre-flight validation failures never reach the network layer; remote and
//! transport failures are reported as-is and never retried automatically.

use std::error::Error as StdError;
use std::time::Duration;

/// Result type used throughout the library
pub type Result<T, E = BecasError> = std::result::Result<T, E>;

/// Errors that can occur when talking to the becas API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BecasError {
    /// Missing or blank `email` / `tool` credentials
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// Malformed text or publication identifier
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed semantic group selection
    #[error("Invalid groups: {0}")]
    InvalidGroups(String),

    /// Unknown export format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The service rejected the request because the text is too large (413)
    #[error("Too much text: {0}")]
    TooMuchText(String),

    /// The requested publication does not exist in PubMed (404)
    #[error("Publication not found: {0}")]
    PublicationNotFound(String),

    /// The service is throttling this client (429)
    #[error("Too many requests{}", format_wait(.wait))]
    TooManyRequests {
        /// How long the service asked us to wait, from `Retry-After`
        wait: Option<Duration>,
    },

    /// The service is down or overloaded (502/503)
    #[error("Service unavailable{}", format_detail(.0))]
    ServiceUnavailable(Option<String>),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection to the service could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// TLS negotiation or certificate verification failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// Any other unexpected failure
    #[error("Service error: {0}")]
    Service(String),

    /// Broken internal invariant (unknown operation, misplaced PMID)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_wait(wait: &Option<Duration>) -> String {
    match wait {
        Some(wait) => format!(", retry after {} seconds", wait.as_secs()),
        None => String::new(),
    }
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(": {}", detail),
        _ => String::new(),
    }
}

impl BecasError {
    /// Whether the caller supplied input the service can never accept as-is.
    ///
    /// Covers local validation failures as well as the remote rejections of a
    /// specific request (413, 404).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            BecasError::InvalidArgument(_)
                | BecasError::InvalidGroups(_)
                | BecasError::InvalidFormat(_)
                | BecasError::TooMuchText(_)
                | BecasError::PublicationNotFound(_)
        )
    }

    /// Whether this is a connection-level failure (TLS errors included)
    pub fn is_connection(&self) -> bool {
        matches!(self, BecasError::Connection(_) | BecasError::Tls(_))
    }

    /// Whether the same request may succeed if tried again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BecasError::TooManyRequests { .. }
                | BecasError::ServiceUnavailable(_)
                | BecasError::Timeout(_)
                | BecasError::Connection(_)
                | BecasError::Tls(_)
        )
    }

    /// The wait requested by the service, if it throttled us
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BecasError::TooManyRequests { wait } => *wait,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BecasError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the credentials in its query string; keep it out
        // of both the message and the TLS check.
        let https = err.url().is_some_and(|url| url.scheme() == "https");
        let err = err.without_url();
        let message = error_chain(&err);

        if err.is_timeout() {
            return BecasError::Timeout(message);
        }
        if https && looks_like_tls(&err) {
            return BecasError::Tls(message);
        }
        if err.is_connect() {
            return BecasError::Connection(message);
        }
        BecasError::Service(message)
    }
}

/// Join an error and all of its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// reqwest does not expose TLS failures as a distinct kind, so inspect the
/// causes of `err` (not `err` itself) for the backend's certificate and
/// handshake errors.
fn looks_like_tls(err: &dyn StdError) -> bool {
    const MARKERS: [&str; 7] = [
        "certificate",
        "tls",
        "ssl",
        "handshake",
        "x509",
        "wrong version number",
        "corrupt message",
    ];

    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if MARKERS.iter().any(|marker| text.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        source: Option<Box<Wrapped>>,
    }

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref().map(|s| s as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_too_many_requests_display() {
        let err = BecasError::TooManyRequests {
            wait: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "Too many requests, retry after 30 seconds");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));

        let err = BecasError::TooManyRequests { wait: None };
        assert_eq!(err.to_string(), "Too many requests");
    }

    #[test]
    fn test_service_unavailable_display() {
        assert_eq!(
            BecasError::ServiceUnavailable(None).to_string(),
            "Service unavailable"
        );
        assert_eq!(
            BecasError::ServiceUnavailable(Some("maintenance".to_string())).to_string(),
            "Service unavailable: maintenance"
        );
    }

    #[test]
    fn test_classification() {
        assert!(BecasError::Tls("bad cert".into()).is_connection());
        assert!(BecasError::Connection("refused".into()).is_connection());
        assert!(!BecasError::Timeout("slow".into()).is_connection());

        assert!(BecasError::TooMuchText("big".into()).is_invalid_input());
        assert!(BecasError::PublicationNotFound("gone".into()).is_invalid_input());
        assert!(!BecasError::AuthenticationRequired("email".into()).is_invalid_input());

        assert!(BecasError::ServiceUnavailable(None).is_retryable());
        assert!(!BecasError::Service("boom".into()).is_retryable());
        assert!(!BecasError::InvalidGroups("none".into()).is_retryable());
    }

    #[test]
    fn test_tls_detection_walks_sources() {
        let err = Wrapped {
            message: "error sending request",
            source: Some(Box::new(Wrapped {
                message: "invalid peer certificate: UnknownIssuer",
                source: None,
            })),
        };
        assert!(looks_like_tls(&err));
        assert_eq!(
            error_chain(&err),
            "error sending request: invalid peer certificate: UnknownIssuer"
        );

        let err = Wrapped {
            message: "error sending request",
            source: Some(Box::new(Wrapped {
                message: "Connection refused (os error 111)",
                source: None,
            })),
        };
        assert!(!looks_like_tls(&err));
    }

    #[test]
    fn test_tls_detection_ignores_top_level_message() {
        let err = Wrapped {
            message: "error sending request for url (http://host/?email=haussler%40example.com)",
            source: Some(Box::new(Wrapped {
                message: "tcp connect error: Connection refused (os error 111)",
                source: None,
            })),
        };
        assert!(!looks_like_tls(&err));
    }
}
