//! Async client for the becas annotation API.
//!
//! [`BecasClient`] owns everything a request needs: credentials, transport
//! settings, the endpoint resolver and a shared [`RateLimiter`]. Clones share
//! the same limiter, so every request issued through a client family is
//! spaced by at least the configured interval.
//!
//! ```rust,no_run
//! use becas::client::{BecasClient, ClientConfig};
//! use becas::models::{Credentials, SemanticGroup, GroupSelection};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), becas::BecasError> {
//! let client = BecasClient::new(ClientConfig::new(Credentials::new("you@example.com")))?;
//! let groups = GroupSelection::new().include(SemanticGroup::Prge);
//! let results = client
//!     .annotate_text("BRCA1 is a human caretaker gene.", Some(&groups), false)
//!     .await?;
//! println!("{}", serde_json::Value::Object(results));
//! # Ok(())
//! # }
//! ```

mod endpoint;
mod error;

pub use endpoint::{EndpointResolver, Operation, DEFAULT_ENDPOINT_PREFIX};
pub use error::{BecasError, Result};

use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Annotations, Credentials, ExportFormat, GroupSelection, Payload};
use crate::utils::{
    build_client, validate_authentication, validate_pmid, validate_text, HttpSettings,
    RateLimiter, DEFAULT_MIN_INTERVAL,
};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for a [`BecasClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,

    /// Total time allowed for one request
    pub timeout: Duration,

    /// Use HTTPS instead of plain HTTP
    pub secure: bool,

    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,

    /// Host and path prefix of the API, without scheme
    pub endpoint_prefix: String,

    /// Minimum spacing between request starts
    pub min_request_interval: Duration,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            timeout: DEFAULT_TIMEOUT,
            secure: false,
            accept_invalid_certs: false,
            endpoint_prefix: DEFAULT_ENDPOINT_PREFIX.to_string(),
            min_request_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn endpoint_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.endpoint_prefix = prefix.into();
        self
    }

    pub fn min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Credentials::default())
    }
}

/// Client for the becas annotation API
#[derive(Debug, Clone)]
pub struct BecasClient {
    http: reqwest::Client,
    credentials: Credentials,
    resolver: EndpointResolver,
    limiter: Arc<RateLimiter>,
}

impl BecasClient {
    /// Create a client with its own rate limiter
    pub fn new(config: ClientConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.min_request_interval));
        Self::with_rate_limiter(config, limiter)
    }

    /// Create a client sharing `limiter` with other clients
    pub fn with_rate_limiter(config: ClientConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        if config.timeout.is_zero() {
            return Err(BecasError::InvalidArgument(
                "Timeout must be positive".to_string(),
            ));
        }

        let http = build_client(&HttpSettings {
            timeout: config.timeout,
            accept_invalid_certs: config.accept_invalid_certs,
            ..Default::default()
        })?;

        Ok(Self {
            http,
            credentials: config.credentials,
            resolver: EndpointResolver::new(config.endpoint_prefix, config.secure),
            limiter,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Annotate text with biomedical concepts.
    ///
    /// With `echo` set the service includes the submitted text in the result.
    pub async fn annotate_text(
        &self,
        text: &str,
        groups: Option<&GroupSelection>,
        echo: bool,
    ) -> Result<Annotations> {
        validate_text(text)?;
        validate_selection(groups)?;
        validate_authentication(&self.credentials)?;

        let payload = Payload::text(text).groups(groups).echo(echo);
        let response = self.send(Operation::AnnotateText, None, &payload).await?;
        decode_annotations(response).await
    }

    /// Export annotated text in JSON, IeXML, A1 or CoNLL.
    pub async fn export_text(
        &self,
        text: &str,
        format: ExportFormat,
        groups: Option<&GroupSelection>,
    ) -> Result<String> {
        validate_text(text)?;
        validate_selection(groups)?;
        validate_authentication(&self.credentials)?;

        let payload = Payload::text(text).groups(groups).format(format);
        let response = self.send(Operation::ExportText, None, &payload).await?;
        decode_text(response).await
    }

    /// Annotate a PubMed publication.
    pub async fn annotate_publication(
        &self,
        pmid: u64,
        groups: Option<&GroupSelection>,
    ) -> Result<Annotations> {
        validate_pmid(pmid)?;
        validate_selection(groups)?;
        validate_authentication(&self.credentials)?;

        let payload = Payload::publication().groups(groups);
        let response = self
            .send(Operation::AnnotatePublication, Some(pmid), &payload)
            .await?;
        decode_annotations(response).await
    }

    /// Export a PubMed publication as annotated MEDLINE IeXML.
    pub async fn export_publication(
        &self,
        pmid: u64,
        groups: Option<&GroupSelection>,
    ) -> Result<String> {
        validate_pmid(pmid)?;
        validate_selection(groups)?;
        validate_authentication(&self.credentials)?;

        let payload = Payload::publication().groups(groups);
        let response = self
            .send(Operation::ExportPublication, Some(pmid), &payload)
            .await?;
        decode_text(response).await
    }

    /// POST `payload` to `operation`, respecting the rate limit.
    async fn send(
        &self,
        operation: Operation,
        pmid: Option<u64>,
        payload: &Payload<'_>,
    ) -> Result<Response> {
        let url = self.resolver.resolve(operation, &self.credentials, pmid)?;
        let body = serde_json::to_vec(payload)
            .map_err(|e| BecasError::Internal(format!("Failed to encode payload: {}", e)))?;

        self.limiter.acquire().await;

        tracing::debug!(operation = %operation, pmid = ?pmid, "Sending becas request");
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        check_status(response).await
    }
}

/// Empty selections mean "no filter" and are not validated.
fn validate_selection(groups: Option<&GroupSelection>) -> Result<()> {
    match groups {
        Some(groups) if !groups.is_empty() => groups.validate(),
        _ => Ok(()),
    }
}

/// Map non-success status codes to the appropriate `BecasError` variant.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(response.headers());
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            let e = e.without_url();
            tracing::warn!("Failed to read error body: {}", e);
            format!("<unreadable body: {}>", e)
        }
    };
    tracing::warn!("becas API returned {}: {}", status, body.trim());

    Err(match status {
        StatusCode::NOT_FOUND => BecasError::PublicationNotFound(error_detail(&body)),
        StatusCode::PAYLOAD_TOO_LARGE => BecasError::TooMuchText(error_detail(&body)),
        StatusCode::TOO_MANY_REQUESTS => BecasError::TooManyRequests { wait: retry_after },
        StatusCode::BAD_GATEWAY => BecasError::ServiceUnavailable(None),
        StatusCode::SERVICE_UNAVAILABLE => {
            BecasError::ServiceUnavailable(Some(error_detail(&body)))
        }
        _ => BecasError::Service(format!("HTTP {}: {}", status, body.trim())),
    })
}

/// The `error` field of a JSON error body, or the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Parse `Retry-After` as delta-seconds or an HTTP-date.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(remaining.to_std().unwrap_or(Duration::ZERO))
}

async fn decode_annotations(response: Response) -> Result<Annotations> {
    let body = response.text().await?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(BecasError::Service(format!(
            "Expected a JSON object, got: {}",
            other
        ))),
        Err(e) => Err(BecasError::Service(format!("Invalid JSON response: {}", e))),
    }
}

async fn decode_text(response: Response) -> Result<String> {
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemanticGroup;
    use reqwest::header::HeaderValue;

    fn offline_client(credentials: Credentials) -> BecasClient {
        // Port 9 (discard) is never contacted: every case below fails validation first.
        BecasClient::new(ClientConfig::new(credentials).endpoint_prefix("127.0.0.1:9/")).unwrap()
    }

    #[test]
    fn test_error_detail_prefers_error_field() {
        assert_eq!(error_detail(r#"{"error":"not found"}"#), "not found");
        assert_eq!(error_detail(r#"{"message":"x"}"#), r#"{"message":"x"}"#);
        assert_eq!(error_detail("  plain text\n"), "plain text");
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        // A date in the past means "retry now".
        assert_eq!(parse_retry_after(&headers), Some(Duration::ZERO));

        let future = (chrono::Utc::now() + chrono::Duration::seconds(120)).to_rfc2822();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(&future).unwrap());
        let wait = parse_retry_after(&headers).unwrap();
        assert!(wait > Duration::from_secs(100) && wait <= Duration::from_secs(120));
    }

    #[test]
    fn test_parse_retry_after_missing_or_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig::new(Credentials::new("you@example.com")).timeout(Duration::ZERO);
        assert!(matches!(
            BecasClient::new(config),
            Err(BecasError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validation_happens_before_network() {
        let client = offline_client(Credentials::new("you@example.com"));

        let err = tokio_test::block_on(client.annotate_text("   ", None, false)).unwrap_err();
        assert!(matches!(err, BecasError::InvalidArgument(_)));

        let err = tokio_test::block_on(client.annotate_publication(0, None)).unwrap_err();
        assert!(matches!(err, BecasError::InvalidArgument(_)));

        let none_selected = GroupSelection::new().exclude(SemanticGroup::Prge);
        let err = tokio_test::block_on(client.export_publication(1, Some(&none_selected)))
            .unwrap_err();
        assert!(matches!(err, BecasError::InvalidGroups(_)));
    }

    #[test]
    fn test_text_is_validated_before_credentials() {
        let client = offline_client(Credentials::new(""));

        let err = tokio_test::block_on(client.export_text("", ExportFormat::Json, None))
            .unwrap_err();
        assert!(matches!(err, BecasError::InvalidArgument(_)));

        let err = tokio_test::block_on(client.export_text("BRCA1", ExportFormat::Json, None))
            .unwrap_err();
        assert!(matches!(err, BecasError::AuthenticationRequired(_)));
    }

    #[test]
    fn test_clones_share_rate_limiter() {
        let client = offline_client(Credentials::new("you@example.com"));
        let clone = client.clone();
        assert!(Arc::ptr_eq(client.rate_limiter(), clone.rate_limiter()));
        assert_eq!(client.rate_limiter().interval(), DEFAULT_MIN_INTERVAL);
    }
}
