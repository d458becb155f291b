//! Reqwest-backed form poster.

use std::time::Duration;

use async_trait::async_trait;
use facebooker::{Transport, TransportError};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("facebooker-rs/", env!("CARGO_PKG_VERSION"));

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Deadline for the whole request, connection included.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Posts URL-encoded forms with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport with an explicit timeout and user agent.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidRequest`] when the reqwest client cannot be
    /// constructed.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|error| TransportError::InvalidRequest {
                message: format!("cannot build HTTP client: {error}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, form), fields(field_count = form.len()))]
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<String, TransportError> {
        let endpoint = Url::parse(url).map_err(|error| TransportError::InvalidRequest {
            message: format!("invalid endpoint {url:?}: {error}"),
        })?;

        let response = self
            .client
            .post(endpoint)
            .form(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "reply received");
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        String::from_utf8(body.to_vec()).map_err(|error| TransportError::Connection {
            message: format!("reply body is not UTF-8: {error}"),
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            message: error.to_string(),
        }
    } else if error.is_builder() {
        TransportError::InvalidRequest {
            message: error.to_string(),
        }
    } else {
        TransportError::Connection {
            message: error.to_string(),
        }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TransportError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TransportError::Timeout {
            message: format!("status {}", status.as_u16()),
        },
        _ => TransportError::Status {
            status: status.as_u16(),
            body: body_preview(body),
        },
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facebooker::RetryPolicy;
    use rstest::rstest;

    #[rstest]
    #[case::throttled(StatusCode::TOO_MANY_REQUESTS, RetryPolicy::Retryable { after: None })]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, RetryPolicy::Retryable { after: None })]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, RetryPolicy::Retryable { after: None })]
    #[case::bad_request(StatusCode::BAD_REQUEST, RetryPolicy::NonRetryable)]
    #[case::not_found(StatusCode::NOT_FOUND, RetryPolicy::NonRetryable)]
    fn statuses_map_to_retry_policies(#[case] status: StatusCode, #[case] expected: RetryPolicy) {
        assert_eq!(map_status_error(status, b"").retry_policy(), expected);
    }

    #[test]
    fn status_errors_keep_a_compact_body() {
        let error = map_status_error(
            StatusCode::SERVICE_UNAVAILABLE,
            b"<html>\n  <body>Service   Unavailable</body>\n</html>",
        );
        assert_eq!(
            error,
            TransportError::Status {
                status: 503,
                body: "<html> <body>Service Unavailable</body> </html>".to_owned(),
            }
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let preview = body_preview("x".repeat(500).as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn default_config_uses_a_thirty_second_timeout() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("facebooker-rs/"));
        assert!(HttpTransport::new(config).is_ok());
    }
}
