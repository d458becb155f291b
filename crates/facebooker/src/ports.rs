//! Port traits implemented by infrastructure crates.
//!
//! The domain only needs two things from the outside world: a way to post a
//! form and read back the body ([`Transport`]), and a way to obtain the
//! application credentials ([`CredentialSource`]).

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::RetryPolicy;
use crate::{ApiKey, Credentials, Result, Secret};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete before the transport's deadline.
    #[error("Transport timed out: {message}")]
    Timeout {
        /// Transport diagnostic.
        message: String,
    },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Shortened response body, for diagnostics.
        body: String,
    },

    /// The connection could not be established or was dropped.
    #[error("Transport connection failed: {message}")]
    Connection {
        /// Transport diagnostic.
        message: String,
    },

    /// The request could not be built (bad URL, unsendable form).
    #[error("Invalid transport request: {message}")]
    InvalidRequest {
        /// Transport diagnostic.
        message: String,
    },
}

impl TransportError {
    /// Returns whether the same request may be sent again.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => RetryPolicy::Retryable { after: None },
            Self::Status { status, .. } if *status == 429 || *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// Posts URL-encoded form data and returns the response body.
///
/// Implementations own timeouts and connection management. They must not
/// retry on their own behalf unless configured to by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submits `form` to `url` as `application/x-www-form-urlencoded`.
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> std::result::Result<String, TransportError>;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Supplies the application's API key and secret.
pub trait CredentialSource: Send + Sync {
    /// Resolves the API key, or fails with
    /// [`crate::FacebookerError::ConfigurationMissing`].
    fn api_key(&self) -> Result<ApiKey>;

    /// Resolves the account secret, or fails with
    /// [`crate::FacebookerError::ConfigurationMissing`].
    fn secret_key(&self) -> Result<Secret>;

    /// Resolves both halves of the credential pair.
    fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials::new(self.api_key()?, self.secret_key()?))
    }
}
