//! Top-level error and retry-policy types for the Facebooker client.
//!
//! [`FacebookerError`] covers every condition a [`crate::Session`] call can end
//! in. Transport failures are produced by the [`crate::Transport`] collaborator
//! and pass through unchanged as [`FacebookerError::Transport`].
//!
//! [`RetryPolicy`] lets callers decide whether to re-invoke a call. The library
//! never retries on its own: each call performs exactly one outbound request.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::TransportError;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// ## Rules
///
/// - `Retryable` errors: transport timeouts, dropped connections, 5xx/429
///   statuses, and the service's own "unavailable" / "too many calls" codes.
/// - `NonRetryable` errors: missing configuration, invalid session state,
///   protocol mismatches, and every other service error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried without changing its inputs.
    NonRetryable,
}

// Service error codes that signal a transient condition on the remote side.
const SERVICE_UNKNOWN_ERROR: i64 = 1;
const SERVICE_UNAVAILABLE: i64 = 2;
const SERVICE_TOO_MANY_CALLS: i64 = 4;

// ---------------------------------------------------------------------------
// Client errors
// ---------------------------------------------------------------------------

/// Errors produced by credential resolution, session handling, and reply mapping.
#[derive(Debug, Error)]
pub enum FacebookerError {
    /// Neither the environment nor the configuration file yields a credential.
    ///
    /// A missing file, an unreadable file, and a file without the requested
    /// entry all collapse into this variant: the remedy is the same.
    #[error("Configuration missing: {detail}")]
    ConfigurationMissing {
        /// Which credential was missing and where it was looked for.
        detail: String,
    },

    /// Session or resolver configuration is present but unusable.
    ///
    /// Produced by: a login page that is not a valid URL.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The requested transition is not allowed from the session's current state.
    ///
    /// Produced by: securing a session that is already secured.
    #[error("Invalid session state: {detail}")]
    InvalidSessionState {
        /// Description of the rejected transition.
        detail: String,
    },

    /// A caller-supplied parameter collides with one the session manages itself.
    #[error("Parameter '{name}' is reserved and set by the session")]
    ReservedParameter {
        /// The offending parameter name.
        name: String,
    },

    /// The reply is well-formed but does not fit what the call expects.
    ///
    /// Produced by: unexpected root element, element count mismatch in batch
    /// operations, or a typed field whose text cannot be coerced.
    #[error("Protocol mismatch: {reason}")]
    ProtocolMismatch {
        /// Description of the mismatch.
        reason: String,
    },

    /// The reply body is not a well-formed XML document.
    #[error("Malformed reply: {reason}")]
    MalformedReply {
        /// Parser diagnostic.
        reason: String,
    },

    /// The service answered with an `error_response` document.
    #[error("Service error {code}: {message}")]
    Service {
        /// Numeric error code reported by the service.
        code: i64,
        /// Human-readable message reported by the service.
        message: String,
    },

    /// The transport collaborator failed; surfaced unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FacebookerError {
    /// Shorthand for [`FacebookerError::ProtocolMismatch`].
    pub fn protocol_mismatch(reason: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`FacebookerError::MalformedReply`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedReply {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`FacebookerError::ConfigurationMissing`].
    pub fn configuration_missing(detail: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            detail: detail.into(),
        }
    }

    /// Returns whether the failed call may be re-issued unchanged.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport(error) => error.retry_policy(),
            Self::Service { code, .. }
                if matches!(
                    *code,
                    SERVICE_UNKNOWN_ERROR | SERVICE_UNAVAILABLE | SERVICE_TOO_MANY_CALLS
                ) =>
            {
                RetryPolicy::Retryable { after: None }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = FacebookerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_throttling_is_retryable() {
        let error = FacebookerError::Service {
            code: 4,
            message: "Application request limit reached".to_owned(),
        };
        assert_eq!(error.retry_policy(), RetryPolicy::Retryable { after: None });
    }

    #[test]
    fn session_state_errors_are_final() {
        let error = FacebookerError::InvalidSessionState {
            detail: "already secured".to_owned(),
        };
        assert_eq!(error.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn transport_errors_display_unchanged() {
        let inner = TransportError::Timeout {
            message: "deadline elapsed".to_owned(),
        };
        let expected = inner.to_string();
        let error = FacebookerError::from(inner);
        assert_eq!(error.to_string(), expected);
    }
}
