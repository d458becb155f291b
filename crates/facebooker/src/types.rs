//! Shared value types for the Facebooker client.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaning beyond identity: secrets that must never be printed, a three-valued
//! friendship answer, wall-clock timestamps, and the protocol version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ApiKey, UserId};

// ---------------------------------------------------------------------------
// Secrets and credentials
// ---------------------------------------------------------------------------

/// A shared secret used to sign requests.
///
/// `Debug` output is redacted; the raw value is only reachable through
/// [`Secret::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value, returning `None` if it is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the raw secret for signing.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// The long-lived application credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Public API key.
    pub api_key: ApiKey,
    /// Account secret used to sign calls on an unsecured session.
    pub secret: Secret,
}

impl Credentials {
    /// Creates a new credential pair.
    pub fn new(api_key: ApiKey, secret: Secret) -> Self {
        Self { api_key, secret }
    }
}

// ---------------------------------------------------------------------------
// Friendship
// ---------------------------------------------------------------------------

/// Answer to "are these two users friends?".
///
/// The service distinguishes "not friends" from "cannot say" (for example when
/// the caller lacks visibility), so this is deliberately three-valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Friendship {
    /// The service reported `1`.
    Friends,
    /// The service reported `0`.
    NotFriends,
    /// The service returned an explicit nil marker.
    Unknown,
}

impl Friendship {
    /// Collapses to the nullable-boolean view (`Unknown` becomes `None`).
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Friends => Some(true),
            Self::NotFriends => Some(false),
            Self::Unknown => None,
        }
    }
}

/// An ordered pair of users whose friendship is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserPair {
    /// Sent in `uids1`; echoed back as `uid1`.
    pub first: UserId,
    /// Sent in `uids2`; echoed back as `uid2`.
    pub second: UserId,
}

impl UserPair {
    /// Creates a new pair from raw user ids.
    pub fn new(first: u64, second: u64) -> Self {
        Self {
            first: UserId::new(first),
            second: UserId::new(second),
        }
    }
}

impl From<(u64, u64)> for UserPair {
    fn from((first, second): (u64, u64)) -> Self {
        Self::new(first, second)
    }
}

impl std::fmt::Display for UserPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Version of the REST protocol, sent as the `v` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl ApiVersion {
    /// The protocol version this client speaks.
    pub const V1_0: Self = Self { major: 1, minor: 0 };

    /// Creates a new [`ApiVersion`].
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V1_0
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a [`Timestamp`] from seconds since the Unix epoch.
    ///
    /// Returns `None` if the value is out of range.
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(Self)
    }

    /// Returns seconds since the Unix epoch.
    pub fn epoch_seconds(self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let secret = Secret::new("7654321").unwrap();
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.expose(), "7654321");
    }

    #[test]
    fn unknown_friendship_is_not_false() {
        assert_eq!(Friendship::Unknown.as_option(), None);
        assert_eq!(Friendship::NotFriends.as_option(), Some(false));
        assert_ne!(Friendship::Unknown, Friendship::NotFriends);
    }

    #[test]
    fn timestamps_round_trip_epoch_seconds() {
        let ts = Timestamp::from_epoch_seconds(1_200_000_000).unwrap();
        assert_eq!(ts.epoch_seconds(), 1_200_000_000);
    }

    #[test]
    fn api_version_renders_as_wire_value() {
        assert_eq!(ApiVersion::default().to_string(), "1.0");
    }
}
