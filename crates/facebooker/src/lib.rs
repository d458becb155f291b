//! Facebooker: a client for the social-graph REST service.
//!
//! This crate contains the request signer, the session state machine, the
//! response mapper, and the domain object registry. Infrastructure crates
//! implement the port traits defined here; they never add protocol rules.
//!
//! ## Architectural Layer
//!
//! **Protocol logic + port definitions.** This crate performs no I/O. The
//! [`Transport`] port posts forms and returns bodies; the [`CredentialSource`]
//! port supplies the API key and secret.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`UserId`, `ApiKey`, `SessionKey`, `AuthToken`) |
//! | [`types`] | Value types (`Secret`, `Credentials`, `Friendship`, `Timestamp`, etc.) |
//! | [`errors`] | [`FacebookerError`] and [`RetryPolicy`] |
//! | [`ports`] | [`Transport`], [`TransportError`], [`CredentialSource`] |
//! | [`signer`] | MD5 request signatures |
//! | [`document`] | Reply body → element tree |
//! | [`value`] | [`Value`] and the [`Record`] fallback |
//! | [`registry`] | Tag name → typed object shape |
//! | [`objects`] | Built-in shapes (`User`, `Photo`, `Album`, `FriendInfo`) |
//! | [`mapper`] | Element tree → [`Value`] |
//! | [`session`] | [`Session`] and its operations |
//!
//! ## Flow
//!
//! A [`Session`] operation builds its parameters, signs them, posts them
//! through the [`Transport`], and hands the body to the [`ResponseMapper`],
//! which resolves each element's type from its tag and shape.

pub mod document;
pub mod errors;
pub mod identifiers;
pub mod mapper;
pub mod objects;
pub mod ports;
pub mod registry;
pub mod session;
pub mod signer;
pub mod types;
pub mod value;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{FacebookerError, Result, RetryPolicy};
pub use identifiers::{ApiKey, AuthToken, SessionKey, UserId};
pub use mapper::ResponseMapper;
pub use objects::{Album, DomainObject, FriendInfo, Photo, User};
pub use ports::{CredentialSource, Transport, TransportError};
pub use registry::{DomainShape, FieldKind, FieldSpec, Registry, Shape};
pub use session::{Session, SessionConfig, DEFAULT_ENDPOINT, DEFAULT_LOGIN_URL};
pub use signer::{sign, Signature, SignedRequest};
pub use types::{ApiVersion, Credentials, Friendship, Secret, Timestamp, UserPair};
pub use value::{Record, Value};
