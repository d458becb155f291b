//! Facebooker HTTP transport adapter.
//!
//! Implements the [`facebooker::Transport`] port over [`reqwest`]. The adapter
//! owns connection handling, the request timeout, and the mapping of HTTP
//! failures to [`facebooker::TransportError`]. It performs one request per
//! call and never retries.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** No reply parsing happens here; bodies are handed back
//! to the session verbatim.

mod http;

pub use http::{HttpTransport, HttpTransportConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
