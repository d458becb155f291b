//! Facebooker credential resolver.
//!
//! Implements [`facebooker::CredentialSource`] by reading the API key and
//! account secret from environment variables, falling back to a TOML
//! configuration file (by default `~/.facebookerrc`):
//!
//! ```toml
//! api = "1234567"
//! secret = "7654321"
//! ```
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The resolver owns all file and environment access; the
//! [`facebooker`] crate only sees the resolved [`facebooker::Credentials`].
//!
//! ## Caching
//!
//! Successfully parsed files are memoized per path. Failed reads are not, so a
//! file that appears after a failed lookup is picked up on the next call.

pub mod environment;
pub mod file;
pub mod resolver;

pub use environment::{Environment, ProcessEnvironment, StaticEnvironment};
pub use file::{ConfigFile, ConfigFileError, DEFAULT_FILE_NAME};
pub use resolver::{
    CredentialResolver, ResolverConfig, DEFAULT_API_KEY_VAR, DEFAULT_SECRET_KEY_VAR,
};
