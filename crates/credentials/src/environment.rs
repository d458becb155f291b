//! Access to environment variables and the home directory.
//!
//! The resolver never touches `std::env` directly; it goes through an
//! [`Environment`] so tests can substitute a [`StaticEnvironment`] instead of
//! mutating process state.

use std::collections::HashMap;
use std::path::PathBuf;

/// Source of environment variables and the user's home directory.
pub trait Environment: Send + Sync {
    /// Value of the variable `key`, if set and valid Unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// The current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// A fixed, in-memory environment.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    /// Home directory reported by [`Environment::home_dir`].
    pub home_dir: Option<PathBuf>,
    /// Variables reported by [`Environment::var`].
    pub vars: HashMap<String, String>,
}

impl StaticEnvironment {
    /// An environment with no variables and no home directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Sets the home directory.
    #[must_use]
    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}
