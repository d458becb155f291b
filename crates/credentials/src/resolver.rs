//! Environment-first credential resolution with a memoized file fallback.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use facebooker::{ApiKey, CredentialSource, FacebookerError, Result, Secret};
use tracing::debug;

use crate::environment::{Environment, ProcessEnvironment};
use crate::file::{ConfigFile, ConfigFileError, DEFAULT_FILE_NAME};

/// Variable consulted for the API key by default.
pub const DEFAULT_API_KEY_VAR: &str = "FACEBOOK_API_KEY";
/// Variable consulted for the account secret by default.
pub const DEFAULT_SECRET_KEY_VAR: &str = "FACEBOOK_SECRET_KEY";

/// Where a [`CredentialResolver`] looks for credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Environment variable holding the API key.
    pub api_key_var: String,
    /// Environment variable holding the account secret.
    pub secret_key_var: String,
    /// Configuration file to fall back to. `None` means
    /// `~/.facebookerrc` in the environment's home directory.
    pub configuration_file_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_key_var: DEFAULT_API_KEY_VAR.to_owned(),
            secret_key_var: DEFAULT_SECRET_KEY_VAR.to_owned(),
            configuration_file_path: None,
        }
    }
}

/// Resolves the API key and account secret.
///
/// Each lookup checks the configured environment variable first and uses it
/// verbatim when set and non-empty. Otherwise the configuration file is read
/// and the `api` or `secret` entry is used. When neither yields a value the
/// lookup fails with [`FacebookerError::ConfigurationMissing`].
pub struct CredentialResolver<E = ProcessEnvironment> {
    config: ResolverConfig,
    path_override: Option<PathBuf>,
    environment: E,
    files: Mutex<HashMap<PathBuf, ConfigFile>>,
}

impl CredentialResolver<ProcessEnvironment> {
    /// A resolver over the process environment.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_environment(config, ProcessEnvironment)
    }
}

impl<E: Environment> CredentialResolver<E> {
    /// A resolver over an explicit environment.
    pub fn with_environment(config: ResolverConfig, environment: E) -> Self {
        Self {
            config,
            path_override: None,
            environment,
            files: Mutex::new(HashMap::new()),
        }
    }

    /// The file consulted when an environment variable is unset.
    ///
    /// # Errors
    ///
    /// [`ConfigFileError::HomeDirectoryUnavailable`] when no path is set and
    /// the home directory cannot be determined.
    pub fn configuration_file_path(&self) -> std::result::Result<PathBuf, ConfigFileError> {
        if let Some(path) = self
            .path_override
            .as_ref()
            .or(self.config.configuration_file_path.as_ref())
        {
            return Ok(path.clone());
        }
        self.environment
            .home_dir()
            .map(|home| home.join(DEFAULT_FILE_NAME))
            .ok_or(ConfigFileError::HomeDirectoryUnavailable)
    }

    /// Points the resolver at another configuration file. `None` restores
    /// the path given at construction.
    pub fn set_configuration_file_path(&mut self, path: Option<PathBuf>) {
        debug!(path = ?path, "configuration file path changed");
        self.path_override = path;
    }

    /// Forgets every memoized configuration file.
    pub fn clear_cache(&self) {
        self.lock_files().clear();
    }

    fn lock_files(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, ConfigFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, path: &Path) -> std::result::Result<ConfigFile, ConfigFileError> {
        let mut files = self.lock_files();
        if let Some(file) = files.get(path) {
            return Ok(file.clone());
        }
        let file = ConfigFile::load(path)?;
        debug!(path = %path.display(), "configuration file loaded");
        files.insert(path.to_path_buf(), file.clone());
        Ok(file)
    }

    fn resolve(
        &self,
        variable: &str,
        entry: fn(&ConfigFile) -> Option<&String>,
        entry_name: &str,
    ) -> Result<String> {
        if let Some(value) = self.environment.var(variable).filter(|value| !value.is_empty()) {
            debug!(variable, "credential taken from environment");
            return Ok(value);
        }

        let file = self
            .configuration_file_path()
            .and_then(|path| self.load(&path))
            .map_err(|error| {
                debug!(variable, %error, "credential file unavailable");
                FacebookerError::configuration_missing(format!("{variable} is unset and {error}"))
            })?;

        entry(&file)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or_else(|| {
                FacebookerError::configuration_missing(format!(
                    "{variable} is unset and the configuration file has no '{entry_name}' entry"
                ))
            })
    }
}

impl<E: Environment> CredentialSource for CredentialResolver<E> {
    fn api_key(&self) -> Result<ApiKey> {
        let value = self.resolve(&self.config.api_key_var, |file| file.api.as_ref(), "api")?;
        ApiKey::new(value)
            .ok_or_else(|| FacebookerError::configuration_missing("the API key is blank"))
    }

    fn secret_key(&self) -> Result<Secret> {
        let value = self.resolve(
            &self.config.secret_key_var,
            |file| file.secret.as_ref(),
            "secret",
        )?;
        Secret::new(value)
            .ok_or_else(|| FacebookerError::configuration_missing("the account secret is blank"))
    }
}

impl<E> std::fmt::Debug for CredentialResolver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("config", &self.config)
            .field("path_override", &self.path_override)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StaticEnvironment;

    #[test]
    fn default_path_is_under_the_home_directory() {
        let resolver = CredentialResolver::with_environment(
            ResolverConfig::default(),
            StaticEnvironment::new().with_home_dir("/home/ari"),
        );
        assert_eq!(
            resolver.configuration_file_path().unwrap(),
            PathBuf::from("/home/ari/.facebookerrc")
        );
    }

    #[test]
    fn no_home_directory_means_no_default_path() {
        let resolver =
            CredentialResolver::with_environment(ResolverConfig::default(), StaticEnvironment::new());
        assert!(matches!(
            resolver.configuration_file_path(),
            Err(ConfigFileError::HomeDirectoryUnavailable)
        ));
        assert!(matches!(
            resolver.api_key(),
            Err(FacebookerError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn override_wins_and_none_restores_the_configured_path() {
        let config = ResolverConfig {
            configuration_file_path: Some(PathBuf::from("/etc/facebooker.toml")),
            ..ResolverConfig::default()
        };
        let mut resolver = CredentialResolver::with_environment(config, StaticEnvironment::new());

        resolver.set_configuration_file_path(Some(PathBuf::from("/tmp/other.toml")));
        assert_eq!(
            resolver.configuration_file_path().unwrap(),
            PathBuf::from("/tmp/other.toml")
        );

        resolver.set_configuration_file_path(None);
        assert_eq!(
            resolver.configuration_file_path().unwrap(),
            PathBuf::from("/etc/facebooker.toml")
        );
    }

    #[test]
    fn empty_variables_count_as_unset() {
        let resolver = CredentialResolver::with_environment(
            ResolverConfig::default(),
            StaticEnvironment::new().with_var(DEFAULT_API_KEY_VAR, ""),
        );
        assert!(matches!(
            resolver.api_key(),
            Err(FacebookerError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn secrets_are_not_in_debug_output() {
        let resolver = CredentialResolver::with_environment(
            ResolverConfig::default(),
            StaticEnvironment::new().with_var(DEFAULT_SECRET_KEY_VAR, "7654321"),
        );
        assert!(!format!("{resolver:?}").contains("7654321"));
    }
}
