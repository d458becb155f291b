//! The credentials configuration file.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File name looked up in the home directory when no path is configured.
pub const DEFAULT_FILE_NAME: &str = ".facebookerrc";

/// Contents of the configuration file. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigFile {
    /// The application's API key.
    #[serde(default)]
    pub api: Option<String>,
    /// The application's account secret.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Reasons a configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no home directory to locate {DEFAULT_FILE_NAME} in")]
    HomeDirectoryUnavailable,
}

impl ConfigFile {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigFileError::Read`] if the file cannot be read (including when it
    /// does not exist), [`ConfigFileError::Parse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parses `text`; `path` is only used for diagnostics.
    ///
    /// # Errors
    ///
    /// [`ConfigFileError::Parse`] if `text` is not valid TOML of this shape.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigFileError> {
        toml::from_str(text).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let file = ConfigFile::parse(
            "api = \"1234567\"\nsecret = \"7654321\"\ncanvas_path = \"/apps/demo\"\n",
            Path::new("inline"),
        )
        .unwrap();
        assert_eq!(file.api.as_deref(), Some("1234567"));
        assert_eq!(file.secret.as_deref(), Some("7654321"));
    }

    #[test]
    fn entries_are_optional() {
        let file = ConfigFile::parse("secret = \"7654321\"\n", Path::new("inline")).unwrap();
        assert_eq!(file.api, None);
    }

    #[test]
    fn missing_files_report_the_path() {
        let error = ConfigFile::load(Path::new("/nonexistent/.facebookerrc")).unwrap_err();
        assert!(matches!(error, ConfigFileError::Read { .. }));
        assert!(error.to_string().contains("/nonexistent/.facebookerrc"));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let error = ConfigFile::parse("api: 1234567", Path::new("inline")).unwrap_err();
        assert!(matches!(error, ConfigFileError::Parse { .. }));
    }
}
