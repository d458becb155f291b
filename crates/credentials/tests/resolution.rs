//! Environment precedence, file fallback, and memoization.

use std::fs;
use std::path::{Path, PathBuf};

use credentials::{
    CredentialResolver, ResolverConfig, StaticEnvironment, DEFAULT_API_KEY_VAR,
    DEFAULT_SECRET_KEY_VAR,
};
use facebooker::{CredentialSource, FacebookerError};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const FILE_CONTENTS: &str = "api = \"file-api-key\"\nsecret = \"file-secret\"\n";

#[fixture]
fn home() -> TempDir {
    tempfile::tempdir().unwrap()
}

fn write_rc(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join(".facebookerrc");
    fs::write(&path, contents).unwrap();
    path
}

fn resolver(env: StaticEnvironment) -> CredentialResolver<StaticEnvironment> {
    CredentialResolver::with_environment(ResolverConfig::default(), env)
}

#[rstest]
fn environment_values_are_used_verbatim(home: TempDir) {
    write_rc(home.path(), FILE_CONTENTS);
    let resolver = resolver(
        StaticEnvironment::new()
            .with_home_dir(home.path())
            .with_var(DEFAULT_API_KEY_VAR, "1234567")
            .with_var(DEFAULT_SECRET_KEY_VAR, "7654321"),
    );

    let credentials = resolver.credentials().unwrap();
    assert_eq!(credentials.api_key.as_str(), "1234567");
    assert_eq!(credentials.secret.expose(), "7654321");
}

#[rstest]
fn unset_variables_fall_back_to_the_file(home: TempDir) {
    write_rc(home.path(), FILE_CONTENTS);
    let resolver = resolver(
        StaticEnvironment::new()
            .with_home_dir(home.path())
            .with_var(DEFAULT_API_KEY_VAR, "1234567"),
    );

    assert_eq!(resolver.api_key().unwrap().as_str(), "1234567");
    assert_eq!(resolver.secret_key().unwrap().expose(), "file-secret");
}

#[rstest]
#[case::no_file(None)]
#[case::file_without_entries(Some("canvas_path = \"/apps/demo\"\n"))]
#[case::unparsable_file(Some("api: 1234567\n"))]
fn nothing_to_resolve_is_configuration_missing(home: TempDir, #[case] contents: Option<&str>) {
    if let Some(contents) = contents {
        write_rc(home.path(), contents);
    }
    let resolver = resolver(StaticEnvironment::new().with_home_dir(home.path()));

    assert!(matches!(
        resolver.api_key(),
        Err(FacebookerError::ConfigurationMissing { .. })
    ));
    assert!(matches!(
        resolver.secret_key(),
        Err(FacebookerError::ConfigurationMissing { .. })
    ));
}

#[rstest]
fn a_file_created_after_a_failed_lookup_is_found(home: TempDir) {
    let resolver = resolver(StaticEnvironment::new().with_home_dir(home.path()));
    assert!(resolver.api_key().is_err());

    write_rc(home.path(), FILE_CONTENTS);
    assert_eq!(resolver.api_key().unwrap().as_str(), "file-api-key");
}

#[rstest]
fn successful_reads_are_memoized_until_the_cache_is_cleared(home: TempDir) {
    let path = write_rc(home.path(), FILE_CONTENTS);
    let resolver = resolver(StaticEnvironment::new().with_home_dir(home.path()));
    assert_eq!(resolver.api_key().unwrap().as_str(), "file-api-key");

    fs::write(&path, "api = \"rotated-key\"\nsecret = \"rotated-secret\"\n").unwrap();
    assert_eq!(resolver.api_key().unwrap().as_str(), "file-api-key");

    resolver.clear_cache();
    assert_eq!(resolver.api_key().unwrap().as_str(), "rotated-key");
}

#[rstest]
fn overriding_the_path_switches_files_and_none_resets_it(home: TempDir) {
    write_rc(home.path(), FILE_CONTENTS);
    let elsewhere = tempfile::tempdir().unwrap();
    let other = elsewhere.path().join("alternate.toml");
    fs::write(&other, "api = \"other-key\"\nsecret = \"other-secret\"\n").unwrap();

    let mut resolver = resolver(StaticEnvironment::new().with_home_dir(home.path()));
    resolver.set_configuration_file_path(Some(other.clone()));
    assert_eq!(resolver.configuration_file_path().unwrap(), other);
    assert_eq!(resolver.api_key().unwrap().as_str(), "other-key");

    resolver.set_configuration_file_path(None);
    assert_eq!(
        resolver.configuration_file_path().unwrap(),
        home.path().join(".facebookerrc")
    );
    assert_eq!(resolver.api_key().unwrap().as_str(), "file-api-key");
}

#[rstest]
fn custom_variable_names_are_honoured(home: TempDir) {
    let config = ResolverConfig {
        api_key_var: "MY_APP_KEY".to_owned(),
        secret_key_var: "MY_APP_SECRET".to_owned(),
        configuration_file_path: Some(home.path().join("missing.toml")),
    };
    let resolver = CredentialResolver::with_environment(
        config,
        StaticEnvironment::new()
            .with_var("MY_APP_KEY", "abc")
            .with_var("MY_APP_SECRET", "def")
            .with_var(DEFAULT_API_KEY_VAR, "ignored"),
    );

    let credentials = resolver.credentials().unwrap();
    assert_eq!(credentials.api_key.as_str(), "abc");
    assert_eq!(credentials.secret.expose(), "def");
}
