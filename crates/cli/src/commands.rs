//! Sub-command execution against a live session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use credentials::{CredentialResolver, ResolverConfig};
use facebooker::{ApiVersion, AuthToken, Secret, Session, SessionConfig, SessionKey};
use serde_json::json;
use tracing::info;
use transport::{HttpTransport, HttpTransportConfig};

use crate::cli::{Cli, Command};

/// Builds a session from the command line and runs the chosen command.
/// Returns the JSON document to print.
pub async fn run(cli: Cli) -> anyhow::Result<serde_json::Value> {
    let mut session = connect(&cli)?;
    execute(&mut session, cli.command).await
}

fn connect(cli: &Cli) -> anyhow::Result<Session> {
    let resolver = CredentialResolver::new(ResolverConfig {
        configuration_file_path: cli.config.clone(),
        ..ResolverConfig::default()
    });
    let transport = HttpTransport::new(HttpTransportConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
        ..HttpTransportConfig::default()
    })?;
    let config = SessionConfig {
        endpoint: cli.endpoint.to_string(),
        login_url: cli.login_url.to_string(),
        api_version: ApiVersion::default(),
    };
    let mut session = Session::from_source(&resolver, Arc::new(transport), config)?;

    if let (Some(key), Some(secret)) = (&cli.session_key, &cli.session_secret) {
        session.secure_with(
            SessionKey::new(key.as_str()).context("--session-key must not be empty")?,
            Secret::new(secret.as_str()).context("--session-secret must not be empty")?,
            cli.expires,
        )?;
        info!("starting from a secured session");
    }
    Ok(session)
}

async fn execute(session: &mut Session, command: Command) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        Command::Fql { query } => serde_json::to_value(session.fql_query(&query).await?)?,
        Command::AreFriends { pairs } => {
            let answers = session.check_friendship(&pairs).await?;
            answers
                .into_iter()
                .map(|(pair, friendship)| {
                    json!({
                        "uid1": pair.first,
                        "uid2": pair.second,
                        "are_friends": friendship.as_option(),
                    })
                })
                .collect()
        }
        Command::Friends => serde_json::to_value(session.friends().await?)?,
        Command::Users { uids, fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            serde_json::to_value(session.users_info(&uids, &fields).await?)?
        }
        Command::CreateToken => {
            let token = session.create_token().await?;
            let login_url = session.login_url(&token)?;
            json!({ "auth_token": token, "login_url": login_url })
        }
        Command::LoginUrl { token } => {
            let token = AuthToken::new(token).context("the auth token must not be empty")?;
            json!({ "login_url": session.login_url(&token)? })
        }
    };
    Ok(output)
}
