//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use facebooker::{UserId, UserPair, DEFAULT_ENDPOINT, DEFAULT_LOGIN_URL};
use url::Url;

/// Talk to the social-graph REST service from the shell.
#[derive(Debug, Parser)]
#[command(name = "facebooker", version, about)]
pub struct Cli {
    /// Credentials file (TOML with `api` and `secret`). Defaults to ~/.facebookerrc.
    #[arg(long, global = true, env = "FACEBOOKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// REST endpoint every call is posted to.
    #[arg(long, global = true, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,

    /// Browser login page used by `login-url`.
    #[arg(long, global = true, default_value = DEFAULT_LOGIN_URL)]
    pub login_url: Url,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Start from a secured session with this session key.
    #[arg(long, global = true, env = "FACEBOOK_SESSION_KEY", requires = "session_secret")]
    pub session_key: Option<String>,

    /// Session secret paired with `--session-key`.
    #[arg(
        long,
        global = true,
        env = "FACEBOOK_SESSION_SECRET",
        hide_env_values = true,
        requires = "session_key"
    )]
    pub session_secret: Option<String>,

    /// Session expiry in epoch seconds; 0 never expires.
    #[arg(long, global = true, default_value_t = 0)]
    pub expires: i64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an FQL query and print the mapped rows.
    Fql {
        /// The query text.
        query: String,
    },

    /// Check friendship for one or more `UID:UID` pairs in a single call.
    AreFriends {
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<UserPair>,
    },

    /// List the session user's friends (requires a secured session).
    Friends,

    /// Fetch profile fields for users.
    Users {
        /// Comma-separated user ids.
        #[arg(required = true, value_delimiter = ',')]
        uids: Vec<UserId>,

        /// Comma-separated field names.
        #[arg(long, value_delimiter = ',', default_value = "uid,name")]
        fields: Vec<String>,
    },

    /// Request an auth token for the login flow.
    CreateToken,

    /// Print the browser login URL for an auth token.
    LoginUrl {
        token: String,
    },
}

impl Command {
    /// Stable name recorded on the root span.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fql { .. } => "fql",
            Self::AreFriends { .. } => "are-friends",
            Self::Friends => "friends",
            Self::Users { .. } => "users",
            Self::CreateToken => "create-token",
            Self::LoginUrl { .. } => "login-url",
        }
    }
}

/// Parses `A:B` into a [`UserPair`].
pub fn parse_pair(raw: &str) -> Result<UserPair, String> {
    let (first, second) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected UID:UID, got {raw:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u64>()
            .map_err(|error| format!("invalid uid {part:?} in {raw:?}: {error}"))
    };
    Ok(UserPair::new(parse(first)?, parse(second)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case::plain("222332:222333", UserPair::new(222332, 222333))]
    #[case::padded(" 1240077 : 1240079 ", UserPair::new(1240077, 1240079))]
    fn pairs_parse(#[case] raw: &str, #[case] expected: UserPair) {
        assert_eq!(parse_pair(raw), Ok(expected));
    }

    #[rstest]
    #[case::missing_separator("222332")]
    #[case::not_a_number("ari:ruchi")]
    #[case::negative("-1:2")]
    fn bad_pairs_are_rejected(#[case] raw: &str) {
        assert!(parse_pair(raw).is_err());
    }

    #[test]
    fn are_friends_takes_several_pairs() {
        let cli =
            Cli::try_parse_from(["facebooker", "are-friends", "222332:222333", "1240077:1240079"])
                .unwrap();
        let Command::AreFriends { pairs } = cli.command else {
            panic!("parsed {:?}", cli.command);
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(cli.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(cli.timeout_secs, 30);
    }

    #[test]
    fn users_split_ids_and_fields_on_commas() {
        let cli = Cli::try_parse_from([
            "facebooker",
            "users",
            "211031,4801660",
            "--fields",
            "name,pic",
        ])
        .unwrap();
        let Command::Users { uids, fields } = cli.command else {
            panic!("parsed {:?}", cli.command);
        };
        assert_eq!(uids, vec![UserId::new(211031), UserId::new(4801660)]);
        assert_eq!(fields, ["name", "pic"]);
    }

    #[test]
    fn a_session_key_needs_its_secret() {
        let result = Cli::try_parse_from(["facebooker", "--session-key", "abc", "friends"]);
        assert!(result.is_err());
    }
}
