//! Session: credential state and signed remote calls.
//!
//! A [`Session`] starts **unsecured**, signing with the account secret. Once
//! given a session key, session secret, and expiry it becomes **secured** and
//! signs with the session secret instead. The transition happens once; a new
//! identity needs a new `Session`.
//!
//! Every operation funnels through [`Session::call_method`], which performs
//! exactly one outbound request and never retries.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::mapper::ResponseMapper;
use crate::objects::{DomainObject, User};
use crate::ports::{CredentialSource, Transport};
use crate::registry::Registry;
use crate::signer::{SignedRequest, SIGNATURE_PARAMETER};
use crate::{
    ApiKey, ApiVersion, AuthToken, Credentials, FacebookerError, Friendship, Result, Secret,
    SessionKey, Timestamp, UserId, UserPair, Value,
};

/// Default REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://api.facebook.com/restserver.php";
/// Default browser login page.
pub const DEFAULT_LOGIN_URL: &str = "http://www.facebook.com/login.php";

const METHOD_NAMESPACE: &str = "facebook.";
const RESERVED_PARAMETERS: [&str; 6] = [
    "method",
    "api_key",
    "v",
    "call_id",
    "session_key",
    SIGNATURE_PARAMETER,
];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where and how a session talks to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// REST endpoint every call is posted to.
    pub endpoint: String,
    /// Browser login page used by [`Session::login_url`].
    pub login_url: String,
    /// Protocol version sent as `v`.
    pub api_version: ApiVersion,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            login_url: DEFAULT_LOGIN_URL.to_owned(),
            api_version: ApiVersion::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum SessionState {
    Unsecured,
    Secured {
        session_key: SessionKey,
        session_secret: Secret,
        /// `None` when the service issued a non-expiring session.
        expires: Option<Timestamp>,
    },
}

/// An authenticated conversation with the service.
///
/// Calls take `&self`, but a single session is not meant to be driven from
/// several tasks at once; independent sessions are.
pub struct Session {
    credentials: Credentials,
    state: SessionState,
    user_id: Option<UserId>,
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    mapper: ResponseMapper,
    last_call_id: AtomicU64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &self.credentials.api_key)
            .field("secured", &self.is_secured())
            .field("user_id", &self.user_id)
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an unsecured session with the default configuration.
    pub fn create(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(credentials, transport, SessionConfig::default())
    }

    /// Creates an unsecured session with an explicit configuration.
    pub fn with_config(
        credentials: Credentials,
        transport: Arc<dyn Transport>,
        config: SessionConfig,
    ) -> Self {
        Self {
            credentials,
            state: SessionState::Unsecured,
            user_id: None,
            config,
            transport,
            mapper: ResponseMapper::default(),
            last_call_id: AtomicU64::new(0),
        }
    }

    /// Resolves credentials from `source` and creates an unsecured session.
    ///
    /// # Errors
    ///
    /// Propagates [`FacebookerError::ConfigurationMissing`] from the source.
    pub fn from_source(
        source: &dyn CredentialSource,
        transport: Arc<dyn Transport>,
        config: SessionConfig,
    ) -> Result<Self> {
        Ok(Self::with_config(source.credentials()?, transport, config))
    }

    /// Replaces the registry used to map replies.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.mapper = ResponseMapper::new(registry);
        self
    }

    // -- state -------------------------------------------------------------

    /// Secures the session. `expires_at` is in epoch seconds; `0` means the
    /// session never expires.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::InvalidSessionState`] if the session is already
    /// secured or `expires_at` is out of range.
    pub fn secure_with(
        &mut self,
        session_key: SessionKey,
        session_secret: Secret,
        expires_at: i64,
    ) -> Result<()> {
        if self.is_secured() {
            return Err(FacebookerError::InvalidSessionState {
                detail: "session is already secured; create a new Session to change identity"
                    .to_owned(),
            });
        }
        let expires = match expires_at {
            0 => None,
            seconds => Some(Timestamp::from_epoch_seconds(seconds).ok_or_else(|| {
                FacebookerError::InvalidSessionState {
                    detail: format!("expiry {seconds} is not a valid epoch time"),
                }
            })?),
        };

        debug!(?expires, "session secured");
        self.state = SessionState::Secured {
            session_key,
            session_secret,
            expires,
        };
        Ok(())
    }

    /// `true` once [`Session::secure_with`] or [`Session::secure`] succeeded.
    pub fn is_secured(&self) -> bool {
        matches!(self.state, SessionState::Secured { .. })
    }

    /// The application's API key.
    pub fn api_key(&self) -> &ApiKey {
        &self.credentials.api_key
    }

    /// The session key, once secured.
    pub fn session_key(&self) -> Option<&SessionKey> {
        match &self.state {
            SessionState::Secured { session_key, .. } => Some(session_key),
            SessionState::Unsecured => None,
        }
    }

    /// When the session expires; `None` if unsecured or non-expiring.
    pub fn expires_at(&self) -> Option<Timestamp> {
        match &self.state {
            SessionState::Secured { expires, .. } => *expires,
            SessionState::Unsecured => None,
        }
    }

    /// `true` if the session is secured with an expiry at or before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|expires| expires <= now)
    }

    /// The user the session belongs to, when learned through [`Session::secure`].
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn active_secret(&self) -> &Secret {
        match &self.state {
            SessionState::Secured { session_secret, .. } => session_secret,
            SessionState::Unsecured => &self.credentials.secret,
        }
    }

    // -- generic call ------------------------------------------------------

    /// Builds and signs the full parameter set for `method`.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::ReservedParameter`] if `parameters` sets a name the
    /// session manages (`method`, `api_key`, `v`, `call_id`, `session_key`,
    /// `sig`).
    pub fn sign_request(
        &self,
        method: &str,
        mut parameters: BTreeMap<String, String>,
    ) -> Result<SignedRequest> {
        if let Some(name) = RESERVED_PARAMETERS
            .iter()
            .find(|name| parameters.contains_key(**name))
        {
            return Err(FacebookerError::ReservedParameter {
                name: (*name).to_owned(),
            });
        }

        let qualified = if method.starts_with(METHOD_NAMESPACE) {
            method.to_owned()
        } else {
            format!("{METHOD_NAMESPACE}{method}")
        };
        parameters.insert("method".to_owned(), qualified);
        parameters.insert("api_key".to_owned(), self.credentials.api_key.to_string());
        parameters.insert("v".to_owned(), self.config.api_version.to_string());
        parameters.insert("call_id".to_owned(), self.next_call_id().to_string());
        if let Some(session_key) = self.session_key() {
            parameters.insert("session_key".to_owned(), session_key.to_string());
        }

        Ok(SignedRequest::new(parameters, self.active_secret()))
    }

    /// Calls `method` with `parameters` and maps the reply.
    ///
    /// Performs exactly one request through the transport.
    ///
    /// # Errors
    ///
    /// Transport failures pass through as [`FacebookerError::Transport`];
    /// reply problems surface as documented on [`ResponseMapper::parse`].
    #[instrument(skip(self, parameters), fields(secured = self.is_secured()))]
    pub async fn call_method(
        &self,
        method: &str,
        parameters: BTreeMap<String, String>,
    ) -> Result<Value> {
        let request = self.sign_request(method, parameters)?;
        debug!(
            parameter_count = request.parameters().len(),
            "posting signed request"
        );
        let body = self
            .transport
            .post_form(&self.config.endpoint, &request.into_form())
            .await?;
        self.mapper.parse(&body, method)
    }

    /// Strictly increasing per session, seeded from the wall clock.
    fn next_call_id(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
        let previous = self.last_call_id.fetch_max(now, Ordering::Relaxed);
        if previous >= now {
            self.last_call_id.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            now
        }
    }

    // -- operations --------------------------------------------------------

    /// Asks whether each pair of users are friends, in one request.
    ///
    /// The result has one entry per distinct input pair. An empty input
    /// returns an empty map without calling the service.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::ProtocolMismatch`] if the reply's element count or
    /// echoed ids disagree with the request; no partial map is returned.
    #[instrument(skip(self, pairs), fields(pair_count = pairs.len()))]
    pub async fn check_friendship(
        &self,
        pairs: &[UserPair],
    ) -> Result<BTreeMap<UserPair, Friendship>> {
        if pairs.is_empty() {
            return Ok(BTreeMap::new());
        }

        let parameters = BTreeMap::from([
            ("uids1".to_owned(), join_ids(pairs.iter().map(|pair| pair.first))),
            ("uids2".to_owned(), join_ids(pairs.iter().map(|pair| pair.second))),
        ]);
        let items = self
            .call_method("friends.areFriends", parameters)
            .await?
            .into_items();
        if items.len() != pairs.len() {
            warn!(
                requested = pairs.len(),
                returned = items.len(),
                "friendship reply size mismatch"
            );
            return Err(FacebookerError::protocol_mismatch(format!(
                "asked about {} pairs, reply describes {}",
                pairs.len(),
                items.len()
            )));
        }

        let mut answers = BTreeMap::new();
        for (pair, item) in pairs.iter().zip(items) {
            let Value::Object(DomainObject::FriendInfo(info)) = item else {
                return Err(FacebookerError::protocol_mismatch(format!(
                    "expected friend_info for pair {pair}"
                )));
            };
            let echoed = (
                info.uid1.unwrap_or(pair.first),
                info.uid2.unwrap_or(pair.second),
            );
            if echoed != (pair.first, pair.second) {
                return Err(FacebookerError::protocol_mismatch(format!(
                    "reply for pair {pair} describes {}:{}",
                    echoed.0, echoed.1
                )));
            }
            answers.insert(*pair, info.are_friends);
        }
        Ok(answers)
    }

    /// Runs an FQL query. The element type of the result is whatever the
    /// reply's tags resolve to: registered objects, records, or scalars.
    ///
    /// # Errors
    ///
    /// As for [`Session::call_method`].
    pub async fn fql_query(&self, query: &str) -> Result<Vec<Value>> {
        let parameters = BTreeMap::from([("query".to_owned(), query.to_owned())]);
        Ok(self.call_method("fql.query", parameters).await?.into_items())
    }

    /// Lists the session user's friends.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::ProtocolMismatch`] if an entry is not a user id.
    pub async fn friends(&self) -> Result<Vec<UserId>> {
        self.call_method("friends.get", BTreeMap::new())
            .await?
            .into_items()
            .into_iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|uid| u64::try_from(uid).ok())
                    .map(UserId::new)
                    .ok_or_else(|| {
                        FacebookerError::protocol_mismatch(format!(
                            "friends.get returned a non-uid entry {item:?}"
                        ))
                    })
            })
            .collect()
    }

    /// Fetches `fields` for each of `uids`.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::ProtocolMismatch`] if an entry is not a `user`.
    pub async fn users_info(&self, uids: &[UserId], fields: &[&str]) -> Result<Vec<User>> {
        let parameters = BTreeMap::from([
            ("uids".to_owned(), join_ids(uids.iter().copied())),
            ("fields".to_owned(), fields.join(",")),
        ]);
        self.call_method("users.getInfo", parameters)
            .await?
            .into_items()
            .into_iter()
            .map(|item| match item {
                Value::Object(DomainObject::User(user)) => Ok(user),
                other => Err(FacebookerError::protocol_mismatch(format!(
                    "users.getInfo returned {other:?}"
                ))),
            })
            .collect()
    }

    // -- login flow --------------------------------------------------------

    /// Requests a one-shot auth token for the login flow.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::ProtocolMismatch`] if the reply is not a token.
    pub async fn create_token(&self) -> Result<AuthToken> {
        let reply = self.call_method("auth.createToken", BTreeMap::new()).await?;
        reply
            .to_wire_text()
            .and_then(AuthToken::new)
            .ok_or_else(|| FacebookerError::protocol_mismatch("auth.createToken returned no token"))
    }

    /// Browser URL where the user logs in and authorises `auth_token`.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::ConfigurationError`] if the configured login page
    /// is not a valid URL.
    pub fn login_url(&self, auth_token: &AuthToken) -> Result<Url> {
        let version = self.config.api_version.to_string();
        Url::parse_with_params(
            &self.config.login_url,
            [
                ("api_key", self.credentials.api_key.as_str()),
                ("v", version.as_str()),
                ("auth_token", auth_token.as_str()),
            ],
        )
        .map_err(|error| FacebookerError::ConfigurationError {
            message: format!("login URL {:?}: {error}", self.config.login_url),
        })
    }

    /// Exchanges an authorised `auth_token` for a session and secures this
    /// session with it.
    ///
    /// # Errors
    ///
    /// [`FacebookerError::InvalidSessionState`] if already secured (checked
    /// before any request is made); [`FacebookerError::ProtocolMismatch`] if
    /// the reply lacks a session key or carries an `expires` that is not an
    /// integer. A missing or nil `expires` secures a non-expiring session.
    #[instrument(skip_all)]
    pub async fn secure(&mut self, auth_token: &AuthToken) -> Result<()> {
        if self.is_secured() {
            return Err(FacebookerError::InvalidSessionState {
                detail: "session is already secured".to_owned(),
            });
        }

        let parameters =
            BTreeMap::from([("auth_token".to_owned(), auth_token.as_str().to_owned())]);
        let reply = self.call_method("auth.getSession", parameters).await?;
        let record = reply.as_record().ok_or_else(|| {
            FacebookerError::protocol_mismatch("auth.getSession did not return a record")
        })?;

        let field = |name: &str| record.get(name).and_then(Value::to_wire_text);
        let session_key = field("session_key")
            .and_then(SessionKey::new)
            .ok_or_else(|| FacebookerError::protocol_mismatch("auth.getSession without session_key"))?;
        let session_secret = field("secret")
            .and_then(Secret::new)
            .unwrap_or_else(|| self.credentials.secret.clone());
        // An absent or nil expiry is a non-expiring session.
        let expires = match record.get("expires") {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                FacebookerError::protocol_mismatch(format!(
                    "auth.getSession returned a non-integer expiry {value:?}"
                ))
            })?,
        };
        let user_id = record
            .get("uid")
            .and_then(Value::as_i64)
            .and_then(|uid| u64::try_from(uid).ok())
            .map(UserId::new);

        self.secure_with(session_key, session_secret, expires)?;
        self.user_id = user_id;
        Ok(())
    }
}

fn join_ids(ids: impl Iterator<Item = UserId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}
