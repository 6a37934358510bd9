//! Email/password authentication against the hosted identity service.
//!
//! The service issues short-lived ID tokens; [`AuthState`] keeps the
//! current session in memory and fans out changes to subscribers, the same
//! observer shape the web dashboard uses for its auth listener. There is
//! no token refresh: when a session expires the operator signs in again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// Collection holding one profile document per registered account.
pub const USERS_COLLECTION: &str = "usuarios";

/// An authenticated session as returned by the identity service.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

type Subscriber = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Handle returned by [`AuthState::subscribe`]; pass it back to
/// [`AuthState::unsubscribe`] to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSubscription {
    id: u64,
}

/// In-memory session holder with change notification.
#[derive(Default)]
pub struct AuthState {
    current: Mutex<Option<Session>>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It fires immediately with the current session
    /// and again on every change until unsubscribed. Listeners are always
    /// invoked with no internal lock held, so they may read the session or
    /// subscribe/unsubscribe from inside the callback.
    pub fn subscribe<F>(&self, listener: F) -> AuthSubscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Subscriber = Arc::new(listener);
        let current = self.current.lock().unwrap().clone();
        listener(current.as_ref());
        self.subscribers.lock().unwrap().insert(id, listener);
        AuthSubscription { id }
    }

    pub fn unsubscribe(&self, subscription: AuthSubscription) {
        self.subscribers.lock().unwrap().remove(&subscription.id);
    }

    /// The current session, if one is active.
    pub fn session(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    /// The current session, or an auth error when nobody is signed in.
    pub fn require_session(&self) -> Result<Session> {
        self.session()
            .ok_or_else(|| Error::AuthFailure("no active session".into()))
    }

    /// Install a previously-obtained session (app restart, tests).
    pub fn restore_session(&self, session: Session) {
        self.set_session(Some(session));
    }

    pub fn sign_out(&self) {
        info!("signing out");
        self.set_session(None);
    }

    fn set_session(&self, session: Option<Session>) {
        {
            let mut current = self.current.lock().unwrap();
            *current = session.clone();
        }
        // Snapshot the listeners and drop the lock before notifying, so a
        // callback can unsubscribe itself or register another listener.
        let listeners: Vec<Subscriber> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers.values().cloned().collect()
        };
        for listener in listeners {
            listener(session.as_ref());
        }
    }
}

/// Parse the identity service's sign-in/sign-up response body into a
/// session. `expiresIn` arrives as a string of seconds.
fn parse_identity_response(body: &Value) -> Result<Session> {
    let field = |name: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| Error::AuthFailure(format!("identity response is missing {name}")))
    };

    let expires_in: i64 = field("expiresIn")?
        .parse()
        .map_err(|_| Error::AuthFailure("identity response has a bad expiresIn".into()))?;

    Ok(Session {
        user_id: field("localId")?,
        email: field("email")?,
        id_token: field("idToken")?,
        expires_at: Utc::now() + Duration::seconds(expires_in),
    })
}

/// HTTP client for the identity endpoints.
pub struct AuthClient {
    client: Client,
    auth_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            auth_url: crate::store::normalize_base_url(&config.auth_url),
            api_key: config.api_key.clone(),
        })
    }

    async fn identity_request(&self, action: &str, body: Value) -> Result<Session> {
        let url = format!("{}/v1/accounts:{action}?key={}", self.auth_url, self.api_key);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::AuthFailure(format!("cannot reach the identity service: {e}")))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| Error::AuthFailure(format!("bad identity response: {e}")))?;

        if !status.is_success() {
            let code = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN");
            warn!(action, code, "identity request rejected");
            let message = match code {
                "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                    "invalid email or password".to_string()
                }
                "EMAIL_EXISTS" => "an account with this email already exists".to_string(),
                "TOO_MANY_ATTEMPTS_TRY_LATER" => {
                    "too many attempts, try again later".to_string()
                }
                other => format!("identity service error: {other}"),
            };
            return Err(Error::AuthFailure(message));
        }

        parse_identity_response(&body)
    }

    /// Sign in with email and password; on success the session is
    /// installed into `state` and notified to its subscribers.
    pub async fn sign_in(&self, state: &AuthState, email: &str, password: &str) -> Result<Session> {
        let session = self
            .identity_request(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        info!(email = %session.email, "signed in");
        state.restore_session(session.clone());
        Ok(session)
    }

    /// Create an account, write its profile document, and sign the new
    /// user in. A failed profile write fails the whole registration.
    pub async fn create_account(
        &self,
        state: &AuthState,
        store: &dyn DocumentStore,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        let session = self
            .identity_request(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        store
            .create(
                USERS_COLLECTION,
                json!({ "email": session.email, "uid": session.user_id }),
            )
            .await?;
        info!(email = %session.email, "account created");
        state.restore_session(session.clone());
        Ok(session)
    }
}
