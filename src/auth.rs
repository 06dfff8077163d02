use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PropdeskError, Result};
use crate::store::{Store, AUTH_TOKEN};
use crate::types::Role;

/// Who is signed in, persisted under the `auth_token` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: u64,
    #[serde(default)]
    pub name: String,
    pub role: Role,
}

impl Session {
    /// A session built from nothing but a token: browse as a buyer.
    fn guest(token: String) -> Self {
        Self {
            token,
            user_id: 0,
            name: "Guest".to_string(),
            role: Role::Buyer,
        }
    }
}

fn env_token(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve the session, trying in order:
/// 1. The env var named in config (overrides the stored token)
/// 2. The session stored by `login`
pub fn load_session(store: &Store, token_env: &str) -> Result<Session> {
    resolve(store.load::<Session>(AUTH_TOKEN), env_token(token_env), token_env)
}

fn resolve(stored: Option<Session>, env: Option<String>, token_env: &str) -> Result<Session> {
    match (stored, env) {
        (Some(session), Some(token)) => {
            debug!("using token from environment");
            Ok(Session { token, ..session })
        }
        (None, Some(token)) => Ok(Session::guest(token)),
        (Some(session), None) if !session.token.trim().is_empty() => Ok(session),
        _ => Err(PropdeskError::Auth(format!(
            "Not signed in. Run `propdesk login` or set {}.",
            token_env
        ))),
    }
}

pub fn login(store: &Store, session: &Session) -> Result<()> {
    if session.token.trim().is_empty() {
        return Err(PropdeskError::Validation("Token must not be empty".to_string()));
    }
    store.save(AUTH_TOKEN, session)
}

pub fn logout(store: &Store) -> Result<()> {
    store.remove(AUTH_TOKEN)
}
