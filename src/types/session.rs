use crate::types::account::{Account, Role};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session lifetime in seconds; not configurable per call.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by a signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn for_account(account: &Account, now: DateTime<Utc>) -> Self {
        Self {
            user_id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.user_role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
        }
    }
}

/// What signup and login hand back to the shell.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    #[serde(flatten)]
    pub account: Account,
    pub token: String,
}
