//! Login: lookup, verification, token.

use crate::db::AccountsStorage;
use crate::error::GatehouseError;
use crate::service::credential_store::CredentialStore;
use crate::service::token_issuer::TokenIssuer;
use crate::types::AuthSession;
use tracing::{debug, info, warn};

pub const MISSING_LOGIN_FIELDS: &str = "username and password are required";

#[derive(Clone)]
pub struct SessionAuthenticator {
    accounts: AccountsStorage,
    credentials: CredentialStore,
    tokens: TokenIssuer,
}

impl SessionAuthenticator {
    pub fn new(accounts: AccountsStorage, credentials: CredentialStore, tokens: TokenIssuer) -> Self {
        Self {
            accounts,
            credentials,
            tokens,
        }
    }

    /// Authenticate by username or email.
    ///
    /// Unknown account, wrong password and an unreadable stored credential all
    /// return [`GatehouseError::InvalidCredentials`].
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<AuthSession, GatehouseError> {
        if username_or_email.is_empty() || password.is_empty() {
            return Err(GatehouseError::Validation(MISSING_LOGIN_FIELDS.to_string()));
        }

        let Some(account) = self.accounts.find_by_login(username_or_email).await? else {
            // Spend the same Argon2 work so a miss is not observably faster.
            let _ = self.credentials.hash_async(password).await;
            debug!("login for unknown account");
            return Err(GatehouseError::InvalidCredentials);
        };

        let valid = self
            .credentials
            .verify_async(password, &account.password_hash)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id = account.id, error = %e, "stored credential could not be verified");
                false
            });
        if !valid {
            debug!(user_id = account.id, "password mismatch");
            return Err(GatehouseError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account).await?;
        info!(user_id = account.id, username = %account.username, "login successful");
        Ok(AuthSession { account, token })
    }
}
