//! Signup: validation, uniqueness, bootstrap role, persistence, token.

use crate::db::{AccountsStorage, NewAccount, SettingsStorage};
use crate::error::{GatehouseError, StorageContext};
use crate::service::credential_store::CredentialStore;
use crate::service::secret_manager::SecretManager;
use crate::service::token_issuer::TokenIssuer;
use crate::types::{Account, AuthSession, Role};
use tracing::{debug, info};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const MISSING_FIELDS: &str = "username, email and password are required";
pub const PASSWORD_TOO_SHORT: &str = "password must be at least 6 characters long";
pub const USERNAME_TAKEN: &str = "username already exists";
pub const EMAIL_TAKEN: &str = "email already registered";

#[derive(Clone)]
pub struct AccountRegistrar {
    accounts: AccountsStorage,
    credentials: CredentialStore,
    tokens: TokenIssuer,
}

impl AccountRegistrar {
    pub fn new(accounts: AccountsStorage, credentials: CredentialStore, tokens: TokenIssuer) -> Self {
        Self {
            accounts,
            credentials,
            tokens,
        }
    }

    /// Create an account and return it with a fresh session token.
    ///
    /// The first account ever created becomes admin and provisions the
    /// signing secret in the same transaction.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, GatehouseError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(GatehouseError::Validation(MISSING_FIELDS.to_string()));
        }
        // Measured in bytes of UTF-8.
        if password.len() < MIN_PASSWORD_LEN {
            return Err(GatehouseError::Validation(PASSWORD_TOO_SHORT.to_string()));
        }

        // Fast path only; the unique constraints are the real guard.
        if self
            .accounts
            .username_taken(username)
            .await
            .storage("failed to check username existence")?
        {
            return Err(GatehouseError::Conflict(USERNAME_TAKEN.to_string()));
        }
        if self
            .accounts
            .email_taken(email)
            .await
            .storage("failed to check email existence")?
        {
            return Err(GatehouseError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = self.credentials.hash_async(password).await?;

        let mut tx = self
            .accounts
            .pool()
            .begin()
            .await
            .storage("failed to begin transaction")?;

        let bootstrap = SettingsStorage::claim_bootstrap(&mut tx)
            .await
            .storage("failed to claim bootstrap flag")?;
        let role = if bootstrap {
            SecretManager::ensure_on(&mut tx).await?;
            Role::Admin
        } else {
            Role::Member
        };

        let new = NewAccount {
            username,
            email,
            password_hash: &password_hash,
            role,
        };
        let row = AccountsStorage::insert(&mut tx, new)
            .await
            .map_err(conflict_or_storage)?;
        let account = Account::try_from(row)?;

        if bootstrap {
            SettingsStorage::mark_bootstrap(&mut tx, account.id)
                .await
                .storage("failed to record bootstrap account")?;
        }
        tx.commit().await.storage("failed to create user")?;

        info!(
            user_id = account.id,
            username = %account.username,
            role = %account.user_role,
            "account created"
        );
        if account.is_admin() {
            info!(user_id = account.id, "bootstrap admin provisioned");
        }

        let token = self.tokens.issue(&account).await?;
        Ok(AuthSession { account, token })
    }
}

/// A lost insert race surfaces exactly like the pre-check would have.
fn conflict_or_storage(e: sqlx::Error) -> GatehouseError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            debug!(error = %db, "unique constraint rejected signup");
            if db.message().contains("users.email") {
                GatehouseError::Conflict(EMAIL_TAKEN.to_string())
            } else {
                GatehouseError::Conflict(USERNAME_TAKEN.to_string())
            }
        }
        _ => GatehouseError::Storage {
            context: "failed to create user",
            source: e,
        },
    }
}
