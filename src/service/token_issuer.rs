//! HS256 session tokens keyed by the stored signing secret.

use crate::error::GatehouseError;
use crate::service::secret_manager::SecretManager;
use crate::types::{Account, SessionClaims};
use backon::{ConstantBuilder, Retryable};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub struct TokenIssuer {
    secrets: SecretManager,
}

impl TokenIssuer {
    pub fn new(secrets: SecretManager) -> Self {
        Self { secrets }
    }

    /// Sign a 24h session token for `account`.
    ///
    /// A failed attempt (secret missing, undecodable, or signing error) is
    /// retried exactly once before giving up.
    pub async fn issue(&self, account: &Account) -> Result<String, GatehouseError> {
        let policy = ConstantBuilder::default()
            .with_delay(Duration::ZERO)
            .with_max_times(1);

        (|| self.try_issue(account))
            .retry(policy)
            .notify(|err: &GatehouseError, _| {
                warn!(user_id = account.id, error = %err, "token issuance failed; retrying");
            })
            .await
            .map_err(|e| match e {
                GatehouseError::Token(_) => e,
                other => GatehouseError::Token(other.to_string()),
            })
    }

    async fn try_issue(&self, account: &Account) -> Result<String, GatehouseError> {
        // Re-read after ensuring: a racing writer may have won.
        let secret = match self.secrets.get().await {
            Ok(secret) => secret,
            Err(GatehouseError::SecretNotFound) => {
                self.secrets.ensure().await?;
                self.secrets.get().await?
            }
            Err(e) => return Err(e),
        };

        let claims = SessionClaims::for_account(account, Utc::now());
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&secret),
        )
        .map_err(|e| GatehouseError::Token(e.to_string()))
    }

    /// Check signature and expiry against the current secret.
    pub async fn verify(&self, token: &str) -> Result<SessionClaims, GatehouseError> {
        let secret = self.secrets.get().await?;
        let claims = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(&secret),
            &Validation::new(Algorithm::HS256),
        )?
        .claims;
        Ok(claims)
    }
}
