use crate::db::MigrationRecord;
use crate::state::GatehouseState;
use crate::types::{ApiResponse, AuthSession, SessionClaims};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub username: String,
    pub password: String,
}

/// Thin shell over the services: every call answers with an [`ApiResponse`]
/// carrying the error message verbatim.
#[derive(Clone)]
pub struct AuthHandler {
    state: GatehouseState,
}

impl AuthHandler {
    pub fn new(state: GatehouseState) -> Self {
        Self { state }
    }

    pub async fn signup(&self, req: SignupRequest) -> ApiResponse<AuthSession> {
        debug!(username = %req.username, "signup requested");
        self.state
            .registrar
            .signup(&req.username, &req.email, &req.password)
            .await
            .into()
    }

    pub async fn login(&self, req: LoginRequest) -> ApiResponse<AuthSession> {
        debug!(ident = %req.username, "login requested");
        self.state
            .authenticator
            .login(&req.username, &req.password)
            .await
            .into()
    }

    pub async fn verify(&self, token: &str) -> ApiResponse<SessionClaims> {
        self.state.tokens.verify(token).await.into()
    }

    pub async fn migrations(&self) -> ApiResponse<Vec<MigrationRecord>> {
        self.state.ledger.list().await.into()
    }
}
