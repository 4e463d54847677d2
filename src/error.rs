use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum GatehouseError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Never says whether the account or the password was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("signing secret not found")]
    SecretNotFound,

    #[error("invalid signing secret: {0}")]
    Secret(String),

    #[error("failed to generate session token: {0}")]
    Token(String),

    #[error("invalid session token: {0}")]
    TokenInvalid(#[from] jsonwebtoken::errors::Error),

    #[error("failed to execute migration {name}: {reason}")]
    Migration { name: String, reason: String },

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: SqlxError,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatehouseError {
    pub fn migration(name: impl Into<String>, reason: impl ToString) -> Self {
        GatehouseError::Migration {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code shown next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            GatehouseError::Validation(_) => "VALIDATION",
            GatehouseError::Conflict(_) => "CONFLICT",
            GatehouseError::InvalidCredentials | GatehouseError::TokenInvalid(_) => "UNAUTHORIZED",
            GatehouseError::SecretNotFound | GatehouseError::Secret(_) => "SECRET_ERROR",
            GatehouseError::Token(_) => "TOKEN_ERROR",
            GatehouseError::Migration { .. } => "MIGRATION_ERROR",
            GatehouseError::Storage { .. }
            | GatehouseError::DatabaseError(_)
            | GatehouseError::Credential(_)
            | GatehouseError::Config(_)
            | GatehouseError::Io(_) => "INTERNAL_ERROR",
        }
    }
}

/// Failures while hashing or checking a password credential.
#[derive(Debug, ThisError)]
pub enum CredentialError {
    #[error("failed to parse credential: {0}")]
    Parse(String),

    #[error("failed to decode credential: {0}")]
    Decode(String),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

impl From<argon2::password_hash::Error> for CredentialError {
    fn from(e: argon2::password_hash::Error) -> Self {
        use argon2::password_hash::Error as PhcError;
        match e {
            PhcError::B64Encoding(_) | PhcError::SaltInvalid(_) => {
                CredentialError::Decode(e.to_string())
            }
            other => CredentialError::Parse(other.to_string()),
        }
    }
}

/// Attach a human readable context to a storage failure.
pub trait StorageContext<T> {
    fn storage(self, context: &'static str) -> Result<T, GatehouseError>;
}

impl<T> StorageContext<T> for Result<T, SqlxError> {
    fn storage(self, context: &'static str) -> Result<T, GatehouseError> {
        self.map_err(|source| GatehouseError::Storage { context, source })
    }
}
