pub mod authenticator;
pub mod credential_store;
pub mod registrar;
pub mod secret_manager;
pub mod token_issuer;

pub use authenticator::SessionAuthenticator;
pub use credential_store::CredentialStore;
pub use registrar::AccountRegistrar;
pub use secret_manager::SecretManager;
pub use token_issuer::TokenIssuer;
