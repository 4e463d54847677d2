pub mod auth;

pub use auth::AuthHandler;
