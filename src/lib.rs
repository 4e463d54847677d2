pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod migrate;
pub mod service;
pub mod state;
pub mod types;

pub use error::GatehouseError;
pub use handlers::AuthHandler;
pub use state::GatehouseState;
