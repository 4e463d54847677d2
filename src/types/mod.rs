pub mod account;
pub mod response;
pub mod session;

pub use account::{Account, Role};
pub use response::ApiResponse;
pub use session::{AuthSession, SessionClaims};
