pub mod auth;
pub mod require_admin;
pub mod response;

pub use auth::{require_auth, Identity};
pub use require_admin::require_admin;
pub use response::{ApiResponse, ApiResult};
