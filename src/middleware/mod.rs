pub mod auth;
pub mod json;
pub mod response;

pub use auth::{extract_token, CurrentUser, TOKEN_COOKIE};
pub use json::Body;
pub use response::{ApiResponse, ApiResult};
