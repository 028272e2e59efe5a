pub mod account;
pub mod password;
pub mod session;

pub use account::{me, update_details, update_password};
pub use password::{forgot_password, reset_password};
pub use session::{login, logout, register, token_response};
