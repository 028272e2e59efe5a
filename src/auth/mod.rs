pub mod password;
pub mod policy;
pub mod reset;
pub mod role;
pub mod token;

pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking, PasswordError};
pub use policy::{authorize, check_ownership, check_ownership_with, Identity, ELEVATED_ROLES};
pub use reset::{clear_reset_token, consume_reset_token, generate_reset_token, store_reset_token, ResetError, ResetToken};
pub use role::Role;
pub use token::{Claims, TokenError, TokenService};
