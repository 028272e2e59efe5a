use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// bcrypt with a fresh random salt per call.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    Ok(bcrypt::verify(plaintext, hash)?)
}

/// `hash_password` on the blocking pool.
pub async fn hash_password_blocking(plaintext: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext, cost)).await?
}

/// `verify_password` on the blocking pool.
pub async fn verify_password_blocking(plaintext: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash)).await?
}
