use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::user::UserRecord;
use crate::database::repository::Repository;
use crate::database::store::{DatabaseError, Document};

const RESET_TOKEN_BYTES: usize = 20;
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("Invalid or expired token")]
    InvalidOrExpired,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A freshly minted reset token. Only `digest` is ever stored; `plain` goes
/// to the user.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub plain: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate_reset_token() -> ResetToken {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plain = hex::encode(bytes);
    ResetToken {
        digest: digest_reset_token(&plain),
        plain,
        expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    }
}

pub fn digest_reset_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

/// Stores the digest and expiry of a new reset token on the identity.
pub async fn store_reset_token(
    users: &Repository<UserRecord>,
    user_id: Uuid,
    token: &ResetToken,
) -> Result<UserRecord, DatabaseError> {
    users
        .update_by_id(user_id, reset_fields(json!(token.digest), json!(token.expires_at)))
        .await
}

pub async fn clear_reset_token(users: &Repository<UserRecord>, user_id: Uuid) -> Result<UserRecord, DatabaseError> {
    users.update_by_id(user_id, reset_fields(Value::Null, Value::Null)).await
}

/// Sets the new password and clears the reset fields in one conditional
/// update, so a token can be redeemed at most once and only before it expires.
pub async fn consume_reset_token(
    users: &Repository<UserRecord>,
    plain: &str,
    new_password_hash: String,
) -> Result<UserRecord, ResetError> {
    let where_clause = json!({
        "reset_password_token": digest_reset_token(plain),
        "reset_password_expire": { "$gt": Utc::now().to_rfc3339() },
    });
    let mut changes = reset_fields(Value::Null, Value::Null);
    changes.insert("password".to_string(), json!(new_password_hash));

    users
        .update_where(where_clause, changes)
        .await?
        .pop()
        .ok_or(ResetError::InvalidOrExpired)
}

fn reset_fields(token: Value, expire: Value) -> Document {
    let mut doc = Document::new();
    doc.insert("reset_password_token".to_string(), token);
    doc.insert("reset_password_expire".to_string(), expire);
    doc
}
