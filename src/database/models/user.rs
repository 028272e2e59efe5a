use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{Identity, Role};
use crate::database::store::Document;
use crate::error::ApiError;

use super::validation::{normalize_email, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Stored identity, including credentials. Never serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub password: String,
    #[serde(default)]
    pub reset_password_token: Option<String>,
    #[serde(default)]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity { id: self.id, role: self.role }
    }
}

/// Client-facing view of an identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity { id: self.id, role: self.role }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.role,
            created_at: record.created_at,
        }
    }
}

/// Body of register and of the admin user endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UserPayload {
    /// `allow_admin` is false for self-registration, which may only pick
    /// `user` or `publisher`.
    pub fn validate(&self, partial: bool, allow_admin: bool) -> Result<Option<Role>, ApiError> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, partial, "Please add a name");
        errors.not_blank("name", self.name.as_deref(), "Please add a name");
        errors.require("email", &self.email, partial, "Please add an email");
        errors.email("email", self.email.as_deref().map(str::trim));
        errors.require("password", &self.password, partial, "Please add a password");
        if matches!(self.password, Some(ref p) if p.chars().count() < MIN_PASSWORD_LEN) {
            errors.add("password", format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
        }

        let role = match self.role.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(Role::Admin) if !allow_admin => {
                    errors.add("role", "Role admin can not be self-assigned");
                    None
                }
                Ok(role) => Some(role),
                Err(_) => {
                    errors.add("role", format!("{} is not a valid role", raw));
                    None
                }
            },
        };

        errors.into_result()?;
        Ok(role)
    }

    /// Builds a new record around an already-hashed password.
    pub fn into_record(self, role: Option<Role>, password_hash: String) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_default().trim().to_string(),
            email: normalize_email(&self.email.unwrap_or_default()),
            role: role.unwrap_or_default(),
            password: password_hash,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        }
    }

    /// Changes for a partial update. The password, when present, must
    /// already be hashed by the caller.
    pub fn into_changes(self, role: Option<Role>, password_hash: Option<String>) -> Document {
        let mut changes = Document::new();
        if let Some(name) = self.name {
            changes.insert("name".into(), json!(name.trim()));
        }
        if let Some(email) = self.email {
            changes.insert("email".into(), json!(normalize_email(&email)));
        }
        if let Some(role) = role {
            changes.insert("role".into(), json!(role));
        }
        if let Some(hash) = password_hash {
            changes.insert("password".into(), json!(hash));
        }
        changes
    }
}
