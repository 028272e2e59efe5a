use uuid::Uuid;

use crate::auth::Role;
use crate::error::ApiError;

/// The authenticated caller as seen by authorization checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

/// Role gate: permits the call iff `role` is one of `allowed`.
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("User role {} is not authorized to access this route", role)))
    }
}

/// Roles exempt from ownership checks.
pub const ELEVATED_ROLES: &[Role] = &[Role::Admin];

/// Owner-or-elevated check for mutating a resource.
pub fn check_ownership(owner_id: Uuid, identity: &Identity) -> Result<(), ApiError> {
    check_ownership_with(owner_id, identity, ELEVATED_ROLES)
}

pub fn check_ownership_with(owner_id: Uuid, identity: &Identity, elevated: &[Role]) -> Result<(), ApiError> {
    if owner_id == identity.id || elevated.contains(&identity.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "User {} is not authorized to modify this resource",
            identity.id
        )))
    }
}
