// handlers/mod.rs - HTTP handlers grouped by resource
//
// Public:    /api/v1/auth (register, login, password reset), read-only resource lists
// Protected: CurrentUser extractor, then the role gate and ownership policy
// Elevated:  /api/v1/users (admin only)

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod root;
pub mod users;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::{Document, Store};
use crate::error::ApiError;
use crate::query::{populate, Populate};

/// Path ids that are not UUIDs can never match a resource.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>().map_err(|_| ApiError::resource_not_found(raw))
}

/// Body of a successful delete.
pub fn empty_data() -> Value {
    json!({})
}

/// Runs the populate step over a single document.
pub async fn populate_one(store: &dyn Store, doc: Document, with: &[Populate]) -> Result<Document, ApiError> {
    let mut docs = vec![doc];
    populate(store, &mut docs, with).await?;
    Ok(docs.pop().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id("5d713995b721c3bb38c1f5d0").unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Resource not found with id of 5d713995b721c3bb38c1f5d0");

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
