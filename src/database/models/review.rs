use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::database::store::Document;
use crate::error::ApiError;

use super::validation::FieldErrors;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bootcamp_id: Uuid,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPayload {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}

impl ReviewPayload {
    pub fn validate(&self, partial: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title, partial, "Please add a title for the review");
        errors.not_blank("title", self.title.as_deref(), "Please add a title for the review");
        errors.max_len("title", self.title.as_deref(), 100, "Title can not be more than 100 characters");
        errors.require("text", &self.text, partial, "Please add some text");
        errors.require("rating", &self.rating, partial, "Please add a rating between 1 and 10");
        if matches!(self.rating, Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r)) {
            errors.add("rating", "Please add a rating between 1 and 10");
        }
        errors.into_result()
    }

    pub fn into_review(self, bootcamp_id: Uuid, owner: Uuid) -> Review {
        Review {
            id: Uuid::new_v4(),
            user_id: owner,
            bootcamp_id,
            title: self.title.unwrap_or_default().trim().to_string(),
            text: self.text.unwrap_or_default(),
            rating: self.rating.unwrap_or(MIN_RATING),
            created_at: Utc::now(),
        }
    }

    pub fn into_changes(self) -> Document {
        let mut changes = Document::new();
        if let Some(title) = self.title {
            changes.insert("title".into(), json!(title.trim()));
        }
        if let Some(text) = self.text {
            changes.insert("text".into(), json!(text));
        }
        if let Some(rating) = self.rating {
            changes.insert("rating".into(), json!(rating));
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_in_range() {
        for rating in [0, 11] {
            let p = ReviewPayload { title: Some("t".into()), text: Some("x".into()), rating: Some(rating) };
            assert!(p.validate(false).is_err());
        }
        let p = ReviewPayload { title: Some("t".into()), text: Some("x".into()), rating: Some(10) };
        assert!(p.validate(false).is_ok());
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let p = ReviewPayload { rating: Some(3), ..Default::default() };
        p.validate(true).unwrap();
        let changes = p.into_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["rating"], json!(3));
    }
}
