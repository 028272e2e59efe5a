use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;

pub static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email regex")
});

/// Collects per-field validation messages in the order they were found.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<(String, String)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        if !self.errors.iter().any(|(f, _)| f == field) {
            self.errors.push((field.to_string(), message.into()));
        }
    }

    /// Flags a missing value unless this is a partial update.
    pub fn require<T>(&mut self, field: &str, value: &Option<T>, partial: bool, message: &str) {
        if value.is_none() && !partial {
            self.add(field, message);
        }
    }

    pub fn not_blank(&mut self, field: &str, value: Option<&str>, message: &str) {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            self.add(field, message);
        }
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize, message: &str) {
        if matches!(value, Some(v) if v.chars().count() > max) {
            self.add(field, message);
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if matches!(value, Some(v) if !EMAIL_RE.is_match(v)) {
            self.add(field, "Please add a valid email");
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = self.errors.iter().map(|(_, m)| m.as_str()).collect::<Vec<_>>().join(", ");
        let field_errors: HashMap<String, String> = self.errors.into_iter().collect();
        Err(ApiError::validation_error(message, Some(field_errors)))
    }
}

/// Lowercased, trimmed email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
