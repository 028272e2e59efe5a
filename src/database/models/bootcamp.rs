use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::database::store::Document;
use crate::error::ApiError;

use super::validation::{normalize_email, FieldErrors};

pub const CAREERS: [&str; 6] = [
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bootcamp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub careers: Vec<String>,
    pub average_rating: Option<f64>,
    pub average_cost: Option<f64>,
    pub photo: String,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootcampPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl BootcampPayload {
    pub fn validate(&self, partial: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, partial, "Please add a name");
        errors.not_blank("name", self.name.as_deref(), "Please add a name");
        errors.max_len("name", self.name.as_deref(), 50, "Name can not be more than 50 characters");
        errors.require("description", &self.description, partial, "Please add a description");
        errors.max_len("description", self.description.as_deref(), 500, "Description can not be more than 500 characters");
        errors.require("address", &self.address, partial, "Please add an address");
        errors.not_blank("address", self.address.as_deref(), "Please add an address");
        errors.max_len("phone", self.phone.as_deref(), 20, "Phone number can not be longer than 20 characters");
        errors.email("email", self.email.as_deref().map(str::trim));
        if let Some(ref website) = self.website {
            if !is_http_url(website) {
                errors.add("website", "Please use a valid URL with HTTP or HTTPS");
            }
        }
        errors.require("careers", &self.careers, partial, "Please add at least one career");
        if let Some(ref careers) = self.careers {
            if careers.is_empty() {
                errors.add("careers", "Please add at least one career");
            } else if let Some(bad) = careers.iter().find(|c| !CAREERS.contains(&c.as_str())) {
                errors.add("careers", format!("{} is not a supported career", bad));
            }
        }
        errors.into_result()
    }

    pub fn into_bootcamp(self, owner: Uuid) -> Bootcamp {
        let name = self.name.unwrap_or_default().trim().to_string();
        Bootcamp {
            id: Uuid::new_v4(),
            user_id: owner,
            slug: slugify(&name),
            name,
            description: self.description.unwrap_or_default(),
            website: self.website,
            phone: self.phone,
            email: self.email.as_deref().map(normalize_email),
            address: self.address.unwrap_or_default(),
            careers: self.careers.unwrap_or_default(),
            average_rating: None,
            average_cost: None,
            photo: DEFAULT_PHOTO.to_string(),
            housing: self.housing.unwrap_or(false),
            job_assistance: self.job_assistance.unwrap_or(false),
            job_guarantee: self.job_guarantee.unwrap_or(false),
            accept_gi: self.accept_gi.unwrap_or(false),
            created_at: Utc::now(),
        }
    }

    /// Changes for a partial update; renaming also refreshes the slug.
    pub fn into_changes(self) -> Document {
        let mut changes = Document::new();
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            changes.insert("slug".into(), json!(slugify(&name)));
            changes.insert("name".into(), json!(name));
        }
        let optional = [
            ("description", self.description),
            ("website", self.website),
            ("phone", self.phone),
            ("email", self.email.as_deref().map(normalize_email)),
            ("address", self.address),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                changes.insert(field.into(), json!(value));
            }
        }
        if let Some(careers) = self.careers {
            changes.insert("careers".into(), json!(careers));
        }
        let flags = [
            ("housing", self.housing),
            ("job_assistance", self.job_assistance),
            ("job_guarantee", self.job_guarantee),
            ("accept_gi", self.accept_gi),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                changes.insert(field.into(), json!(value));
            }
        }
        changes
    }
}

/// URL-safe lowercase slug: runs of non-alphanumerics collapse to one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn is_http_url(value: &str) -> bool {
    matches!(url::Url::parse(value), Ok(u) if matches!(u.scheme(), "http" | "https") && u.host().is_some())
}
