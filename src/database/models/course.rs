use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::database::store::Document;
use crate::error::ApiError;

use super::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::str::FromStr for MinimumSkill {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(MinimumSkill::Beginner),
            "intermediate" => Ok(MinimumSkill::Intermediate),
            "advanced" => Ok(MinimumSkill::Advanced),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bootcamp_id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    pub scholarship_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<i32>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<String>,
    pub scholarship_available: Option<bool>,
}

impl CoursePayload {
    pub fn validate(&self, partial: bool) -> Result<Option<MinimumSkill>, ApiError> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title, partial, "Please add a course title");
        errors.not_blank("title", self.title.as_deref(), "Please add a course title");
        errors.require("description", &self.description, partial, "Please add a description");
        errors.require("weeks", &self.weeks, partial, "Please add number of weeks");
        if matches!(self.weeks, Some(w) if w <= 0) {
            errors.add("weeks", "Number of weeks must be positive");
        }
        errors.require("tuition", &self.tuition, partial, "Please add a tuition cost");
        if matches!(self.tuition, Some(t) if !t.is_finite() || t < 0.0) {
            errors.add("tuition", "Tuition cost can not be negative");
        }
        errors.require("minimum_skill", &self.minimum_skill, partial, "Please add a minimum skill");
        let skill = match self.minimum_skill.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<MinimumSkill>() {
                Ok(skill) => Some(skill),
                Err(_) => {
                    errors.add("minimum_skill", "Minimum skill must be beginner, intermediate or advanced");
                    None
                }
            },
        };
        errors.into_result()?;
        Ok(skill)
    }

    /// Call only after `validate(false)` succeeded.
    pub fn into_course(self, skill: MinimumSkill, bootcamp_id: Uuid, owner: Uuid) -> Course {
        Course {
            id: Uuid::new_v4(),
            user_id: owner,
            bootcamp_id,
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default(),
            weeks: self.weeks.unwrap_or_default(),
            tuition: self.tuition.unwrap_or_default(),
            minimum_skill: skill,
            scholarship_available: self.scholarship_available.unwrap_or(false),
            created_at: Utc::now(),
        }
    }

    pub fn into_changes(self, skill: Option<MinimumSkill>) -> Document {
        let mut changes = Document::new();
        if let Some(title) = self.title {
            changes.insert("title".into(), json!(title.trim()));
        }
        if let Some(description) = self.description {
            changes.insert("description".into(), json!(description));
        }
        if let Some(weeks) = self.weeks {
            changes.insert("weeks".into(), json!(weeks));
        }
        if let Some(tuition) = self.tuition {
            changes.insert("tuition".into(), json!(tuition));
        }
        if let Some(skill) = skill {
            changes.insert("minimum_skill".into(), json!(skill));
        }
        if let Some(scholarship) = self.scholarship_available {
            changes.insert("scholarship_available".into(), json!(scholarship));
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_required_fields_and_skill() {
        let p = CoursePayload {
            title: Some("Front End Web Development".into()),
            description: Some("HTML, CSS, JS".into()),
            weeks: Some(8),
            tuition: Some(8000.0),
            minimum_skill: Some("beginner".into()),
            scholarship_available: None,
        };
        let skill = p.validate(false).unwrap();
        assert_eq!(skill, Some(MinimumSkill::Beginner));

        let course = p.into_course(MinimumSkill::Beginner, Uuid::new_v4(), Uuid::new_v4());
        assert!(!course.scholarship_available);

        let bad = CoursePayload { minimum_skill: Some("expert".into()), ..Default::default() };
        let err = bad.validate(true).unwrap_err();
        assert!(err.message().contains("Minimum skill"));
        assert!(CoursePayload::default().validate(false).is_err());
    }
}
