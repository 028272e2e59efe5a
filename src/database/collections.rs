use std::collections::HashMap;

use crate::filter::FilterWhereOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    Uuid,
    Timestamp,
    TextArray,
}

impl FieldKind {
    pub fn sql_cast(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Number => "double precision",
            FieldKind::Boolean => "boolean",
            FieldKind::Uuid => "uuid",
            FieldKind::Timestamp => "timestamptz",
            FieldKind::TextArray => "text[]",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// Static description of one stored collection: its columns, the columns
/// never returned to clients and its unique keys.
#[derive(Debug)]
pub struct Collection {
    pub name: &'static str,
    pub fields: &'static [Field],
    pub hidden_fields: &'static [&'static str],
    pub unique: &'static [&'static [&'static str]],
}

impl Collection {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden_fields.contains(&name)
    }

    /// Fields a client may filter, sort or select on.
    pub fn visible_field(&self, name: &str) -> Option<&Field> {
        self.field(name).filter(|f| !self.is_hidden(f.name))
    }

    pub fn where_options(&self) -> FilterWhereOptions {
        let column_casts: HashMap<String, &'static str> =
            self.fields.iter().map(|f| (f.name.to_string(), f.kind.sql_cast())).collect();
        FilterWhereOptions { column_casts }
    }
}

pub static USERS: Collection = Collection {
    name: "users",
    fields: &[
        field("id", FieldKind::Uuid),
        field("name", FieldKind::Text),
        field("email", FieldKind::Text),
        field("role", FieldKind::Text),
        field("password", FieldKind::Text),
        field("reset_password_token", FieldKind::Text),
        field("reset_password_expire", FieldKind::Timestamp),
        field("created_at", FieldKind::Timestamp),
    ],
    hidden_fields: &["password", "reset_password_token", "reset_password_expire"],
    unique: &[&["email"]],
};

pub static BOOTCAMPS: Collection = Collection {
    name: "bootcamps",
    fields: &[
        field("id", FieldKind::Uuid),
        field("user_id", FieldKind::Uuid),
        field("name", FieldKind::Text),
        field("slug", FieldKind::Text),
        field("description", FieldKind::Text),
        field("website", FieldKind::Text),
        field("phone", FieldKind::Text),
        field("email", FieldKind::Text),
        field("address", FieldKind::Text),
        field("careers", FieldKind::TextArray),
        field("average_rating", FieldKind::Number),
        field("average_cost", FieldKind::Number),
        field("photo", FieldKind::Text),
        field("housing", FieldKind::Boolean),
        field("job_assistance", FieldKind::Boolean),
        field("job_guarantee", FieldKind::Boolean),
        field("accept_gi", FieldKind::Boolean),
        field("created_at", FieldKind::Timestamp),
    ],
    hidden_fields: &[],
    unique: &[&["name"]],
};

pub static COURSES: Collection = Collection {
    name: "courses",
    fields: &[
        field("id", FieldKind::Uuid),
        field("user_id", FieldKind::Uuid),
        field("bootcamp_id", FieldKind::Uuid),
        field("title", FieldKind::Text),
        field("description", FieldKind::Text),
        field("weeks", FieldKind::Integer),
        field("tuition", FieldKind::Number),
        field("minimum_skill", FieldKind::Text),
        field("scholarship_available", FieldKind::Boolean),
        field("created_at", FieldKind::Timestamp),
    ],
    hidden_fields: &[],
    unique: &[],
};

pub static REVIEWS: Collection = Collection {
    name: "reviews",
    fields: &[
        field("id", FieldKind::Uuid),
        field("user_id", FieldKind::Uuid),
        field("bootcamp_id", FieldKind::Uuid),
        field("title", FieldKind::Text),
        field("text", FieldKind::Text),
        field("rating", FieldKind::Integer),
        field("created_at", FieldKind::Timestamp),
    ],
    hidden_fields: &[],
    unique: &[&["bootcamp_id", "user_id"]],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_user_fields_are_not_visible() {
        assert!(USERS.field("password").is_some());
        assert!(USERS.visible_field("password").is_none());
        assert!(USERS.visible_field("email").is_some());
    }

    #[test]
    fn where_options_carry_column_casts() {
        let options = BOOTCAMPS.where_options();
        assert_eq!(options.cast_for("careers"), Some("text[]"));
        assert_eq!(options.cast_for("average_cost"), Some("double precision"));
        assert_eq!(options.cast_for("nope"), None);
    }
}
