use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::database::{Collection, FieldKind};

/// Control keys that never become filters.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Bracket operators accepted in `field[op]=value`.
pub const COMPARISON_OPERATORS: [&str; 5] = ["gt", "gte", "lt", "lte", "in"];

/// The decoded query string, in request order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every non-reserved pair.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Splits `field[op]` into its parts; a bare key has no operator.
fn split_key(key: &str) -> Option<(&str, Option<&str>)> {
    match key.find('[') {
        None => Some((key, None)),
        Some(open) => {
            let op = key[open + 1..].strip_suffix(']')?;
            Some((&key[..open], Some(op)))
        }
    }
}

/// Types a raw string as the given field kind, or `None` when it cannot be.
pub fn coerce(kind: FieldKind, raw: &str) -> Option<Value> {
    let raw = raw.trim();
    match kind {
        FieldKind::Text | FieldKind::TextArray => Some(json!(raw)),
        // Integer columns are 32-bit; wider values cannot match.
        FieldKind::Integer => raw.parse::<i32>().ok().map(|n| json!(n)),
        FieldKind::Number => match raw.parse::<i64>() {
            Ok(n) => Some(json!(n)),
            Err(_) => raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| json!(f)),
        },
        FieldKind::Boolean => match raw {
            "true" => Some(json!(true)),
            "false" => Some(json!(false)),
            _ => None,
        },
        FieldKind::Uuid => raw.parse::<Uuid>().ok().map(|id| json!(id)),
        FieldKind::Timestamp => {
            if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
                return Some(json!(ts));
            }
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            Some(json!(date.and_hms_opt(0, 0, 0)?.and_utc()))
        }
    }
}

/// Builds the `where` clause from the filter parameters. Every bracket
/// operator is rewritten to its `$`-prefixed storage form. Unknown or hidden
/// fields, unknown operators and values that do not fit the field's type are
/// dropped.
pub fn build_where(params: &QueryParams, collection: &Collection) -> Value {
    let mut clauses: Map<String, Value> = Map::new();

    for (key, raw) in params.filters() {
        let Some((name, op)) = split_key(key) else {
            debug!("Ignoring malformed filter key {}", key);
            continue;
        };
        let Some(field) = collection.visible_field(name) else {
            debug!("Ignoring filter on unknown field {}", name);
            continue;
        };
        let op = match op {
            None => "eq",
            Some(op) if COMPARISON_OPERATORS.contains(&op) => op,
            Some(op) => {
                debug!("Ignoring unsupported operator {} on {}", op, name);
                continue;
            }
        };

        let (storage_op, value) = if op == "in" {
            let values: Vec<Value> = raw.split(',').filter_map(|v| coerce(field.kind, v)).collect();
            let storage_op = if field.kind == FieldKind::TextArray { "$any" } else { "$in" };
            (storage_op, Value::Array(values))
        } else {
            let Some(value) = coerce(field.kind, raw) else {
                debug!("Ignoring filter {}={} that does not fit the field type", key, raw);
                continue;
            };
            match (op, field.kind) {
                ("eq", FieldKind::TextArray) => ("$any", json!([value])),
                _ => (storage_operator(op), value),
            }
        };

        let entry = clauses
            .entry(field.name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(ops) = entry {
            ops.insert(storage_op.to_string(), value);
        }
    }

    Value::Object(clauses)
}

fn storage_operator(op: &str) -> &'static str {
    match op {
        "gt" => "$gt",
        "gte" => "$gte",
        "lt" => "$lt",
        "lte" => "$lte",
        "in" => "$in",
        _ => "$eq",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{BOOTCAMPS, COURSES, REVIEWS, USERS};

    #[test]
    fn parses_and_skips_reserved_keys() {
        let params = QueryParams::parse(Some("select=name&average_cost%5Blte%5D=10000&page=2&housing=true"));
        assert_eq!(params.get("select"), Some("name"));
        let filters: Vec<_> = params.filters().collect();
        assert_eq!(filters, vec![("average_cost[lte]", "10000"), ("housing", "true")]);
    }

    #[test]
    fn rewrites_every_operator_occurrence() {
        let params = QueryParams::from_pairs([
            ("average_cost[gte]", "1000"),
            ("average_cost[lte]", "10000"),
            ("average_rating[gt]", "7.5"),
        ]);
        let where_clause = build_where(&params, &BOOTCAMPS);
        assert_eq!(
            where_clause,
            json!({
                "average_cost": { "$gte": 1000, "$lte": 10000 },
                "average_rating": { "$gt": 7.5 }
            })
        );
    }

    #[test]
    fn equality_and_membership() {
        let params = QueryParams::from_pairs([
            ("housing", "true"),
            ("careers", "Business"),
            ("name[in]", "Devworks Bootcamp,ModernTech Bootcamp"),
        ]);
        let where_clause = build_where(&params, &BOOTCAMPS);
        assert_eq!(where_clause["housing"], json!({ "$eq": true }));
        assert_eq!(where_clause["careers"], json!({ "$any": ["Business"] }));
        assert_eq!(where_clause["name"], json!({ "$in": ["Devworks Bootcamp", "ModernTech Bootcamp"] }));
    }

    #[test]
    fn drops_what_it_cannot_use() {
        let params = QueryParams::from_pairs([
            ("nonexistent", "1"),
            ("average_cost[regex]", "1"),
            ("average_cost", "cheap"),
            ("housing", "yes"),
            ("name[gt", "x"),
            ("user_id", "not-a-uuid"),
        ]);
        assert_eq!(build_where(&params, &BOOTCAMPS), json!({}));
    }

    #[test]
    fn hidden_fields_are_not_filterable() {
        let params = QueryParams::from_pairs([("password", "x"), ("reset_password_token", "y"), ("role", "admin")]);
        assert_eq!(build_where(&params, &USERS), json!({ "role": { "$eq": "admin" } }));
    }

    #[test]
    fn coerces_timestamps_and_dates() {
        assert!(coerce(FieldKind::Timestamp, "2024-01-31").is_some());
        assert!(coerce(FieldKind::Timestamp, "2024-01-31T10:00:00Z").is_some());
        assert!(coerce(FieldKind::Timestamp, "yesterday").is_none());
        assert_eq!(coerce(FieldKind::Number, "12.5"), Some(json!(12.5)));
        assert_eq!(coerce(FieldKind::Integer, "12.5"), None);
    }

    #[test]
    fn integers_outside_the_column_range_are_dropped() {
        assert_eq!(coerce(FieldKind::Integer, "2147483647"), Some(json!(2147483647)));
        assert_eq!(coerce(FieldKind::Integer, "2147483648"), None);
        assert_eq!(coerce(FieldKind::Integer, "-99999999999"), None);

        let params = QueryParams::from_pairs([("weeks[gt]", "99999999999"), ("weeks[lte]", "12")]);
        assert_eq!(build_where(&params, &COURSES), json!({ "weeks": { "$lte": 12 } }));
        let params = QueryParams::from_pairs([("rating", "3000000000")]);
        assert_eq!(build_where(&params, &REVIEWS), json!({}));
    }
}
