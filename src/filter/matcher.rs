//! In-memory evaluation of `FilterData`, used by the memory store.
//!
//! The semantics mirror the SQL produced by `FilterWhere`: implicit equality,
//! comparison operators, `$in`/`$nin`, `$any` array overlap and `$and`/`$or`
//! groups. Equality against an array field means "contains".

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterOp, FilterOrderInfo, SortDirection};

pub fn matches(doc: &Map<String, Value>, where_data: &Value) -> Result<bool, FilterError> {
    let obj = match where_data {
        Value::Null => return Ok(true),
        Value::Object(obj) => obj,
        _ => return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
    };

    for (key, condition) in obj {
        let ok = if key.starts_with('$') {
            match_logical(doc, key, condition)?
        } else {
            Filter::validate_identifier(key)?;
            match_field(doc.get(key).unwrap_or(&Value::Null), condition)?
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn match_logical(doc: &Map<String, Value>, op: &str, value: &Value) -> Result<bool, FilterError> {
    let clauses = value
        .as_array()
        .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
    match FilterOp::from_key(op) {
        Some(FilterOp::And) => {
            for clause in clauses {
                if !matches(doc, clause)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Some(FilterOp::Or) => {
            if clauses.is_empty() {
                return Ok(true);
            }
            for clause in clauses {
                if matches(doc, clause)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(FilterError::UnsupportedOperator(op.to_string())),
    }
}

fn match_field(actual: &Value, condition: &Value) -> Result<bool, FilterError> {
    match condition {
        Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
            for (op_key, expected) in ops {
                let op = FilterOp::from_key(op_key)
                    .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                if !apply(op, actual, expected)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => apply(FilterOp::Eq, actual, condition),
    }
}

fn apply(op: FilterOp, actual: &Value, expected: &Value) -> Result<bool, FilterError> {
    Ok(match op {
        FilterOp::Eq => equals(actual, expected),
        FilterOp::Ne => !equals(actual, expected),
        FilterOp::Gt => ordered(actual, expected, |o| o == Ordering::Greater),
        FilterOp::Gte => ordered(actual, expected, |o| o != Ordering::Less),
        FilterOp::Lt => ordered(actual, expected, |o| o == Ordering::Less),
        FilterOp::Lte => ordered(actual, expected, |o| o != Ordering::Greater),
        FilterOp::In => list(expected).iter().any(|candidate| equals(actual, candidate)),
        FilterOp::NIn => !list(expected).iter().any(|candidate| equals(actual, candidate)),
        FilterOp::Any => match actual {
            Value::Array(items) => {
                let wanted = list(expected);
                items.iter().any(|item| wanted.iter().any(|w| scalar_eq(item, w)))
            }
            _ => false,
        },
        FilterOp::And | FilterOp::Or => {
            return Err(FilterError::UnsupportedOperator(format!("{:?} is not a field operator", op)));
        }
    })
}

fn list(expected: &Value) -> Vec<Value> {
    match expected {
        Value::Array(values) => values.clone(),
        Value::Null => vec![],
        other => vec![other.clone()],
    }
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(items), Value::Array(_)) => actual == expected || items.iter().any(|i| scalar_eq(i, expected)),
        (Value::Array(items), scalar) => items.iter().any(|i| scalar_eq(i, scalar)),
        _ => scalar_eq(actual, expected),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    matches!(compare(a, b), Some(Ordering::Equal))
}

fn ordered(actual: &Value, expected: &Value, pred: impl Fn(Ordering) -> bool) -> bool {
    compare(actual, expected).map(pred).unwrap_or(false)
}

/// Orders two scalar JSON values. Numbers compare numerically, strings that
/// both parse as RFC 3339 timestamps compare chronologically, other strings
/// lexically. Mismatched types are unordered.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(dx), Ok(dy)) => Some(dx.cmp(&dy)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Stable multi-key sort. Nulls sort first ascending, last descending.
pub fn sort(docs: &mut [Map<String, Value>], order: &[FilterOrderInfo]) {
    docs.sort_by(|left, right| {
        for info in order {
            let a = left.get(&info.column).unwrap_or(&Value::Null);
            let b = right.get(&info.column).unwrap_or(&Value::Null);
            let ordering = match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => compare(a, b).unwrap_or(Ordering::Equal),
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Keeps only the listed fields. An empty or `*` selection keeps everything.
pub fn project(doc: Map<String, Value>, select: &[String]) -> Map<String, Value> {
    if select.is_empty() || select.iter().any(|c| c == "*") {
        return doc;
    }
    doc.into_iter().filter(|(k, _)| select.iter().any(|c| c == k)).collect()
}
