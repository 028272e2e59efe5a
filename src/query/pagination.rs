use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;

/// Parses the leading integer of `raw` the way lenient query strings are
/// usually read (`"3abc"` is 3). Missing, unparseable or non-positive input
/// yields `default`.
pub fn parse_positive(raw: Option<&str>, default: i64) -> i64 {
    let raw = match raw {
        Some(r) => r.trim(),
        None => return default,
    };
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let digits: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<i64>() {
        Ok(n) if !negative && n > 0 => n,
        Ok(_) => default,
        // Too many digits for i64 still reads as a (huge) positive number.
        Err(_) if !negative && !digits.is_empty() => i64::MAX,
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn from_params(page: Option<&str>, limit: Option<&str>, default_limit: i64, max_limit: i64) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: parse_positive(page, DEFAULT_PAGE),
            limit: parse_positive(limit, default_limit).min(max_limit),
        }
    }

    pub fn start_index(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn compute(request: &PageRequest, total: i64) -> Self {
        let start = request.start_index();
        let next = (start.saturating_add(request.limit) < total).then(|| PageRef {
            page: request.page + 1,
            limit: request.limit,
        });
        let prev = (start > 0).then(|| PageRef {
            page: request.page - 1,
            limit: request.limit,
        });
        Self { next, prev }
    }
}
