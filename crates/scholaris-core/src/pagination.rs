//! Pagination utilities for list endpoints.
//!
//! Lists are page-based: `page` is 1-indexed and `limit` is the page size.
//! Both arrive either from a query string (always text) or from a JSON body
//! (text or number), so parsing is lenient:
//!
//! - text is parsed as a base-10 integer prefix (`"12abc"` is 12)
//! - fractional numbers are truncated toward zero
//! - anything unparsable falls back to the default
//!
//! Normalization then clamps `page` to a minimum of 1 (default 1) and `limit`
//! to the range [1, 100] (default 10).
//!
//! # Example JSON Response
//!
//! ```json
//! {
//!   "data": [...],
//!   "meta": { "total": 42, "limit": 10, "page": 2, "total_pages": 5, "has_more": true }
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Parses the leading base-10 integer of `input`, ignoring leading whitespace
/// and anything after the digits. Returns `None` when no digit leads.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    // Saturate rather than fail on absurdly long inputs.
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<LenientNumber> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(LenientNumber::Int(n)) => Some(n),
        Some(LenientNumber::Float(f)) if f.is_finite() => Some(f.trunc() as i64),
        Some(LenientNumber::Float(_)) => None,
        Some(LenientNumber::Text(s)) => parse_int_prefix(&s),
        None => None,
    })
}

/// Query parameters for pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    /// Effective page number, never below 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Effective page size, clamped to [1, 100].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip before the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let page = params.page();
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Self {
            total,
            limit,
            page,
            total_pages,
            has_more: params.offset() + limit < total,
        }
    }
}

/// A page of rows plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(total, params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_limit_clamps_to_max() {
        let params = PaginationParams::new(None, Some(500));
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn test_page_zero_clamps_to_one() {
        let params = PaginationParams::new(Some(0), None);
        assert_eq!(params.page(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_limit_boundary_cases() {
        let cases = [(Some(1), 1), (Some(100), 100), (Some(101), 100), (Some(0), 1), (Some(-3), 1)];
        for (input, expected) in cases {
            assert_eq!(PaginationParams::new(None, input).limit(), expected);
        }
    }

    #[test]
    fn test_offset_from_page() {
        let params = PaginationParams::new(Some(3), Some(20));
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("12"), Some(12));
        assert_eq!(parse_int_prefix("12abc"), Some(12));
        assert_eq!(parse_int_prefix("  7"), Some(7));
        assert_eq!(parse_int_prefix("-4"), Some(-4));
        assert_eq!(parse_int_prefix("3.9"), Some(3));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
    }

    #[test]
    fn test_deserialize_from_query_strings() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":"2","limit":"500"}"#).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn test_deserialize_from_numbers() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":4,"limit":2.8}"#).unwrap();
        assert_eq!(params.page(), 4);
        assert_eq!(params.limit(), 2);
    }

    #[test]
    fn test_deserialize_non_numeric_falls_back() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":"first","limit":""}"#).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_deserialize_missing_and_null() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":null}"#).unwrap();
        assert_eq!(params, PaginationParams::default());
    }

    #[test]
    fn test_meta_counts_pages() {
        let params = PaginationParams::new(Some(2), Some(10));
        let meta = PaginationMeta::new(42, &params);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_more);

        let last = PaginationMeta::new(42, &PaginationParams::new(Some(5), Some(10)));
        assert!(!last.has_more);
    }

    #[test]
    fn test_meta_empty_total() {
        let meta = PaginationMeta::new(0, &PaginationParams::default());
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_paginated_serializes_data_and_meta() {
        let page = Paginated::new(vec![1, 2], 2, &PaginationParams::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["page"], 1);
    }
}
