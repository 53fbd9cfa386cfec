//! Fetch-specification parsing
//!
//! Turns raw, loosely-typed query-parameter input (a JSON object of string,
//! array and nested-object values, conventionally decoded from URL query
//! parameters) into one normalized [`FetchSpecification`].
//!
//! Reserved keys: `fields`, `omitFields`, `include`, `sort`, `filter`
//! (nested object), `page` (nested object with `size`/`number`) and
//! `disablePagination`. [`strip_reserved_params`] removes these from a
//! pass-through copy of the raw input so downstream strict-schema
//! validators do not reject them.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::config::{PaginationDefaults, ServiceConfig};
use crate::error::{Error, Result};
use crate::spec::FetchSpecification;

/// Raw-input keys consumed by the parser
pub const RESERVED_PARAMS: &[&str] = &[
    "fields",
    "omitFields",
    "include",
    "sort",
    "filter",
    "page",
    "disablePagination",
];

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parser for raw fetch-specification input
///
/// Construction-time settings replace ambient global defaults: the
/// pagination defaults are merged into any request that does not override
/// them, and an optional filter-key allow-list turns unknown filter keys
/// into fail-fast validation errors.
#[derive(Debug, Clone, Default)]
pub struct FetchSpecificationParser {
    defaults: PaginationDefaults,
    allowed_filters: Option<Vec<String>>,
}

impl FetchSpecificationParser {
    /// Create a parser with the given pagination defaults
    pub fn new(defaults: PaginationDefaults) -> Self {
        Self {
            defaults,
            allowed_filters: None,
        }
    }

    /// Create a parser from a service configuration, adopting its
    /// pagination defaults
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.pagination.clone())
    }

    /// Restrict filter keys to an allow-list
    ///
    /// When set, any filter key outside the list fails the parse with a
    /// [`Error::Validation`] naming the offending key. When not set, all
    /// filter keys pass through unchecked.
    pub fn with_allowed_filters(
        mut self,
        allowed: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_filters = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Parse raw query-parameter input into a normalized specification
    ///
    /// Raw input wins over defaults. Invalid numeric page parameters
    /// (non-numeric or non-positive) fall back to the default rather than
    /// erroring; malformed field, sort, include or filter tokens and
    /// disallowed filter keys are validation errors.
    pub fn parse(&self, raw: &serde_json::Value) -> Result<FetchSpecification> {
        let empty = serde_json::Map::new();
        let params = raw.as_object().unwrap_or(&empty);

        let fields = parse_token_list(params.get("fields"));
        let omit_fields = parse_token_list(params.get("omitFields"));
        let include = parse_token_list(params.get("include"));
        let sort = parse_token_list(params.get("sort"));

        for field in fields.iter().chain(omit_fields.iter()) {
            validate_token(field, "field")?;
        }
        for token in &sort {
            let column = token
                .strip_prefix(['+', '-'])
                .unwrap_or(token);
            validate_token(column, "sort column")?;
        }
        for path in &include {
            for segment in path.split('.') {
                validate_token(segment, "include path segment")?;
            }
        }

        let filter = self.parse_filter(params.get("filter"))?;

        let page = params.get("page").and_then(|v| v.as_object());
        let page_size = page
            .and_then(|p| parse_positive_int(p.get("size")))
            .unwrap_or(self.defaults.page_size);
        let page_number = page
            .and_then(|p| parse_positive_int(p.get("number")))
            .unwrap_or(self.defaults.page_number);

        let disable_pagination = match params.get("disablePagination") {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => self.defaults.disable_pagination,
        };

        Ok(FetchSpecification {
            page_size,
            page_number,
            disable_pagination,
            fields,
            omit_fields,
            include,
            sort,
            filter,
        })
    }

    fn parse_filter(
        &self,
        raw: Option<&serde_json::Value>,
    ) -> Result<Option<BTreeMap<String, Vec<String>>>> {
        let Some(entries) = raw.and_then(|v| v.as_object()) else {
            return Ok(None);
        };
        if entries.is_empty() {
            return Ok(None);
        }

        let mut filter = BTreeMap::new();
        for (key, value) in entries {
            if let Some(allowed) = &self.allowed_filters {
                if !allowed.iter().any(|k| k == key) {
                    return Err(Error::validation(format!("Invalid filter key: {}", key)));
                }
            }
            validate_token(key, "filter key")?;
            filter.insert(key.clone(), normalize_filter_values(value));
        }

        Ok(Some(filter))
    }
}

/// Remove the reserved fetch-specification keys from a raw parameter map
///
/// Call this on any pass-through copy of the raw input once the
/// specification has been parsed.
pub fn strip_reserved_params(params: &mut serde_json::Map<String, serde_json::Value>) {
    for key in RESERVED_PARAMS {
        params.remove(*key);
    }
}

/// Split comma-separated strings (or string arrays) into tokens
///
/// Empty segments are dropped, so `"a,,b"` and a trailing comma parse the
/// same as their clean forms.
fn parse_token_list(raw: Option<&serde_json::Value>) -> Vec<String> {
    match raw {
        Some(serde_json::Value::String(s)) => split_commas(s),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .flat_map(split_commas)
            .collect(),
        _ => Vec::new(),
    }
}

fn split_commas(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a filter value to a sequence of strings
///
/// Accepts a scalar, a comma-separated string, or an array of scalars.
fn normalize_filter_values(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => split_commas(s),
        serde_json::Value::Array(items) => items.iter().map(scalar_to_string).collect(),
        other => vec![scalar_to_string(other)],
    }
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_positive_int(raw: Option<&serde_json::Value>) -> Option<u32> {
    let parsed = match raw? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.filter(|v| *v > 0)
}

fn validate_token(token: &str, kind: &str) -> Result<()> {
    if !IDENTIFIER_RE.is_match(token) {
        return Err(Error::validation(format!(
            "Invalid {}: '{}'. Must start with a letter or underscore and contain only letters, numbers, and underscores.",
            kind, token
        )));
    }
    Ok(())
}
