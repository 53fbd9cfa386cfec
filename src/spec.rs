//! Fetch specification value object
//!
//! A `FetchSpecification` is the normalized description of how to shape a
//! query: pagination window, sparse fieldsets, relation includes, sort order
//! and attribute filters. It is constructed once per operation (usually by
//! the parser in [`crate::parse`]) and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort direction for a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

fn default_page_size() -> u32 {
    25
}

fn default_page_number() -> u32 {
    1
}

/// Normalized description of how to shape a fetch operation
///
/// `fields` selects columns at the query layer; `omit_fields` is applied to
/// the result objects after retrieval and always wins over `fields` for the
/// final output shape. `include` entries are dotted relation paths; every
/// prefix of a path is joined even when not listed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSpecification {
    /// Number of results per page (> 0)
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: u32,
    /// 1-based page number
    #[serde(rename = "pageNumber", default = "default_page_number")]
    pub page_number: u32,
    /// When true, no limit/offset is applied regardless of page fields
    #[serde(rename = "disablePagination", default)]
    pub disable_pagination: bool,
    /// Explicit projection allow-list; empty means "all columns"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Fields stripped from result objects after retrieval
    #[serde(rename = "omitFields", default, skip_serializing_if = "Vec::is_empty")]
    pub omit_fields: Vec<String>,
    /// Dotted relation paths to eagerly join (e.g. `["author", "author.country"]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Sort tokens, optionally prefixed with `+` (ascending) or `-` (descending)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    /// Attribute filters: key to accepted values (membership semantics)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeMap<String, Vec<String>>>,
}

impl Default for FetchSpecification {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_number: default_page_number(),
            disable_pagination: false,
            fields: Vec::new(),
            omit_fields: Vec::new(),
            include: Vec::new(),
            sort: Vec::new(),
            filter: None,
        }
    }
}

impl FetchSpecification {
    /// Create a specification with all defaults (page 1 of 25, no shaping)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pagination window
    pub fn with_pagination(mut self, page_size: u32, page_number: u32) -> Self {
        self.page_size = page_size;
        self.page_number = page_number;
        self
    }

    /// Disable pagination for this fetch
    pub fn without_pagination(mut self) -> Self {
        self.disable_pagination = true;
        self
    }

    /// Set the projection allow-list
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fields stripped from result objects
    pub fn with_omit_fields(mut self, omit: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.omit_fields = omit.into_iter().map(Into::into).collect();
        self
    }

    /// Set the relation paths to include
    pub fn with_include(mut self, include: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include = include.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sort tokens
    pub fn with_sort(mut self, sort: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    /// Add a filter constraint on an attribute
    pub fn with_filter(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.filter
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }
}
