//! Configuration for the CRUD service and fetch-specification parsing
//!
//! Provides a builder pattern for configuring service instances.

/// Default pagination values applied when a request does not specify its own
#[derive(Debug, Clone)]
pub struct PaginationDefaults {
    /// Number of results per page (must be > 0)
    pub page_size: u32,
    /// 1-based page number
    pub page_number: u32,
    /// Whether pagination is skipped entirely by default
    pub disable_pagination: bool,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            page_size: 25,
            page_number: 1,
            disable_pagination: false,
        }
    }
}

/// Configuration for a CRUD service instance
///
/// Holds the immutable per-service settings: the base query alias, the
/// identifier column, and the pagination defaults used when parsing fetch
/// specifications.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Alias used for the base entity in shaped queries (default: "base")
    pub alias: String,
    /// Column holding the entity identifier (default: "id")
    pub id_column: String,
    /// Pagination defaults
    pub pagination: PaginationDefaults,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            alias: "base".to_string(),
            id_column: "id".to_string(),
            pagination: PaginationDefaults::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }
}

/// Builder for ServiceConfig
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    alias: Option<String>,
    id_column: Option<String>,
    pagination: Option<PaginationDefaults>,
}

impl ServiceConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base query alias (default: "base")
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the identifier column name (default: "id")
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    /// Set the default page size (default: 25)
    pub fn default_page_size(mut self, size: u32) -> Self {
        self.pagination.get_or_insert_default().page_size = size;
        self
    }

    /// Set the default page number (default: 1)
    pub fn default_page_number(mut self, number: u32) -> Self {
        self.pagination.get_or_insert_default().page_number = number;
        self
    }

    /// Disable pagination by default (default: enabled)
    pub fn disable_pagination(mut self, disabled: bool) -> Self {
        self.pagination.get_or_insert_default().disable_pagination = disabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ServiceConfig {
        ServiceConfig {
            alias: self.alias.unwrap_or_else(|| "base".to_string()),
            id_column: self.id_column.unwrap_or_else(|| "id".to_string()),
            pagination: self.pagination.unwrap_or_default(),
        }
    }
}
