//! # fetchspec
//!
//! Declarative fetch specifications and a generic CRUD service layer.
//!
//! This crate turns loosely-typed request input (pagination window, sparse
//! fieldsets, relation includes, sort tokens, attribute filters) into a
//! normalized [`FetchSpecification`], shapes an abstract query from it, and
//! provides a generic lifecycle service implementing list, get, create,
//! update and delete uniformly across arbitrary record types.
//!
//! ## Features
//!
//! - **Fetch specification parsing**: comma-separated lists, `+`/`-` sort
//!   sigils, nested dotted include paths, boolean-like flags and nested
//!   `page`/`filter` parameter objects, with per-service defaults
//! - **Deterministic query shaping**: joins, projection, filters, sorting
//!   and pagination applied in a fixed, reproducible order
//! - **Stable join aliasing**: dotted include paths resolve to deduplicated
//!   join steps whose aliases are a pure function of the path
//! - **Generic CRUD lifecycle**: [`CrudService`] with overridable hook
//!   methods for validation, query extension and post-action side effects
//! - **Storage agnostic**: the engine only shapes a [`Queryable`] capability
//!   and executes through a caller-supplied [`Repository`]
//!
//! ## Quick Start
//!
//! ```rust
//! use fetchspec::{FetchSpecificationParser, PaginationDefaults};
//!
//! let parser = FetchSpecificationParser::new(PaginationDefaults::default())
//!     .with_allowed_filters(["status"]);
//!
//! let spec = parser
//!     .parse(&serde_json::json!({
//!         "fields": "id,title",
//!         "omitFields": "draft_notes",
//!         "include": "author,author.country",
//!         "sort": "-created_at,title",
//!         "filter": { "status": "published,archived" },
//!         "page": { "size": "10", "number": "2" },
//!     }))
//!     .unwrap();
//!
//! assert_eq!(spec.page_size, 10);
//! assert_eq!(spec.include, vec!["author", "author.country"]);
//! ```
//!
//! A service is a type implementing [`CrudService`] over a [`Repository`]:
//! the trait supplies every operation and hook with a default body, and
//! behavior is customized solely by overriding hooks (there is no separate
//! configuration-object path).
//!
//! ## What this crate does not do
//!
//! It does not validate business rules, perform authorization beyond the
//! optional filter-key allow-list, cache results, or define a storage
//! schema. Transactions, retries and timeouts belong to the caller's
//! persistence or transport layer.

pub mod config;
pub mod error;
pub mod parse;
pub mod query;
pub mod service;
pub mod spec;

// Re-export main types for convenience
pub use config::{PaginationDefaults, ServiceConfig, ServiceConfigBuilder};
pub use error::{Error, Result};
pub use parse::{FetchSpecificationParser, RESERVED_PARAMS, strip_reserved_params};
pub use query::{JoinStep, Queryable, Repository, SortField};
pub use service::CrudService;
pub use spec::{FetchSpecification, SortDirection};

// Re-export query-shaping helpers for advanced users
pub use query::{
    apply_fetch_specification, page_window, resolve_join_steps, resolve_sort_fields,
    strip_omitted_fields,
};
