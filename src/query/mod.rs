//! Query capabilities and shaping
//!
//! The engine never talks to a database directly. It shapes an abstract
//! [`Queryable`] builder and leaves execution to a caller-supplied
//! [`Repository`] capability.

pub mod fields;
pub mod include;
pub mod page;
pub mod shape;
pub mod sort;

pub use fields::{apply_field_projection, strip_omitted_fields};
pub use include::resolve_join_steps;
pub use page::page_window;
pub use shape::apply_fetch_specification;
pub use sort::resolve_sort_fields;

use crate::error::Result;
use crate::spec::SortDirection;

/// One eager-join step produced from a dotted include path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    /// Alias of the entity the relation hangs off
    pub parent_alias: String,
    /// Relation name on the parent
    pub relation: String,
    /// Alias under which the joined entity is selectable
    pub alias: String,
}

/// One resolved sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub column: String,
    pub direction: SortDirection,
}

/// Mutable query-builder capability
///
/// Implementations wrap whatever query primitive the persistence layer
/// offers (a SQL builder, an ORM query object, an in-memory plan). The
/// shaper only ever appends to the builder; it never executes it.
pub trait Queryable: Send {
    /// Restrict the SELECT list to the given alias-qualified columns
    fn select(&mut self, columns: Vec<String>);

    /// Eagerly join a relation of `parent_alias` under `alias`
    fn join_relation(&mut self, parent_alias: &str, relation: &str, alias: &str);

    /// Constrain `column` to equal `value`
    fn where_eq(&mut self, column: &str, value: serde_json::Value);

    /// Constrain `column` to one of `values`
    fn where_in(&mut self, column: &str, values: Vec<serde_json::Value>);

    /// Append a sort key; earlier calls take precedence
    fn order_by(&mut self, column: &str, direction: SortDirection);

    /// Cap the number of returned rows
    fn limit(&mut self, n: i64);

    /// Skip the first `n` rows
    fn offset(&mut self, n: i64);
}

/// Asynchronous persistence capability consumed by the CRUD service
///
/// The service owns no storage; every operation builds a fresh query via
/// [`Repository::create_query`] and hands it back for execution. Execution
/// and mutation failures surface as [`crate::Error::Persistence`].
pub trait Repository<E>: Send + Sync {
    type Query: Queryable;

    /// Start a fresh query over the entity set, rooted at `alias`
    fn create_query(&self, alias: &str) -> Self::Query;

    /// Execute and return all matching entities
    fn fetch_many(&self, query: Self::Query) -> impl Future<Output = Result<Vec<E>>> + Send;

    /// Execute and return all matching entities along with the total count
    /// of matches disregarding limit/offset
    fn fetch_many_and_count(
        &self,
        query: Self::Query,
    ) -> impl Future<Output = Result<(Vec<E>, i64)>> + Send;

    /// Execute and return at most one entity
    fn fetch_one(&self, query: Self::Query) -> impl Future<Output = Result<Option<E>>> + Send;

    /// Persist an entity (insert or update) and return the stored version
    fn save(&self, entity: E) -> impl Future<Output = Result<E>> + Send;

    /// Remove the given entities
    fn remove(&self, entities: Vec<E>) -> impl Future<Output = Result<()>> + Send;
}
