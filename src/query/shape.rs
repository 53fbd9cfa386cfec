//! Query shaping
//!
//! Applies a normalized [`FetchSpecification`] to an abstract queryable in a
//! fixed order: joins, projection, filters, sorting, pagination. Joins must
//! precede projection and filtering so either may reference joined columns;
//! pagination is last so limit/offset apply to the fully filtered, sorted
//! result set.

use tracing::debug;

use super::fields::apply_field_projection;
use super::include::resolve_join_steps;
use super::page::page_window;
use super::sort::resolve_sort_fields;
use super::Queryable;
use crate::spec::FetchSpecification;

/// Shape a queryable according to a fetch specification
///
/// The function has no side effects beyond mutating the supplied queryable
/// and is safe to call repeatedly with different specifications on freshly
/// created queryables.
pub fn apply_fetch_specification<Q: Queryable + ?Sized>(
    query: &mut Q,
    alias: &str,
    spec: &FetchSpecification,
) {
    debug!(?spec, alias, "applying fetch specification");

    for step in resolve_join_steps(alias, &spec.include) {
        query.join_relation(&step.parent_alias, &step.relation, &step.alias);
    }

    apply_field_projection(query, alias, &spec.fields);

    apply_filters(query, alias, spec);

    for field in resolve_sort_fields(&spec.sort) {
        query.order_by(&format!("{}.{}", alias, field.column), field.direction);
    }

    if let Some((limit, offset)) = page_window(spec) {
        query.limit(limit);
        query.offset(offset);
    }
}

/// Apply the specification's attribute filters as membership predicates
///
/// Single-valued filters still use membership semantics; a one-element set
/// is equality in every query engine this has been pointed at.
fn apply_filters<Q: Queryable + ?Sized>(query: &mut Q, alias: &str, spec: &FetchSpecification) {
    let Some(filter) = &spec.filter else {
        return;
    };

    for (key, values) in filter {
        if values.is_empty() {
            continue;
        }
        query.where_in(
            &format!("{}.{}", alias, key),
            values
                .iter()
                .map(|v| serde_json::Value::String(v.clone()))
                .collect(),
        );
    }
}
