//! Sparse fieldsets
//!
//! `fields` narrows the query-layer SELECT list to alias-qualified columns.
//! `omit_fields` is deliberately NOT translated into query-layer
//! de-selection: removing columns from the generated query can break
//! relation hydration and computed columns, so omitted fields are stripped
//! from the result objects after retrieval instead. When a field appears in
//! both lists, omission wins for the final output.

use super::Queryable;

/// Apply the projection allow-list to a queryable
///
/// An empty `fields` list means "all columns" and leaves the queryable
/// untouched.
pub fn apply_field_projection<Q: Queryable + ?Sized>(
    query: &mut Q,
    alias: &str,
    fields: &[String],
) {
    if !fields.is_empty() {
        let columns = fields
            .iter()
            .map(|f| format!("{}.{}", alias, f))
            .collect::<Vec<_>>();
        query.select(columns);
    }
}

/// Remove omitted top-level keys from each result object
///
/// Non-object values are passed through unchanged.
pub fn strip_omitted_fields(
    items: Vec<serde_json::Value>,
    omit_fields: &[String],
) -> Vec<serde_json::Value> {
    if omit_fields.is_empty() {
        return items;
    }

    items
        .into_iter()
        .map(|mut item| {
            if let Some(object) = item.as_object_mut() {
                for field in omit_fields {
                    object.remove(field);
                }
            }
            item
        })
        .collect()
}
