//! Sort-token resolution
//!
//! Sort tokens are column names with an optional leading sigil: `-` sorts
//! descending, `+` (or no sigil) ascending. Token order is sort-key
//! priority. Repeated columns are passed through unchanged; the query
//! layer's own behavior governs which occurrence dominates.

use super::SortField;
use crate::spec::SortDirection;

/// Resolve sort tokens into `(column, direction)` pairs, preserving order
pub fn resolve_sort_fields(sort: &[String]) -> Vec<SortField> {
    sort.iter()
        .filter(|token| !token.is_empty() && token.as_str() != "+" && token.as_str() != "-")
        .map(|token| {
            let (direction, column) = match token.strip_prefix('-') {
                Some(rest) => (SortDirection::Desc, rest),
                None => (
                    SortDirection::Asc,
                    token.strip_prefix('+').unwrap_or(token),
                ),
            };
            SortField {
                column: column.to_string(),
                direction,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bare_token_sorts_ascending() {
        let fields = resolve_sort_fields(&tokens(&["name"]));

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].column, "name");
        assert_eq!(fields[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_plus_sigil_sorts_ascending() {
        let fields = resolve_sort_fields(&tokens(&["+name"]));

        assert_eq!(fields[0].column, "name");
        assert_eq!(fields[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_minus_sigil_sorts_descending() {
        let fields = resolve_sort_fields(&tokens(&["-name"]));

        assert_eq!(fields[0].column, "name");
        assert_eq!(fields[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_token_order_is_priority_order() {
        let fields = resolve_sort_fields(&tokens(&["-created_at", "name", "+id"]));

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].column, "created_at");
        assert_eq!(fields[0].direction, SortDirection::Desc);
        assert_eq!(fields[1].column, "name");
        assert_eq!(fields[1].direction, SortDirection::Asc);
        assert_eq!(fields[2].column, "id");
        assert_eq!(fields[2].direction, SortDirection::Asc);
    }

    #[test]
    fn test_repeated_columns_pass_through() {
        let fields = resolve_sort_fields(&tokens(&["name", "-name"]));

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].direction, SortDirection::Asc);
        assert_eq!(fields[1].direction, SortDirection::Desc);
    }

    #[test]
    fn test_empty_and_bare_sigil_tokens_skipped() {
        let fields = resolve_sort_fields(&tokens(&["", "-", "+", "name"]));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].column, "name");
    }

    #[test]
    fn test_no_tokens() {
        assert!(resolve_sort_fields(&[]).is_empty());
    }
}
