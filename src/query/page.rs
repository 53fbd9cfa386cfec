//! Pagination window resolution

use crate::spec::FetchSpecification;

/// Compute the `(limit, offset)` window for a specification
///
/// Returns `None` when pagination is disabled. Page numbers are 1-based:
/// page 1 has offset 0. Non-positive page parameters never reach this
/// function; the parser falls back to defaults for them. Offsets beyond
/// `i64::MAX` saturate; any real result set is exhausted long before that.
pub fn page_window(spec: &FetchSpecification) -> Option<(i64, i64)> {
    if spec.disable_pagination {
        return None;
    }

    let limit = i64::from(spec.page_size);
    let offset = limit
        .checked_mul(i64::from(spec.page_number) - 1)
        .unwrap_or(i64::MAX);
    Some((limit, offset))
}
