//! Include-path resolution
//!
//! Expands dotted relation paths (`"author.country"`) into an ordered list
//! of join steps. Every ancestor of a path is joined before the path itself,
//! no path is joined twice, and aliases are a pure function of the path
//! (dots replaced with underscores), so resolution is idempotent.

use super::JoinStep;

/// Resolve dotted include paths into ordered, deduplicated join steps
///
/// The resolver is schema-agnostic: unknown relation names are reported by
/// the underlying queryable at execution time, not here.
pub fn resolve_join_steps(base_alias: &str, include: &[String]) -> Vec<JoinStep> {
    let mut steps = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for path in include {
        if path.is_empty() {
            continue;
        }

        let mut completed = String::new();
        let mut parent_alias = base_alias.to_string();

        for segment in path.split('.') {
            if !completed.is_empty() {
                completed.push('.');
            }
            completed.push_str(segment);

            let alias = completed.replace('.', "_");

            if !seen.contains(&completed) {
                seen.push(completed.clone());
                steps.push(JoinStep {
                    parent_alias: parent_alias.clone(),
                    relation: segment.to_string(),
                    alias: alias.clone(),
                });
            }

            parent_alias = alias;
        }
    }

    steps
}
