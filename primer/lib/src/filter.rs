//! Filtering of store entries for listing.
//!
//! Supports glob pattern matching on entry ids and exact integration
//! filtering.

use crate::entry::SnippetEntry;
use crate::{PrimerError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::sync::Arc;

/// Filters entries by id patterns and integrations.
///
/// # Arguments
///
/// * `entries` - Entries to filter, in the order they should be returned
/// * `patterns` - Glob patterns matched against entry ids (OR logic)
/// * `integrations` - Integration identifiers to keep (OR logic)
///
/// # Returns
///
/// Entries that match at least one pattern (if patterns are given) AND at
/// least one integration (if integrations are given).
///
/// # Examples
///
/// ```
/// use primer_lib::{filter_entries, SnippetEntry, SnippetStore};
///
/// let store = SnippetStore::from_entries(vec![
///     SnippetEntry::new("convex", "schema", ""),
///     SnippetEntry::new("svelte", "counter", ""),
/// ])
/// .unwrap();
///
/// let filtered = filter_entries(store.iter(), &["convex/*".to_string()], &[]).unwrap();
/// assert_eq!(filtered.len(), 1);
/// assert_eq!(filtered[0].id, "convex/schema");
/// ```
pub fn filter_entries<'a>(
    entries: impl IntoIterator<Item = &'a Arc<SnippetEntry>>,
    patterns: &[String],
    integrations: &[String],
) -> Result<Vec<Arc<SnippetEntry>>> {
    let matcher = if patterns.is_empty() {
        None
    } else {
        Some(build_glob_matcher(patterns)?)
    };

    let filtered = entries
        .into_iter()
        .filter(|entry| {
            let pattern_match = matcher.as_ref().is_none_or(|m| m.is_match(&entry.id));
            let integration_match =
                integrations.is_empty() || integrations.iter().any(|i| *i == entry.integration);
            pattern_match && integration_match
        })
        .cloned()
        .collect();

    Ok(filtered)
}

/// Compiles the patterns into one matcher.
///
/// # Errors
///
/// Returns [`PrimerError::InvalidPattern`] if any pattern is invalid.
fn build_glob_matcher(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| PrimerError::InvalidPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }

    builder.build().map_err(|e| PrimerError::InvalidPattern {
        pattern: patterns.join(", "),
        source: e,
    })
}
