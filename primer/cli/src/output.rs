//! Terminal and JSON formatting for `list` and `detect`.

use owo_colors::OwoColorize;
use primer_lib::{SelectionResult, SnippetEntry};
use serde_json::json;
use std::sync::Arc;

/// Entry metadata as a pretty JSON array. Content is left out; use `show`.
pub fn entries_json(entries: &[Arc<SnippetEntry>]) -> Result<String, serde_json::Error> {
    let summaries: Vec<_> = entries
        .iter()
        .map(|entry| {
            json!({
                "id": entry.id,
                "integration": entry.integration,
                "topic": entry.topic,
                "bytes": entry.size(),
                "compatibleVersions": entry.compatible_versions.as_ref().map(|r| r.to_string()),
            })
        })
        .collect();
    serde_json::to_string_pretty(&summaries)
}

/// One line per entry:
///
/// ```text
/// - convex/schema (412 bytes)
/// - svelte/counter.svelte (298 bytes) svelte >=5.0.0
/// ```
pub fn format_entries(entries: &[Arc<SnippetEntry>]) -> String {
    entries
        .iter()
        .map(|entry| {
            let mut line = format!(
                "- {} {}",
                entry.id.bold(),
                format!("({} bytes)", entry.size()).dimmed()
            );
            if let Some(range) = &entry.compatible_versions {
                line.push_str(&format!(" {} {}", entry.integration, range).cyan().to_string());
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Matched integrations with the dependency that triggered each one.
pub fn format_matches(selection: &SelectionResult) -> String {
    if selection.matched_integrations.is_empty() {
        return "No known integrations detected".to_string();
    }

    selection
        .matched_integrations
        .iter()
        .map(|m| {
            let mut line = format!(
                "- {} via {} {}",
                m.identifier.bold(),
                m.package,
                m.declared_version.dimmed()
            );
            if selection.empty_integrations.contains(&m.identifier) {
                line.push_str(&format!(" {}", "(no examples)".yellow()));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
