//! Flat markdown rendering of a bundle for context injection.

use crate::bundle::{Bundle, DropReason};
use std::fmt::Write;

/// Renders a bundle as markdown: one section per entry, then a notice
/// listing anything that was dropped.
///
/// ## Examples
///
/// ```
/// use primer_lib::{render_markdown, Bundle};
///
/// assert_eq!(render_markdown(&Bundle::default()), "");
/// ```
pub fn render_markdown(bundle: &Bundle) -> String {
    let mut out = String::new();

    for entry in &bundle.entries {
        let _ = writeln!(out, "## {}", entry.id);
        if entry.version_mismatch {
            let _ = writeln!(
                out,
                "\n> This example targets a different {} version than the project declares.",
                entry.integration
            );
        }
        let fence = fence_for(&entry.content);
        let lang = entry.extension.as_deref().unwrap_or("");
        let _ = writeln!(out, "\n{fence}{lang}\n{}", entry.content.trim_end());
        let _ = writeln!(out, "{fence}\n");
    }

    if !bundle.dropped.is_empty() {
        out.push_str("## Omitted\n\n");
        for dropped in &bundle.dropped {
            let subject = dropped.id.as_deref().unwrap_or(&dropped.integration);
            let _ = writeln!(out, "- {subject}: {}", describe(dropped.reason));
        }
    }

    out
}

fn describe(reason: DropReason) -> &'static str {
    match reason {
        DropReason::NoEntries => "no examples available",
        DropReason::VersionMismatchExcluded => "excluded as incompatible with the project version",
        DropReason::BudgetTruncated => "left out to fit the size budget",
    }
}

/// A backtick fence longer than any run inside the content.
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
