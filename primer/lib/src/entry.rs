//! Snippet entry type.

use crate::version::VersionRange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use xxhash_rust::xxh3::xxh3_64;

/// One example file from the corpus.
///
/// Entries are created once at load time and shared as `Arc<SnippetEntry>`
/// for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetEntry {
    /// `"<integration>/<topic>"`, unique across the store.
    pub id: String,
    /// Identifier of the documented third-party system.
    pub integration: String,
    /// Short tag describing the example's purpose.
    pub topic: String,
    /// Opaque example source.
    pub content: String,
    /// Version range the example is known to match, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatible_versions: Option<VersionRange>,
    /// xxh3-64 digest of `content`.
    pub content_hash: u64,
    /// File extension of the source file (`ts`, `svelte`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Where the entry was loaded from.
    pub source: PathBuf,
}

impl SnippetEntry {
    /// Creates an entry, deriving `id` and `content_hash`.
    pub fn new(
        integration: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let integration = integration.into();
        let topic = topic.into();
        let content = content.into();
        Self {
            id: entry_id(&integration, &topic),
            content_hash: xxh3_64(content.as_bytes()),
            integration,
            topic,
            content,
            compatible_versions: None,
            extension: None,
            source: PathBuf::new(),
        }
    }

    pub fn with_compatible_versions(mut self, range: VersionRange) -> Self {
        self.compatible_versions = Some(range);
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Builds the canonical entry id.
pub fn entry_id(integration: &str, topic: &str) -> String {
    format!("{integration}/{topic}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_id_and_hash() {
        let entry = SnippetEntry::new("convex", "schema", "export default {}");
        assert_eq!(entry.id, "convex/schema");
        assert_eq!(entry.content_hash, xxh3_64(b"export default {}"));
        assert_eq!(entry.size(), 17);
    }

    #[test]
    fn identical_content_hashes_equal() {
        let a = SnippetEntry::new("svelte", "counter", "same");
        let b = SnippetEntry::new("convex", "crons", "same");
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn serializes_without_empty_optionals() {
        let entry = SnippetEntry::new("autumn", "config", "x");
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("compatible_versions").is_none());
        assert!(json.get("extension").is_none());
        assert_eq!(json["id"], "autumn/config");
    }
}
