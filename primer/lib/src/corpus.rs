//! Filesystem discovery of example files.
//!
//! A corpus root holds one directory per integration. Example files sit in
//! that directory or in its `assets/` subdirectory and carry the `.example`
//! marker in their name:
//!
//! ```text
//! corpus/
//!   convex/
//!     snippets.toml                (optional)
//!     assets/schema.example.ts     -> convex/schema
//!     assets/crons.example.ts      -> convex/crons
//!   tailwind-v4/
//!     vite.config.example.ts       -> tailwind-v4/vite.config
//! ```
//!
//! The optional `snippets.toml` sidecar attaches version ranges to topics.

use crate::entry::SnippetEntry;
use crate::version::parse_range;
use crate::{PrimerError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::LazyLock;
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Marker that identifies an example file.
pub const EXAMPLE_MARKER: &str = ".example";

/// Optional per-integration metadata file.
pub const SIDECAR_FILE: &str = "snippets.toml";

/// Subdirectory that may hold an integration's examples.
pub const ASSETS_DIR: &str = "assets";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("static regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Sidecar {
    #[serde(default)]
    topics: BTreeMap<String, TopicMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopicMeta {
    compatible_versions: Option<String>,
}

/// Returns the topic encoded in an example file name, if it is one.
///
/// `schema.example.ts` → `Some("schema")`, `README.md` → `None`. The topic
/// may be empty (`.example.ts`); callers reject that as malformed.
pub fn topic_from_file_name(name: &str) -> Option<&str> {
    let (topic, rest) = name.split_once(EXAMPLE_MARKER)?;
    if rest.is_empty() || rest.starts_with('.') {
        Some(topic)
    } else {
        None
    }
}

/// Returns true when `value` is usable as an integration or topic identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER.is_match(value)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Discovers every example entry under one corpus root.
///
/// The walk is sorted by file name and does not follow symlinks.
///
/// ## Errors
///
/// - [`PrimerError::CorpusNotFound`] when `root` does not exist
/// - [`PrimerError::MalformedEntry`] when an example's integration or topic
///   cannot be derived, or a sidecar is invalid
/// - [`PrimerError::Io`] when a file or directory cannot be read
pub fn discover_entries(root: &Path) -> Result<Vec<SnippetEntry>> {
    if !root.is_dir() {
        return Err(PrimerError::CorpusNotFound(root.to_path_buf()));
    }

    let mut entries = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for item in walker {
        let item = item.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            PrimerError::io(path, std::io::Error::from(err))
        })?;

        if !item.file_type().is_file() {
            continue;
        }

        let name = item.file_name().to_string_lossy();
        let Some(topic) = topic_from_file_name(&name) else {
            trace!("Skipping non-example file {:?}", item.path());
            continue;
        };

        let integration = integration_for(root, item.path())?;
        if topic.is_empty() || !is_valid_identifier(topic) {
            return Err(PrimerError::malformed(
                item.path(),
                format!("invalid topic '{topic}'"),
            ));
        }

        let content = std::fs::read_to_string(item.path())
            .map_err(|e| PrimerError::io(item.path(), e))?;

        let mut entry = SnippetEntry::new(integration, topic, content).with_source(item.path());
        if let Some(ext) = item.path().extension() {
            entry = entry.with_extension(ext.to_string_lossy());
        }

        debug!("Discovered snippet {} at {:?}", entry.id, item.path());
        entries.push(entry);
    }

    apply_sidecars(root, &mut entries)?;
    Ok(entries)
}

/// Derives the integration identifier from an example's location.
fn integration_for(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let integration = match parts.as_slice() {
        [_file] => {
            return Err(PrimerError::malformed(
                path,
                "example file is not inside an integration directory",
            ));
        }
        [integration, _file] => integration,
        [integration, assets, _file] if assets == ASSETS_DIR => integration,
        _ => {
            return Err(PrimerError::malformed(
                path,
                format!("examples must live in <integration>/ or <integration>/{ASSETS_DIR}/"),
            ));
        }
    };

    if !is_valid_identifier(integration) {
        return Err(PrimerError::malformed(
            path,
            format!("invalid integration '{integration}'"),
        ));
    }
    Ok(integration.clone())
}

fn apply_sidecars(root: &Path, entries: &mut [SnippetEntry]) -> Result<()> {
    let dirs = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for dir in dirs {
        let dir = dir.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            PrimerError::io(path, std::io::Error::from(err))
        })?;
        if !dir.file_type().is_dir() {
            continue;
        }

        let sidecar_path = dir.path().join(SIDECAR_FILE);
        if !sidecar_path.is_file() {
            continue;
        }

        let integration = dir.file_name().to_string_lossy();
        let raw = std::fs::read_to_string(&sidecar_path)
            .map_err(|e| PrimerError::io(&sidecar_path, e))?;
        let sidecar: Sidecar = toml::from_str(&raw).map_err(|e| {
            PrimerError::malformed(&sidecar_path, format!("invalid sidecar: {e}"))
        })?;

        for (topic, meta) in sidecar.topics {
            let Some(entry) = entries
                .iter_mut()
                .find(|e| e.integration == integration && e.topic == topic)
            else {
                return Err(PrimerError::malformed(
                    &sidecar_path,
                    format!("sidecar names unknown topic '{topic}'"),
                ));
            };

            if let Some(range) = meta.compatible_versions {
                let req = parse_range(&range).map_err(|e| {
                    PrimerError::malformed(&sidecar_path, format!("topic '{topic}': {e}"))
                })?;
                entry.compatible_versions = Some(req);
            }
        }
    }

    Ok(())
}
