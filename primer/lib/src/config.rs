//! Runtime configuration.
//!
//! [`PrimerConfig`] is a builder; [`PrimerConfig::from_env`] fills it from
//! environment variables:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `PRIMER_CORPUS_DIR` | corpus roots, separated like `PATH` |
//! | `PRIMER_DESCRIPTORS` | descriptor TOML file (built-in table otherwise) |
//! | `PRIMER_MAX_ENTRIES` | bundle entry limit |
//! | `PRIMER_MAX_BYTES` | bundle byte limit |
//! | `PRIMER_TRUNCATION` | `drop-lowest-priority` or `fail` |
//! | `PRIMER_EXCLUDE_MISMATCH` | `true` to leave out version mismatches |

use crate::bundle::{Budget, TruncationPolicy};
use crate::descriptor::DescriptorSet;
use crate::select::SelectOptions;
use crate::store::SnippetStore;
use crate::Result;
use std::path::PathBuf;
use tracing::warn;

pub const ENV_CORPUS_DIR: &str = "PRIMER_CORPUS_DIR";
pub const ENV_DESCRIPTORS: &str = "PRIMER_DESCRIPTORS";
pub const ENV_MAX_ENTRIES: &str = "PRIMER_MAX_ENTRIES";
pub const ENV_MAX_BYTES: &str = "PRIMER_MAX_BYTES";
pub const ENV_TRUNCATION: &str = "PRIMER_TRUNCATION";
pub const ENV_EXCLUDE_MISMATCH: &str = "PRIMER_EXCLUDE_MISMATCH";

/// Configuration for a full load → select → bundle run.
///
/// ## Examples
///
/// ```
/// use primer_lib::{PrimerConfig, TruncationPolicy};
/// use std::path::PathBuf;
///
/// let config = PrimerConfig::new()
///     .corpus_dir(PathBuf::from("corpus"))
///     .max_entries(8)
///     .truncation_policy(TruncationPolicy::Fail);
/// assert_eq!(config.budget.max_entries, Some(8));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrimerConfig {
    /// Corpus roots, loaded in order.
    pub corpus_dirs: Vec<PathBuf>,
    /// Descriptor file; the built-in table is used when unset.
    pub descriptors_path: Option<PathBuf>,
    pub budget: Budget,
    pub select: SelectOptions,
}

impl PrimerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `PRIMER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparsable values are ignored
    /// with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(dirs) = lookup(ENV_CORPUS_DIR) {
            config.corpus_dirs = std::env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        config.descriptors_path = lookup(ENV_DESCRIPTORS)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        config.budget.max_entries = parse(&lookup, ENV_MAX_ENTRIES);
        config.budget.max_bytes = parse(&lookup, ENV_MAX_BYTES);
        if let Some(policy) = parse::<TruncationPolicy>(&lookup, ENV_TRUNCATION) {
            config.budget.truncation_policy = policy;
        }
        config.budget.exclude_version_mismatch =
            lookup(ENV_EXCLUDE_MISMATCH).is_some_and(|v| v == "true" || v == "1");

        config
    }

    /// Adds a corpus root.
    pub fn corpus_dir(mut self, path: PathBuf) -> Self {
        self.corpus_dirs.push(path);
        self
    }

    pub fn descriptors(mut self, path: PathBuf) -> Self {
        self.descriptors_path = Some(path);
        self
    }

    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn max_entries(mut self, max: usize) -> Self {
        self.budget.max_entries = Some(max);
        self
    }

    pub fn max_bytes(mut self, max: usize) -> Self {
        self.budget.max_bytes = Some(max);
        self
    }

    pub fn truncation_policy(mut self, policy: TruncationPolicy) -> Self {
        self.budget.truncation_policy = policy;
        self
    }

    pub fn exclude_version_mismatch(mut self, exclude: bool) -> Self {
        self.budget.exclude_version_mismatch = exclude;
        self
    }

    /// Loads the store from the configured corpus roots.
    pub fn load_store(&self) -> Result<SnippetStore> {
        if self.corpus_dirs.is_empty() {
            warn!("No corpus directories configured; the store is empty");
        }
        SnippetStore::load(&self.corpus_dirs)
    }

    /// Loads the configured descriptors, or the built-in table.
    pub fn load_descriptors(&self) -> Result<DescriptorSet> {
        match &self.descriptors_path {
            Some(path) => DescriptorSet::from_path(path),
            None => DescriptorSet::builtin(),
        }
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {key}: {raw:?}");
            None
        }
    }
}
