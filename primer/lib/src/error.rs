use std::path::PathBuf;

/// Error types for the Primer library.
///
/// Load-time variants (`DuplicateId`, `MalformedEntry`, descriptor errors)
/// mean the catalog must not be served. Request-time conditions such as an
/// empty manifest or a truncated bundle are normally reported as data; the
/// matching variants here exist for callers that opt into hard failures.
#[derive(Debug, thiserror::Error)]
pub enum PrimerError {
    /// IO error while reading a corpus file, sidecar, or manifest.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured corpus root does not exist.
    #[error("Corpus directory not found: {0}")]
    CorpusNotFound(PathBuf),

    /// Two corpus files resolved to the same entry id.
    #[error("Duplicate snippet id '{id}': {first} and {second}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Integration or topic could not be derived from an entry's location.
    #[error("Malformed entry at {path}: {reason}")]
    MalformedEntry { path: PathBuf, reason: String },

    /// A descriptor is structurally invalid.
    #[error("Invalid integration descriptor '{identifier}': {reason}")]
    InvalidDescriptor { identifier: String, reason: String },

    /// A package glob in a detection rule failed to compile.
    #[error("Invalid package pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A version range failed to parse.
    #[error("Invalid version range '{range}': {source}")]
    InvalidVersionRange {
        range: String,
        #[source]
        source: semver::Error,
    },

    /// TOML parsing failed (descriptors, sidecars, Cargo manifests).
    #[error("TOML error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// JSON parsing failed (package.json, flat manifests).
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest declared no dependencies.
    #[error("Manifest declares no dependencies")]
    EmptyManifest,

    /// The bundle does not fit the budget under the `fail` policy.
    #[error(
        "Budget exceeded: selection has {entries} entries / {bytes} bytes \
         (limits: {max_entries:?} entries, {max_bytes:?} bytes)"
    )]
    BudgetExceeded {
        entries: usize,
        bytes: usize,
        max_entries: Option<usize>,
        max_bytes: Option<usize>,
    },
}

impl PrimerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result type for Primer operations.
pub type Result<T> = std::result::Result<T, PrimerError>;
