//! Version handling for declared dependency constraints and example ranges.
//!
//! Manifests declare *constraints* (`^1.2.0`, `~5`, `workspace:*`), while
//! detection rules and `compatible_versions` need a concrete version to test.
//! [`resolve_declared_version`] picks the lower bound a constraint names, and
//! [`parse_range`] accepts npm-style ranges in addition to Cargo syntax.

use crate::{PrimerError, Result};
use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_CORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(-[0-9A-Za-z.-]+)?").expect("static regex")
});

/// npm separates comparators with whitespace, semver wants commas.
static NPM_COMPARATOR_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9A-Za-z*])\s+([<>=~^])").expect("static regex"));

/// Resolves a declared constraint into the concrete version it anchors on.
///
/// Returns `None` for specifiers that carry no usable version: tags
/// (`latest`), bare wildcards, upper-bound-only ranges, and URL or path
/// sources.
///
/// ## Examples
///
/// ```
/// use primer_lib::version::resolve_declared_version;
/// use semver::Version;
///
/// assert_eq!(resolve_declared_version("^1.2.0"), Some(Version::new(1, 2, 0)));
/// assert_eq!(resolve_declared_version("5"), Some(Version::new(5, 0, 0)));
/// assert_eq!(resolve_declared_version("latest"), None);
/// ```
pub fn resolve_declared_version(declared: &str) -> Option<Version> {
    let mut spec = declared.trim();
    if let Some(rest) = spec.strip_prefix("workspace:") {
        spec = rest.trim();
    }

    let first = spec.split("||").next()?.trim();
    let first = first.split(',').next()?.trim();

    if first.starts_with('<') {
        return None;
    }

    let core = first.trim_start_matches(|c: char| {
        matches!(c, '^' | '~' | '=' | '>' | 'v') || c.is_whitespace()
    });

    let caps = VERSION_CORE.captures(core)?;
    let part = |idx: usize| -> Option<u64> { caps.get(idx).and_then(|m| m.as_str().parse().ok()) };

    let mut version = Version::new(part(1)?, part(2).unwrap_or(0), part(3).unwrap_or(0));
    if let Some(pre) = caps.get(4) {
        version.pre = semver::Prerelease::new(&pre.as_str()[1..]).ok()?;
    }
    Some(version)
}

/// A version range made of `||` alternatives; a version matches when any
/// alternative does.
///
/// Each alternative is a comparator list in Cargo (`>=1, <2`) or npm
/// (`>=1 <2`) syntax. Serializes as the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    text: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn alternatives(&self) -> &[VersionReq] {
        &self.alternatives
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for VersionRange {
    type Err = PrimerError;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = PrimerError;

    fn try_from(value: String) -> Result<Self> {
        parse_range(&value)
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.text
    }
}

/// Parses a version range, accepting Cargo syntax and npm's whitespace
/// comparator lists and `||` alternatives.
///
/// ## Examples
///
/// ```
/// use primer_lib::version::parse_range;
/// use semver::Version;
///
/// let range = parse_range("^4.0.0 || ^5.0.0").unwrap();
/// assert!(range.matches(&Version::new(5, 1, 0)));
/// assert!(!range.matches(&Version::new(3, 0, 0)));
/// ```
///
/// ## Errors
///
/// Returns [`PrimerError::InvalidVersionRange`] when any alternative does not
/// parse.
pub fn parse_range(range: &str) -> Result<VersionRange> {
    let text = range.trim();
    let alternatives = text
        .split("||")
        .map(|alternative| {
            let normalized = NPM_COMPARATOR_GAP.replace_all(alternative.trim(), "$1, $2");
            VersionReq::parse(&normalized).map_err(|source| PrimerError::InvalidVersionRange {
                range: range.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VersionRange {
        text: text.to_string(),
        alternatives,
    })
}

/// Returns true when `declared` resolves to a version that `range` accepts.
///
/// An unresolvable declaration never satisfies a range.
pub fn satisfies(declared: &str, range: &VersionRange) -> bool {
    resolve_declared_version(declared).is_some_and(|v| range.matches(&v))
}
