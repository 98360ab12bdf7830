//! Integration descriptors and their detection rules.
//!
//! Descriptors are read from TOML (or the built-in table) and compiled once:
//! globs become matchers and version constraints become [`VersionRange`]s.
//!
//! ```toml
//! [[integrations]]
//! identifier = "convex"
//! topic_priority = ["schema", "functions", "crons"]
//!
//! [[integrations.detection_rules]]
//! package_pattern = "convex"
//! version_constraint = "^1"
//! ```

use crate::corpus::is_valid_identifier;
use crate::version::{VersionRange, parse_range, satisfies};
use crate::{PrimerError, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::trace;

const BUILTIN_DESCRIPTORS: &str = include_str!("../descriptors.toml");

/// How a rule recognizes a package name.
#[derive(Debug, Clone)]
pub enum PackagePattern {
    /// The package name must equal this string.
    Exact(String),
    /// The package name must match this glob (`@scope/*`).
    Glob { pattern: String, matcher: GlobMatcher },
}

impl PackagePattern {
    /// Parses a pattern; any glob metacharacter makes it a glob.
    ///
    /// ## Errors
    ///
    /// Returns [`PrimerError::InvalidPattern`] when the glob does not compile.
    pub fn parse(pattern: &str) -> Result<Self> {
        if !pattern.contains(['*', '?', '[', '{']) {
            return Ok(Self::Exact(pattern.to_string()));
        }

        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| PrimerError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self::Glob {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn matches(&self, package: &str) -> bool {
        match self {
            Self::Exact(name) => name == package,
            Self::Glob { matcher, .. } => matcher.is_match(package),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(name) => name,
            Self::Glob { pattern, .. } => pattern,
        }
    }
}

/// A package pattern plus an optional version constraint.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    pub pattern: PackagePattern,
    pub version: Option<VersionRange>,
}

impl DetectionRule {
    pub fn new(pattern: PackagePattern) -> Self {
        Self {
            pattern,
            version: None,
        }
    }

    pub fn with_version(mut self, version: VersionRange) -> Self {
        self.version = Some(version);
        self
    }

    /// Tests one declared dependency against the rule.
    pub fn matches(&self, package: &str, declared: &str) -> bool {
        if !self.pattern.matches(package) {
            return false;
        }
        match &self.version {
            Some(req) => satisfies(declared, req),
            None => true,
        }
    }

    /// First dependency (in name order) the rule accepts.
    pub fn find_match<'a>(
        &self,
        dependencies: &'a BTreeMap<String, String>,
    ) -> Option<(&'a str, &'a str)> {
        dependencies
            .iter()
            .find(|(name, declared)| self.matches(name, declared))
            .map(|(name, declared)| (name.as_str(), declared.as_str()))
    }
}

/// A known integration and how to recognize it.
#[derive(Debug, Clone)]
pub struct IntegrationDescriptor {
    pub identifier: String,
    pub detection_rules: Vec<DetectionRule>,
    /// Canonical topic order; empty means "use the selector default".
    pub topic_priority: Vec<String>,
    /// Package whose declared version is checked against entry ranges.
    /// Falls back to the first exact-name rule when unset.
    pub version_package: Option<String>,
}

impl IntegrationDescriptor {
    pub fn new(identifier: impl Into<String>, detection_rules: Vec<DetectionRule>) -> Self {
        Self {
            identifier: identifier.into(),
            detection_rules,
            topic_priority: Vec::new(),
            version_package: None,
        }
    }

    pub fn with_topic_priority<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_priority = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version_package(mut self, package: impl Into<String>) -> Self {
        self.version_package = Some(package.into());
        self
    }

    /// The package that carries the integration's own version.
    ///
    /// Packages matched through other rules (plugins, meta-frameworks) are
    /// versioned independently and say nothing about the integration.
    pub fn versioned_package(&self) -> Option<&str> {
        self.version_package.as_deref().or_else(|| {
            self.detection_rules.iter().find_map(|rule| match &rule.pattern {
                PackagePattern::Exact(name) => Some(name.as_str()),
                PackagePattern::Glob { .. } => None,
            })
        })
    }

    /// Convenience for the common single exact-name rule.
    pub fn for_package(identifier: impl Into<String>, package: impl Into<String>) -> Self {
        Self::new(
            identifier,
            vec![DetectionRule::new(PackagePattern::Exact(package.into()))],
        )
    }

    /// Tests the rules in order; any match wins.
    ///
    /// Returns the package name and declared version that triggered it.
    pub fn detect<'a>(
        &self,
        dependencies: &'a BTreeMap<String, String>,
    ) -> Option<(&'a str, &'a str)> {
        self.detection_rules.iter().find_map(|rule| {
            let hit = rule.find_match(dependencies);
            if let Some((package, _)) = hit {
                trace!(
                    integration = %self.identifier,
                    rule = rule.pattern.as_str(),
                    package,
                    "Detection rule matched"
                );
            }
            hit
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptorFile {
    #[serde(default)]
    integrations: Vec<RawDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    identifier: String,
    #[serde(default, alias = "topicPriority")]
    topic_priority: Vec<String>,
    #[serde(default, alias = "versionPackage")]
    version_package: Option<String>,
    #[serde(default, alias = "detectionRules")]
    detection_rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    #[serde(alias = "packagePattern")]
    package_pattern: String,
    #[serde(default, alias = "versionConstraint")]
    version_constraint: Option<String>,
}

impl RawDescriptor {
    fn compile(self) -> Result<IntegrationDescriptor> {
        if !is_valid_identifier(&self.identifier) {
            return Err(PrimerError::InvalidDescriptor {
                identifier: self.identifier,
                reason: "identifier must match [A-Za-z0-9][A-Za-z0-9._-]*".to_string(),
            });
        }
        if self.detection_rules.is_empty() {
            return Err(PrimerError::InvalidDescriptor {
                identifier: self.identifier,
                reason: "at least one detection rule is required".to_string(),
            });
        }

        let detection_rules = self
            .detection_rules
            .into_iter()
            .map(|raw| {
                let pattern = PackagePattern::parse(&raw.package_pattern)?;
                let version = raw
                    .version_constraint
                    .as_deref()
                    .map(parse_range)
                    .transpose()?;
                Ok(DetectionRule { pattern, version })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(IntegrationDescriptor {
            identifier: self.identifier,
            detection_rules,
            topic_priority: self.topic_priority,
            version_package: self.version_package,
        })
    }
}

/// Ordered set of descriptors. Order is the bundle's integration order.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    descriptors: Vec<IntegrationDescriptor>,
}

impl DescriptorSet {
    pub fn new(descriptors: Vec<IntegrationDescriptor>) -> Self {
        Self { descriptors }
    }

    /// The descriptors shipped with the library.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_DESCRIPTORS, Path::new("<builtin>"))
    }

    /// Parses descriptors from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<inline>"))
    }

    /// Reads descriptors from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PrimerError::io(path, e))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, origin: &Path) -> Result<Self> {
        let raw: RawDescriptorFile = toml::from_str(content).map_err(|source| PrimerError::Toml {
            path: PathBuf::from(origin),
            source,
        })?;

        let descriptors = raw
            .integrations
            .into_iter()
            .map(RawDescriptor::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { descriptors })
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntegrationDescriptor> {
        self.descriptors.iter()
    }

    /// First descriptor declared for an identifier.
    pub fn get(&self, identifier: &str) -> Option<&IntegrationDescriptor> {
        self.descriptors.iter().find(|d| d.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl FromIterator<IntegrationDescriptor> for DescriptorSet {
    fn from_iter<I: IntoIterator<Item = IntegrationDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn exact_pattern_matches_only_the_name() {
        let pattern = PackagePattern::parse("convex").unwrap();
        assert!(matches!(pattern, PackagePattern::Exact(_)));
        assert!(pattern.matches("convex"));
        assert!(!pattern.matches("convex-svelte"));
    }

    #[test]
    fn glob_pattern_matches_scope() {
        let pattern = PackagePattern::parse("@better-auth/*").unwrap();
        assert!(pattern.matches("@better-auth/cli"));
        assert!(!pattern.matches("better-auth"));
        assert!(!pattern.matches("@better-auth/cli/nested"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = PackagePattern::parse("[unclosed").unwrap_err();
        assert!(matches!(err, PrimerError::InvalidPattern { .. }));
    }

    #[test]
    fn rule_with_version_requires_satisfying_declaration() {
        let rule = DetectionRule::new(PackagePattern::parse("tailwindcss").unwrap())
            .with_version(parse_range(">=4.0.0").unwrap());

        assert!(rule.matches("tailwindcss", "^4.1.0"));
        assert!(!rule.matches("tailwindcss", "^3.4.0"));
        assert!(!rule.matches("tailwindcss", "latest"));
    }

    #[test]
    fn descriptor_rules_are_ored() {
        let descriptor = IntegrationDescriptor::new(
            "better-auth",
            vec![
                DetectionRule::new(PackagePattern::parse("better-auth").unwrap()),
                DetectionRule::new(PackagePattern::parse("@better-auth/*").unwrap()),
            ],
        );

        let scoped = deps(&[("@better-auth/cli", "1.0.0")]);
        assert_eq!(descriptor.detect(&scoped), Some(("@better-auth/cli", "1.0.0")));

        let unrelated = deps(&[("react", "18")]);
        assert_eq!(descriptor.detect(&unrelated), None);
    }

    #[test]
    fn builtin_table_compiles() {
        let set = DescriptorSet::builtin().unwrap();
        let ids: Vec<&str> = set.iter().map(|d| d.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec!["convex", "better-auth", "autumn", "svelte", "tailwind-v4"]
        );
        assert_eq!(
            set.get("convex").unwrap().topic_priority[..3],
            ["schema", "functions", "crons"]
        );
    }

    #[test]
    fn versioned_package_prefers_explicit_then_first_exact_rule() {
        let svelte = IntegrationDescriptor::new(
            "svelte",
            vec![
                DetectionRule::new(PackagePattern::parse("@sveltejs/*").unwrap()),
                DetectionRule::new(PackagePattern::parse("svelte").unwrap()),
            ],
        );
        assert_eq!(svelte.versioned_package(), Some("svelte"));

        let pinned = svelte.clone().with_version_package("svelte-core");
        assert_eq!(pinned.versioned_package(), Some("svelte-core"));

        let globs_only = IntegrationDescriptor::new(
            "tailwind",
            vec![DetectionRule::new(PackagePattern::parse("@tailwindcss/*").unwrap())],
        );
        assert_eq!(globs_only.versioned_package(), None);
    }

    #[test]
    fn version_package_is_read_from_toml() {
        let set = DescriptorSet::from_toml_str(
            r#"
            [[integrations]]
            identifier = "svelte"
            version_package = "svelte"
            detection_rules = [{ package_pattern = "@sveltejs/kit" }]
            "#,
        )
        .unwrap();
        assert_eq!(set.get("svelte").unwrap().versioned_package(), Some("svelte"));
    }

    #[test]
    fn camel_case_field_names_are_accepted() {
        let set = DescriptorSet::from_toml_str(
            r#"
            [[integrations]]
            identifier = "svelte"
            detectionRules = [{ packagePattern = "svelte", versionConstraint = "^5" }]
            "#,
        )
        .unwrap();

        let svelte = set.get("svelte").unwrap();
        assert!(svelte.detection_rules[0].version.is_some());
    }

    #[test]
    fn descriptor_without_rules_is_invalid() {
        let err = DescriptorSet::from_toml_str(
            r#"
            [[integrations]]
            identifier = "convex"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PrimerError::InvalidDescriptor { .. }));
    }

    #[test]
    fn bad_version_constraint_is_invalid() {
        let err = DescriptorSet::from_toml_str(
            r#"
            [[integrations]]
            identifier = "convex"
            detection_rules = [{ package_pattern = "convex", version_constraint = "one" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PrimerError::InvalidVersionRange { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DescriptorSet::from_toml_str(
            r#"
            [[integrations]]
            identifier = "convex"
            colour = "blue"
            detection_rules = [{ package_pattern = "convex" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PrimerError::Toml { .. }));
    }
}
