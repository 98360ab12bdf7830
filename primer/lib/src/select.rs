//! Selection of snippet entries for a project.
//!
//! The selector matches descriptors against a [`ProjectSignature`], pulls the
//! matched integrations' entries from the store, and orders them:
//!
//! 1. integration, in descriptor declaration order
//! 2. topic, by the descriptor's `topic_priority` (or [`DEFAULT_TOPIC_PRIORITY`]);
//!    unlisted topics come after listed ones
//! 3. entry id, lexicographically
//!
//! Identical inputs always produce identical output.

use crate::descriptor::DescriptorSet;
use crate::detect::ProjectSignature;
use crate::entry::SnippetEntry;
use crate::store::SnippetStore;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Topic order used when a descriptor does not define its own.
pub const DEFAULT_TOPIC_PRIORITY: &[&str] = &["schema", "functions", "crons"];

/// An integration whose detection rules matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationMatch {
    pub identifier: String,
    /// Dependency that triggered the match.
    pub package: String,
    /// Declared constraint of that dependency.
    pub declared_version: String,
}

/// A selected entry and whether it conflicts with the project's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedEntry {
    #[serde(flatten)]
    pub entry: Arc<SnippetEntry>,
    pub version_mismatch: bool,
}

/// Outcome of [`select`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    /// Matched integrations, deduplicated, in declaration order.
    pub matched_integrations: Vec<IntegrationMatch>,
    /// Selected entries in bundle order.
    pub entries: Vec<SelectedEntry>,
    /// Matched integrations that have no entries in the store.
    pub empty_integrations: Vec<String>,
    /// The signature came from a manifest without dependencies.
    pub empty_manifest: bool,
}

impl SelectionResult {
    /// Matched integration identifiers as a set.
    pub fn matched_identifiers(&self) -> BTreeSet<&str> {
        self.matched_integrations
            .iter()
            .map(|m| m.identifier.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Selector settings.
#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Topic order for descriptors with an empty `topic_priority`.
    pub default_topic_priority: Vec<String>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            default_topic_priority: DEFAULT_TOPIC_PRIORITY
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Selects the entries relevant to a project using default options.
///
/// ## Examples
///
/// ```
/// use primer_lib::{
///     detect, select, DescriptorSet, IntegrationDescriptor, Manifest, SnippetEntry,
///     SnippetStore,
/// };
///
/// let store = SnippetStore::from_entries(vec![
///     SnippetEntry::new("convex", "crons", "..."),
///     SnippetEntry::new("convex", "schema", "..."),
/// ])
/// .unwrap();
/// let descriptors =
///     DescriptorSet::from_iter([IntegrationDescriptor::for_package("convex", "convex")]);
/// let signature = detect(&Manifest::from_iter([("convex", "^1.2.0")]));
///
/// let result = select(&signature, &store, &descriptors);
/// let ids: Vec<&str> = result.entries.iter().map(|e| e.entry.id.as_str()).collect();
/// assert_eq!(ids, vec!["convex/schema", "convex/crons"]);
/// ```
pub fn select(
    signature: &ProjectSignature,
    store: &SnippetStore,
    descriptors: &DescriptorSet,
) -> SelectionResult {
    select_with_options(signature, store, descriptors, &SelectOptions::default())
}

/// Selects the entries relevant to a project.
pub fn select_with_options(
    signature: &ProjectSignature,
    store: &SnippetStore,
    descriptors: &DescriptorSet,
    options: &SelectOptions,
) -> SelectionResult {
    let mut result = SelectionResult {
        empty_manifest: signature.is_empty_manifest(),
        ..Default::default()
    };

    let mut seen_integrations: HashSet<&str> = HashSet::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for descriptor in descriptors.iter() {
        if seen_integrations.contains(descriptor.identifier.as_str()) {
            continue;
        }
        let Some((package, declared)) = descriptor.detect(&signature.dependencies) else {
            continue;
        };
        seen_integrations.insert(descriptor.identifier.as_str());

        debug!(
            integration = %descriptor.identifier,
            package,
            declared,
            "Integration matched"
        );
        result.matched_integrations.push(IntegrationMatch {
            identifier: descriptor.identifier.clone(),
            package: package.to_string(),
            declared_version: declared.to_string(),
        });

        let available = store.lookup(&descriptor.identifier);
        if available.is_empty() {
            debug!(integration = %descriptor.identifier, "Matched integration has no entries");
            result.empty_integrations.push(descriptor.identifier.clone());
            continue;
        }

        // Undeclared version package: nothing to compare against.
        let project_version = descriptor
            .versioned_package()
            .and_then(|name| signature.declared_version(name));
        let mut picked: Vec<SelectedEntry> = Vec::with_capacity(available.len());
        for entry in available {
            if !seen_ids.insert(entry.id.as_str()) {
                continue;
            }
            let version_mismatch = match (&entry.compatible_versions, &project_version) {
                (Some(req), Some(version)) => !req.matches(version),
                _ => false,
            };
            picked.push(SelectedEntry {
                entry: Arc::clone(entry),
                version_mismatch,
            });
        }

        let priority = if descriptor.topic_priority.is_empty() {
            &options.default_topic_priority
        } else {
            &descriptor.topic_priority
        };
        picked.sort_by(|a, b| {
            topic_rank(priority, &a.entry.topic)
                .cmp(&topic_rank(priority, &b.entry.topic))
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });

        result.entries.extend(picked);
    }

    info!(
        matched = result.matched_integrations.len(),
        entries = result.entries.len(),
        empty = result.empty_integrations.len(),
        "Selection complete"
    );
    result
}

/// Position of `topic` in `priority`; unlisted topics share the last rank.
fn topic_rank(priority: &[String], topic: &str) -> usize {
    priority
        .iter()
        .position(|t| t == topic)
        .unwrap_or(priority.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DetectionRule, IntegrationDescriptor, PackagePattern};
    use crate::detect::detect;
    use crate::manifest::Manifest;
    use crate::version::parse_range;

    fn store() -> SnippetStore {
        SnippetStore::from_entries(vec![
            SnippetEntry::new("convex", "crons", "c"),
            SnippetEntry::new("convex", "functions", "f"),
            SnippetEntry::new("convex", "schema", "s"),
            SnippetEntry::new("convex", "a-extra", "x"),
            SnippetEntry::new("svelte", "counter", "n")
                .with_compatible_versions(parse_range("^4.0.0").unwrap()),
            SnippetEntry::new("svelte", "runes", "r"),
        ])
        .unwrap()
    }

    fn ids(result: &SelectionResult) -> Vec<&str> {
        result.entries.iter().map(|e| e.entry.id.as_str()).collect()
    }

    #[test]
    fn canonical_topic_order_then_id() {
        let descriptors =
            DescriptorSet::from_iter([IntegrationDescriptor::for_package("convex", "convex")]);
        let signature = detect(&Manifest::from_iter([("convex", "^1.2.0")]));

        let result = select(&signature, &store(), &descriptors);
        assert_eq!(
            ids(&result),
            vec!["convex/schema", "convex/functions", "convex/crons", "convex/a-extra"]
        );
    }

    #[test]
    fn integrations_follow_declaration_order() {
        let descriptors = DescriptorSet::from_iter([
            IntegrationDescriptor::for_package("svelte", "svelte"),
            IntegrationDescriptor::for_package("convex", "convex"),
        ]);
        let signature = detect(&Manifest::from_iter([("convex", "1"), ("svelte", "4")]));

        let result = select(&signature, &store(), &descriptors);
        assert_eq!(result.entries[0].entry.integration, "svelte");
        assert_eq!(result.entries.last().unwrap().entry.integration, "convex");
    }

    #[test]
    fn duplicate_descriptor_contributes_once() {
        let descriptors = DescriptorSet::from_iter([
            IntegrationDescriptor::for_package("convex", "convex"),
            IntegrationDescriptor::for_package("convex", "convex"),
        ]);
        let signature = detect(&Manifest::from_iter([("convex", "1")]));

        let result = select(&signature, &store(), &descriptors);
        assert_eq!(result.matched_integrations.len(), 1);
        assert_eq!(result.entries.len(), 4);
    }

    #[test]
    fn matched_integration_without_entries_is_recorded() {
        let descriptors =
            DescriptorSet::from_iter([IntegrationDescriptor::for_package("autumn", "autumn-js")]);
        let signature = detect(&Manifest::from_iter([("autumn-js", "0.1.0")]));

        let result = select(&signature, &store(), &descriptors);
        assert_eq!(result.matched_identifiers(), BTreeSet::from(["autumn"]));
        assert!(result.entries.is_empty());
        assert_eq!(result.empty_integrations, vec!["autumn".to_string()]);
    }

    #[test]
    fn incompatible_version_is_flagged_not_excluded() {
        let descriptors =
            DescriptorSet::from_iter([IntegrationDescriptor::for_package("svelte", "svelte")]);
        let signature = detect(&Manifest::from_iter([("svelte", "5.0.0")]));

        let result = select(&signature, &store(), &descriptors);
        let counter = result
            .entries
            .iter()
            .find(|e| e.entry.id == "svelte/counter")
            .unwrap();
        assert!(counter.version_mismatch);

        let runes = result.entries.iter().find(|e| e.entry.id == "svelte/runes").unwrap();
        assert!(!runes.version_mismatch);
    }

    #[test]
    fn unresolvable_version_is_not_a_mismatch() {
        let descriptors =
            DescriptorSet::from_iter([IntegrationDescriptor::for_package("svelte", "svelte")]);
        let signature = detect(&Manifest::from_iter([("svelte", "next")]));

        let result = select(&signature, &store(), &descriptors);
        assert!(result.entries.iter().all(|e| !e.version_mismatch));
    }

    #[test]
    fn mismatch_uses_the_integration_package_not_the_trigger() {
        let descriptors = DescriptorSet::from_iter([IntegrationDescriptor::new(
            "svelte",
            vec![
                DetectionRule::new(PackagePattern::parse("svelte").unwrap()),
                DetectionRule::new(PackagePattern::parse("@sveltejs/kit").unwrap()),
            ],
        )]);

        // kit alone: svelte's own version is unknown
        let kit_only = detect(&Manifest::from_iter([("@sveltejs/kit", "^2.20.0")]));
        let result = select(&kit_only, &store(), &descriptors);
        assert_eq!(result.matched_integrations[0].package, "@sveltejs/kit");
        assert!(result.entries.iter().all(|e| !e.version_mismatch));

        let with_svelte = detect(&Manifest::from_iter([
            ("@sveltejs/kit", "^2.20.0"),
            ("svelte", "^5.0.0"),
        ]));
        let result = select(&with_svelte, &store(), &descriptors);
        let counter = result
            .entries
            .iter()
            .find(|e| e.entry.id == "svelte/counter")
            .unwrap();
        assert!(counter.version_mismatch);
    }

    #[test]
    fn version_constrained_rule_can_reject() {
        let descriptors = DescriptorSet::from_iter([IntegrationDescriptor::new(
            "svelte",
            vec![DetectionRule::new(PackagePattern::parse("svelte").unwrap())
                .with_version(parse_range(">=5").unwrap())],
        )]);
        let signature = detect(&Manifest::from_iter([("svelte", "^4.2.0")]));

        let result = select(&signature, &store(), &descriptors);
        assert!(result.matched_integrations.is_empty());
    }

    #[test]
    fn empty_manifest_matches_nothing() {
        let descriptors = DescriptorSet::builtin().unwrap();
        let signature = detect(&Manifest::new());

        let result = select(&signature, &store(), &descriptors);
        assert!(result.empty_manifest);
        assert!(result.entries.is_empty());
        assert!(result.matched_integrations.is_empty());
    }

    #[test]
    fn custom_default_priority_applies() {
        let descriptors =
            DescriptorSet::from_iter([IntegrationDescriptor::for_package("convex", "convex")]);
        let signature = detect(&Manifest::from_iter([("convex", "1")]));
        let options = SelectOptions {
            default_topic_priority: vec!["crons".to_string()],
        };

        let result = select_with_options(&signature, &store(), &descriptors, &options);
        assert_eq!(
            ids(&result),
            vec!["convex/crons", "convex/a-extra", "convex/functions", "convex/schema"]
        );
    }

    #[test]
    fn descriptor_priority_overrides_default() {
        let descriptors = DescriptorSet::from_iter([
            IntegrationDescriptor::for_package("convex", "convex")
                .with_topic_priority(["functions", "schema"]),
        ]);
        let signature = detect(&Manifest::from_iter([("convex", "1")]));

        let result = select(&signature, &store(), &descriptors);
        assert_eq!(&ids(&result)[..2], &["convex/functions", "convex/schema"]);
    }
}
