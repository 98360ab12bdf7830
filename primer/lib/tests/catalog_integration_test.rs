//! End-to-end tests for the load → detect → select → bundle pipeline.
//!
//! Uses the fixture corpus under `tests/fixtures/corpus` and the built-in
//! descriptor table.

use primer_lib::{
    Budget, DescriptorSet, DropReason, IntegrationDescriptor, Manifest, PrimerConfig,
    PrimerError, SnippetEntry, SnippetStore, TruncationPolicy, bundle, detect, prime, select,
    version::parse_range,
};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn corpus() -> SnippetStore {
    SnippetStore::load(&[fixtures_dir().join("corpus")]).expect("Failed to load fixture corpus")
}

fn entry_ids(result: &primer_lib::SelectionResult) -> Vec<&str> {
    result.entries.iter().map(|e| e.entry.id.as_str()).collect()
}

#[test]
fn test_fixture_corpus_loads_every_example() {
    let store = corpus();

    assert_eq!(store.len(), 10);
    let integrations: Vec<&str> = store.integrations().collect();
    assert_eq!(
        integrations,
        vec!["autumn", "better-auth", "convex", "svelte", "tailwind-v4"]
    );
    assert!(store.get("tailwind-v4/vite.config").is_some());
    assert!(store.get("svelte/counter.svelte").is_some());
}

#[test]
fn test_ids_and_integration_topic_pairs_are_unique() {
    let store = corpus();

    let ids: HashSet<&str> = store.iter().map(|e| e.id.as_str()).collect();
    let pairs: HashSet<(&str, &str)> = store
        .iter()
        .map(|e| (e.integration.as_str(), e.topic.as_str()))
        .collect();
    assert_eq!(ids.len(), store.len());
    assert_eq!(pairs.len(), store.len());
}

#[test]
fn test_sidecar_versions_are_attached() {
    let store = corpus();

    let counter = store.get("svelte/counter.svelte").unwrap();
    assert!(counter.compatible_versions.is_some());
    let schema = store.get("convex/schema").unwrap();
    assert!(schema.compatible_versions.is_none());
}

#[test]
fn test_convex_topics_follow_default_priority() {
    let store = corpus();
    let descriptors =
        DescriptorSet::from_iter([IntegrationDescriptor::for_package("convex", "convex")]);
    let signature = detect(&Manifest::from_iter([("convex", "^1.2.0")]));

    let result = select(&signature, &store, &descriptors);

    assert_eq!(result.matched_identifiers(), BTreeSet::from(["convex"]));
    assert_eq!(
        &entry_ids(&result)[..3],
        &["convex/schema", "convex/functions", "convex/crons"]
    );
}

#[test]
fn test_empty_manifest_selects_nothing() {
    let store = corpus();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::new());

    assert!(signature.is_empty_manifest());
    assert!(matches!(
        signature.ensure_non_empty(),
        Err(PrimerError::EmptyManifest)
    ));

    let result = select(&signature, &store, &descriptors);
    assert!(result.entries.is_empty());
    assert!(result.empty_manifest);
}

#[test]
fn test_newer_project_version_is_flagged_as_mismatch() {
    let store = SnippetStore::from_entries(vec![
        SnippetEntry::new("svelte", "counter", "class Counter {}")
            .with_compatible_versions(parse_range("^4.0.0").unwrap()),
    ])
    .unwrap();
    let descriptors =
        DescriptorSet::from_iter([IntegrationDescriptor::for_package("svelte", "svelte")]);
    let signature = detect(&Manifest::from_iter([("svelte", "5.0.0")]));

    let result = select(&signature, &store, &descriptors);

    assert_eq!(result.entries.len(), 1);
    assert!(result.entries[0].version_mismatch);
}

#[test]
fn test_fixture_sidecar_flags_old_svelte() {
    let store = corpus();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::from_iter([("svelte", "^4.2.0")]));

    let result = select(&signature, &store, &descriptors);

    assert_eq!(
        entry_ids(&result),
        vec!["svelte/counter.svelte", "svelte/remote-functions"]
    );
    assert!(result.entries.iter().all(|e| e.version_mismatch));
}

#[test]
fn test_kit_only_project_is_not_flagged_against_svelte_ranges() {
    let store = corpus();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::from_iter([("@sveltejs/kit", "^2.20.0")]));

    let result = select(&signature, &store, &descriptors);

    assert_eq!(result.matched_integrations[0].identifier, "svelte");
    assert_eq!(result.matched_integrations[0].package, "@sveltejs/kit");
    assert_eq!(
        entry_ids(&result),
        vec!["svelte/counter.svelte", "svelte/remote-functions"]
    );
    assert!(result.entries.iter().all(|e| !e.version_mismatch));
}

#[test]
fn test_entry_budget_drops_lowest_priority() {
    let store = corpus();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::from_iter([("better-auth", "^1.3.0")]));
    let selection = select(&signature, &store, &descriptors);
    assert_eq!(selection.entries.len(), 2);

    let budget = Budget::unlimited()
        .max_entries(1)
        .truncation_policy(TruncationPolicy::DropLowestPriority);
    let out = bundle(&selection, &budget).unwrap();

    assert_eq!(out.entries.len(), 1);
    assert_eq!(out.entries[0].id, "better-auth/auth-server");
    assert_eq!(out.dropped.len(), 1);
    assert_eq!(out.dropped[0].id.as_deref(), Some("better-auth/auth-client"));
    assert_eq!(out.dropped[0].reason, DropReason::BudgetTruncated);
}

#[test]
fn test_fail_policy_rejects_oversized_selection() {
    let store = corpus();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::from_iter([("better-auth", "^1.3.0")]));
    let selection = select(&signature, &store, &descriptors);

    let budget = Budget::unlimited()
        .max_entries(1)
        .truncation_policy(TruncationPolicy::Fail);
    let err = bundle(&selection, &budget).unwrap_err();

    assert!(matches!(err, PrimerError::BudgetExceeded { entries: 2, .. }));
}

#[test]
fn test_matched_integration_without_examples_is_reported() {
    let store =
        SnippetStore::from_entries(vec![SnippetEntry::new("convex", "schema", "x")]).unwrap();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::from_iter([("convex", "1"), ("atmn", "0.0.20")]));

    let out = bundle(&select(&signature, &store, &descriptors), &Budget::unlimited()).unwrap();

    assert_eq!(out.entries.len(), 1);
    let missing: Vec<&str> = out
        .dropped_for(DropReason::NoEntries)
        .map(|d| d.integration.as_str())
        .collect();
    assert_eq!(missing, vec!["autumn"]);
}

#[test]
fn test_prime_against_fixture_project() {
    let config = PrimerConfig::new().corpus_dir(fixtures_dir().join("corpus"));
    let manifest =
        Manifest::from_project_dir(&fixtures_dir().join("projects/svelte-convex")).unwrap();

    let out = prime(&config, &manifest).unwrap();
    let ids: Vec<&str> = out.entries.iter().map(|e| e.id.as_str()).collect();

    assert_eq!(
        ids,
        vec![
            "convex/schema",
            "convex/functions",
            "convex/crons",
            "convex/svelte-integration",
            "better-auth/auth-server",
            "better-auth/auth-client",
            "svelte/counter.svelte",
            "svelte/remote-functions",
            "tailwind-v4/vite.config",
        ]
    );
    assert!(out.is_complete());
    assert!(out.entries.iter().all(|e| !e.version_mismatch));
}

#[test]
fn test_tailwind_v3_is_not_detected() {
    let store = corpus();
    let descriptors = DescriptorSet::builtin().unwrap();
    let signature = detect(&Manifest::from_iter([("tailwindcss", "^3.4.0")]));

    let result = select(&signature, &store, &descriptors);
    assert!(result.matched_integrations.is_empty());
}

#[test]
fn test_missing_corpus_root_fails_load() {
    let err = SnippetStore::load(&[fixtures_dir().join("no-such-corpus")]).unwrap_err();
    assert!(matches!(err, PrimerError::CorpusNotFound(_)));
}
