//! Budgeted bundling of a selection.
//!
//! The bundle keeps the selector's order. When a budget is exceeded, entries
//! are dropped from the tail (lowest priority first) until both the entry and
//! byte limits hold, so the kept entries are always a prefix of the selection.
//! Everything that was left out is listed in [`Bundle::dropped`].

use crate::select::SelectionResult;
use crate::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What to do when a selection does not fit the budget.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TruncationPolicy {
    /// Drop entries from the tail of the ordering until the bundle fits.
    #[default]
    DropLowestPriority,
    /// Refuse to produce a partial bundle.
    Fail,
}

/// Size limits for a bundle. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Budget {
    pub max_entries: Option<usize>,
    pub max_bytes: Option<usize>,
    pub truncation_policy: TruncationPolicy,
    /// Leave out entries flagged as version mismatches.
    pub exclude_version_mismatch: bool,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = Some(max);
        self
    }

    pub fn truncation_policy(mut self, policy: TruncationPolicy) -> Self {
        self.truncation_policy = policy;
        self
    }

    pub fn exclude_version_mismatch(mut self, exclude: bool) -> Self {
        self.exclude_version_mismatch = exclude;
        self
    }

    fn fits(&self, entries: usize, bytes: usize) -> bool {
        self.max_entries.is_none_or(|max| entries <= max)
            && self.max_bytes.is_none_or(|max| bytes <= max)
    }
}

/// Why something is missing from a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DropReason {
    /// The integration matched but the corpus has no entries for it.
    NoEntries,
    /// The entry was flagged as a version mismatch and the budget excludes those.
    VersionMismatchExcluded,
    /// The entry did not fit the budget.
    BudgetTruncated,
}

/// One dropped integration or entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRecord {
    pub integration: String,
    /// `None` when the whole integration is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: DropReason,
}

/// An entry as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledEntry {
    pub id: String,
    pub integration: String,
    pub topic: String,
    pub content: String,
    pub version_mismatch: bool,
    /// Source file extension, used as a fence hint when rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// The ordered, size-bounded output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub entries: Vec<BundledEntry>,
    pub dropped: Vec<DropRecord>,
    /// Sum of the included entries' content sizes in bytes.
    pub total_bytes: usize,
}

impl Bundle {
    /// True when nothing was dropped for any reason.
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }

    pub fn dropped_for(&self, reason: DropReason) -> impl Iterator<Item = &DropRecord> {
        self.dropped.iter().filter(move |d| d.reason == reason)
    }
}

/// Assembles a selection into a bundle under a budget.
///
/// ## Examples
///
/// ```
/// use primer_lib::{bundle, Budget, DropReason, SelectionResult};
///
/// let selection = SelectionResult::default();
/// let out = bundle(&selection, &Budget::unlimited().max_entries(3)).unwrap();
/// assert!(out.entries.is_empty());
/// assert_eq!(out.dropped_for(DropReason::BudgetTruncated).count(), 0);
/// ```
///
/// ## Errors
///
/// Returns [`PrimerError::BudgetExceeded`] when the selection does not fit
/// and the policy is [`TruncationPolicy::Fail`].
pub fn bundle(selection: &SelectionResult, budget: &Budget) -> Result<Bundle> {
    let mut dropped: Vec<DropRecord> = selection
        .empty_integrations
        .iter()
        .map(|integration| DropRecord {
            integration: integration.clone(),
            id: None,
            reason: DropReason::NoEntries,
        })
        .collect();

    let mut candidates = Vec::with_capacity(selection.entries.len());
    for selected in &selection.entries {
        if budget.exclude_version_mismatch && selected.version_mismatch {
            dropped.push(DropRecord {
                integration: selected.entry.integration.clone(),
                id: Some(selected.entry.id.clone()),
                reason: DropReason::VersionMismatchExcluded,
            });
            continue;
        }
        candidates.push(selected);
    }

    let total_bytes: usize = candidates.iter().map(|s| s.entry.size()).sum();
    let mut keep = candidates.len();
    let mut kept_bytes = total_bytes;
    while !budget.fits(keep, kept_bytes) {
        keep -= 1;
        kept_bytes -= candidates[keep].entry.size();
    }

    if keep < candidates.len() {
        if budget.truncation_policy == TruncationPolicy::Fail {
            return Err(PrimerError::BudgetExceeded {
                entries: candidates.len(),
                bytes: total_bytes,
                max_entries: budget.max_entries,
                max_bytes: budget.max_bytes,
            });
        }

        debug!(
            kept = keep,
            dropped = candidates.len() - keep,
            "Truncating bundle to fit budget"
        );
        dropped.extend(candidates[keep..].iter().map(|s| DropRecord {
            integration: s.entry.integration.clone(),
            id: Some(s.entry.id.clone()),
            reason: DropReason::BudgetTruncated,
        }));
    }

    let entries: Vec<BundledEntry> = candidates[..keep]
        .iter()
        .map(|s| BundledEntry {
            id: s.entry.id.clone(),
            integration: s.entry.integration.clone(),
            topic: s.entry.topic.clone(),
            content: s.entry.content.clone(),
            version_mismatch: s.version_mismatch,
            extension: s.entry.extension.clone(),
        })
        .collect();

    info!(
        entries = entries.len(),
        bytes = kept_bytes,
        dropped = dropped.len(),
        "Bundle assembled"
    );

    Ok(Bundle {
        entries,
        dropped,
        total_bytes: kept_bytes,
    })
}
