//! Dependency detection: shaping a manifest into a [`ProjectSignature`].
//!
//! Detection is a pure data-shaping step. Deciding which integrations apply
//! is left to the selector.

use crate::manifest::Manifest;
use crate::version::resolve_declared_version;
use crate::{PrimerError, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Conditions detected while shaping a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SignatureDiagnostic {
    /// The manifest declared no dependencies; callers should match nothing.
    EmptyManifest,
}

/// The dependencies a project declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSignature {
    pub dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<SignatureDiagnostic>,
}

impl ProjectSignature {
    /// True when the signature came from a manifest without dependencies.
    pub fn is_empty_manifest(&self) -> bool {
        self.diagnostic == Some(SignatureDiagnostic::EmptyManifest)
    }

    /// Converts the empty-manifest flag into an error.
    ///
    /// ## Errors
    ///
    /// Returns [`PrimerError::EmptyManifest`] when the flag is set.
    pub fn ensure_non_empty(&self) -> Result<&Self> {
        if self.is_empty_manifest() {
            Err(PrimerError::EmptyManifest)
        } else {
            Ok(self)
        }
    }

    /// Concrete version a dependency's declared constraint anchors on.
    pub fn declared_version(&self, package: &str) -> Option<Version> {
        self.dependencies
            .get(package)
            .and_then(|declared| resolve_declared_version(declared))
    }
}

/// Shapes a manifest into a signature.
///
/// ## Examples
///
/// ```
/// use primer_lib::{detect, Manifest};
///
/// let manifest = Manifest::from_iter([("convex", "^1.2.0")]);
/// let signature = detect(&manifest);
/// assert!(!signature.is_empty_manifest());
///
/// let empty = detect(&Manifest::new());
/// assert!(empty.is_empty_manifest());
/// ```
pub fn detect(manifest: &Manifest) -> ProjectSignature {
    let diagnostic = if manifest.is_empty() {
        debug!("Manifest declares no dependencies");
        Some(SignatureDiagnostic::EmptyManifest)
    } else {
        None
    };

    ProjectSignature {
        dependencies: manifest.dependencies().clone(),
        diagnostic,
    }
}
