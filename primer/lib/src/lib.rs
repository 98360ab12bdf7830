//! Catalog of integration examples, selected by what a project depends on.
//!
//! The pipeline has four stages:
//!
//! 1. [`SnippetStore::load`] indexes a corpus of example files once.
//! 2. [`detect`] shapes a project's [`Manifest`] into a [`ProjectSignature`].
//! 3. [`select`] matches [`DescriptorSet`] rules against the signature and
//!    orders the relevant entries.
//! 4. [`bundle`] fits the selection into a [`Budget`] and reports what was
//!    left out.
//!
//! Every stage after loading is a pure function; the store is immutable and
//! safe to share between threads.
//!
//! ## Examples
//!
//! ```no_run
//! use primer_lib::{prime, Manifest, PrimerConfig};
//! use std::path::{Path, PathBuf};
//!
//! let config = PrimerConfig::new()
//!     .corpus_dir(PathBuf::from("corpus"))
//!     .max_entries(6);
//! let manifest = Manifest::from_project_dir(Path::new(".")).unwrap();
//! let bundle = prime(&config, &manifest).unwrap();
//! println!("{}", primer_lib::render_markdown(&bundle));
//! ```

pub mod bundle;
pub mod config;
pub mod corpus;
pub mod descriptor;
pub mod detect;
pub mod entry;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod render;
pub mod select;
pub mod store;
pub mod version;

pub use bundle::{Budget, Bundle, BundledEntry, DropReason, DropRecord, TruncationPolicy, bundle};
pub use config::PrimerConfig;
pub use descriptor::{DescriptorSet, DetectionRule, IntegrationDescriptor, PackagePattern};
pub use detect::{ProjectSignature, SignatureDiagnostic, detect};
pub use entry::SnippetEntry;
pub use error::{PrimerError, Result};
pub use filter::filter_entries;
pub use manifest::Manifest;
pub use render::render_markdown;
pub use select::{
    IntegrationMatch, SelectOptions, SelectedEntry, SelectionResult, select, select_with_options,
};
pub use store::{SharedStore, SnippetStore};

/// Runs the whole pipeline for one project with a freshly loaded store.
///
/// Long-lived callers should load the store once and call [`prime_with`].
pub fn prime(config: &PrimerConfig, manifest: &Manifest) -> Result<Bundle> {
    let store = config.load_store()?;
    let descriptors = config.load_descriptors()?;
    prime_with(config, &store, &descriptors, manifest)
}

/// Runs detect → select → bundle against an already loaded store.
pub fn prime_with(
    config: &PrimerConfig,
    store: &SnippetStore,
    descriptors: &DescriptorSet,
    manifest: &Manifest,
) -> Result<Bundle> {
    let signature = detect(manifest);
    let selection = select_with_options(&signature, store, descriptors, &config.select);
    bundle(&selection, &config.budget)
}
