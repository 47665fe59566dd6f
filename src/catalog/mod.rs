//! Content catalog — static registry of every known module.
//!
//! Descriptors are defined once at build time (see [`data`]) and never
//! mutated. The manifest layers installed-state on top of this registry;
//! the catalog itself knows nothing about what is installed.

pub mod data;

use serde::{Deserialize, Serialize};

/// Reserved storage key for the manifest. Module ids must never equal this;
/// [`Catalog::get`] refuses it so callers cannot read the manifest as if it
/// were a payload.
pub const MANIFEST_KEY: &str = "__manifest__";

/// What kind of content a module carries. Drives the structural validity
/// check and UI grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    /// A translation of the primary text (book → chapter → verse).
    PrimaryText,
    /// A lexicon or dictionary (term → definition).
    Dictionary,
    /// A commentary keyed by passage.
    Commentary,
    /// Cross-reference sets.
    CrossReference,
    /// Topical indexes.
    Topical,
}

/// Where a module's content comes from. Closed enum so every adapter
/// dispatch is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceDescriptor {
    /// One remote file per top-level unit (e.g. one JSON file per book).
    RemoteFilePerUnit { base_url: String },
    /// A REST endpoint serving one unit per request; content is fetched
    /// lazily, never downloaded wholesale.
    RestEndpoint { base_url: String },
    /// Shipped with the application; no network access.
    BundledStatic,
}

/// Capabilities a module advertises to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    HasAnnotations,
    HasMorphology,
    HasInterlinear,
    Searchable,
}

/// Licensing terms for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Human-readable license text or name.
    pub text: String,
    /// Whether the content is public domain (no attribution UI needed).
    pub public_domain: bool,
}

/// Immutable catalog entry describing one installable module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Unique id, also the storage key for the module's payload.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Content kind.
    pub content_type: ContentType,
    /// Acquisition source.
    pub source: SourceDescriptor,
    /// Identifies the parser the rendering layer needs.
    pub format_tag: String,
    /// Advertised capabilities.
    pub features: Vec<Feature>,
    /// Licensing terms.
    pub license: License,
    /// Installed automatically on first run.
    pub default_install: bool,
}

impl ModuleDescriptor {
    /// Whether this module's content is served lazily (slice-by-slice) from
    /// a REST endpoint rather than cached wholesale.
    pub fn is_lazy(&self) -> bool {
        matches!(self.source, SourceDescriptor::RestEndpoint { .. })
    }
}

/// The static registry of known modules.
pub struct Catalog {
    descriptors: Vec<ModuleDescriptor>,
}

impl Catalog {
    /// Catalog with the built-in module table.
    pub fn builtin() -> Self {
        Self {
            descriptors: data::builtin_modules(),
        }
    }

    /// Catalog over an explicit descriptor list (tests).
    pub fn from_descriptors(descriptors: Vec<ModuleDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Every known descriptor.
    pub fn list(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }

    /// Descriptor for an id, or `None` for unknown ids and the reserved
    /// manifest key.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        if id == MANIFEST_KEY {
            return None;
        }
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Ids flagged for automatic install on first run.
    pub fn default_install_ids(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| d.default_install)
            .map(|d| d.id.clone())
            .collect()
    }
}
