//! Manifest — the persisted record of installed modules.
//!
//! Layered on the storage chain under the reserved key
//! [`crate::catalog::MANIFEST_KEY`]. All mutations run a read-modify-write
//! under one async mutex so concurrent installs of different modules cannot
//! lose each other's updates. The latest manifest is also cached in memory,
//! so when no persistent tier is available the engine keeps working
//! (memory-only) instead of failing.

use crate::catalog::{Catalog, ModuleDescriptor, MANIFEST_KEY};
use crate::error::Result;
use crate::storage::HybridStorage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Manifest schema version.
const MANIFEST_VERSION: &str = "1";

/// On-disk manifest shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Ids of installed modules.
    pub installed: BTreeSet<String>,
    /// Catalog snapshot, kept for offline reference.
    pub available: BTreeMap<String, ModuleDescriptor>,
    pub version: String,
    pub last_updated: DateTime<Utc>,
}

impl Manifest {
    /// Synthesize the first-run manifest: full catalog snapshot, with
    /// every `default_install` descriptor pre-marked installed.
    pub fn default_for(catalog: &Catalog) -> Self {
        let available = catalog
            .list()
            .iter()
            .map(|d| (d.id.clone(), d.clone()))
            .collect();
        let installed = catalog.default_install_ids().into_iter().collect();
        Self {
            installed,
            available,
            version: MANIFEST_VERSION.to_string(),
            last_updated: Utc::now(),
        }
    }
}

/// Persisted manifest access, serialized through one lock.
pub struct ManifestStore {
    storage: Arc<HybridStorage>,
    /// Guards read-modify-write cycles and caches the latest manifest so
    /// the engine survives persistence loss.
    state: Mutex<Option<Manifest>>,
}

impl ManifestStore {
    pub fn new(storage: Arc<HybridStorage>) -> Self {
        Self {
            storage,
            state: Mutex::new(None),
        }
    }

    /// Load the manifest, synthesizing and persisting the default on first
    /// access.
    pub async fn manifest(&self, catalog: &Catalog) -> Result<Manifest> {
        let mut state = self.state.lock().await;
        self.load_locked(&mut state, catalog).await
    }

    /// Replace the manifest wholesale.
    pub async fn put_manifest(&self, manifest: Manifest) -> Result<()> {
        let mut state = self.state.lock().await;
        self.persist_locked(&mut state, manifest).await
    }

    /// Installed module ids.
    pub async fn list_installed(&self, catalog: &Catalog) -> Result<Vec<String>> {
        Ok(self
            .manifest(catalog)
            .await?
            .installed
            .into_iter()
            .collect())
    }

    /// Mark a module installed. Idempotent; bumps the timestamp.
    pub async fn mark_installed(&self, catalog: &Catalog, id: &str) -> Result<()> {
        self.mutate(catalog, |m| {
            m.installed.insert(id.to_string());
        })
        .await
    }

    /// Mark a module uninstalled. Idempotent; bumps the timestamp.
    pub async fn mark_uninstalled(&self, catalog: &Catalog, id: &str) -> Result<()> {
        self.mutate(catalog, |m| {
            m.installed.remove(id);
        })
        .await
    }

    async fn mutate(&self, catalog: &Catalog, apply: impl FnOnce(&mut Manifest)) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut manifest = self.load_locked(&mut state, catalog).await?;
        apply(&mut manifest);
        manifest.last_updated = Utc::now();
        self.persist_locked(&mut state, manifest).await
    }

    async fn load_locked(
        &self,
        state: &mut Option<Manifest>,
        catalog: &Catalog,
    ) -> Result<Manifest> {
        if let Some(manifest) = state.as_ref() {
            return Ok(manifest.clone());
        }
        let manifest = match self.storage.load(MANIFEST_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value)?,
            Ok(None) => {
                debug!("no persisted manifest, synthesizing default");
                let manifest = Manifest::default_for(catalog);
                // First-run persist; a failure degrades to memory-only.
                if let Err(e) = self
                    .storage
                    .save(MANIFEST_KEY, &serde_json::to_value(&manifest)?)
                    .await
                {
                    warn!("could not persist default manifest: {e}");
                }
                manifest
            }
            Err(e) => {
                warn!("manifest load failed, operating memory-only: {e}");
                Manifest::default_for(catalog)
            }
        };
        *state = Some(manifest.clone());
        Ok(manifest)
    }

    async fn persist_locked(
        &self,
        state: &mut Option<Manifest>,
        manifest: Manifest,
    ) -> Result<()> {
        if let Err(e) = self
            .storage
            .save(MANIFEST_KEY, &serde_json::to_value(&manifest)?)
            .await
        {
            warn!("manifest persist failed, keeping in-memory copy: {e}");
        }
        *state = Some(manifest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EmbeddedTier, FsTier};

    fn store_with_fs(dir: &std::path::Path) -> ManifestStore {
        let storage = Arc::new(HybridStorage::with_tiers(
            FsTier::open(dir),
            Some(EmbeddedTier::open_in_memory().unwrap()),
        ));
        ManifestStore::new(storage)
    }

    #[tokio::test]
    async fn first_access_synthesizes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_fs(dir.path());
        let catalog = Catalog::builtin();

        let manifest = store.manifest(&catalog).await.unwrap();
        assert!(manifest.installed.contains("kjv"));
        assert_eq!(manifest.available.len(), catalog.list().len());
        // Persisted under the reserved key.
        assert!(dir.path().join(format!("{MANIFEST_KEY}.json")).exists());
    }

    #[tokio::test]
    async fn install_and_uninstall_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_fs(dir.path());
        let catalog = Catalog::builtin();

        store.mark_installed(&catalog, "web").await.unwrap();
        store.mark_installed(&catalog, "web").await.unwrap();
        assert!(store
            .list_installed(&catalog)
            .await
            .unwrap()
            .contains(&"web".to_string()));

        store.mark_uninstalled(&catalog, "web").await.unwrap();
        store.mark_uninstalled(&catalog, "web").await.unwrap();
        assert!(!store
            .list_installed(&catalog)
            .await
            .unwrap()
            .contains(&"web".to_string()));
    }

    #[tokio::test]
    async fn mutations_bump_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_fs(dir.path());
        let catalog = Catalog::builtin();

        let before = store.manifest(&catalog).await.unwrap().last_updated;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.mark_installed(&catalog, "web").await.unwrap();
        let after = store.manifest(&catalog).await.unwrap().last_updated;
        assert!(after > before);
    }

    #[tokio::test]
    async fn survives_reload_from_storage() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::builtin();
        {
            let store = store_with_fs(dir.path());
            store.mark_installed(&catalog, "asv").await.unwrap();
        }
        // Fresh store over the same directory sees the persisted state.
        let store = store_with_fs(dir.path());
        assert!(store
            .list_installed(&catalog)
            .await
            .unwrap()
            .contains(&"asv".to_string()));
    }

    #[tokio::test]
    async fn memory_only_when_no_tiers() {
        let storage = Arc::new(HybridStorage::with_tiers(FsTier::unavailable(), None));
        let store = ManifestStore::new(storage);
        let catalog = Catalog::builtin();

        // Operations keep working against the in-memory copy.
        store.mark_installed(&catalog, "web").await.unwrap();
        assert!(store
            .list_installed(&catalog)
            .await
            .unwrap()
            .contains(&"web".to_string()));
    }
}
