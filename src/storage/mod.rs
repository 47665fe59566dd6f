// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Storage tiers and the hybrid persistent chain.
//!
//! Ordering: in-process memory cache (owned by the engine) → persistent
//! chain (filesystem if the host provides one, else the embedded store) →
//! bundled static assets (read-only, handled by the bundled source adapter).
//! This module covers the persistent chain; fallback is decided per call,
//! never stickily.

pub mod embedded;
pub mod fs;
pub mod memory;

pub use embedded::EmbeddedTier;
pub use fs::FsTier;
pub use memory::MemoryCache;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// One persistent storage layer.
#[async_trait]
pub trait StorageTier: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    async fn save(&self, key: &str, value: &Value) -> Result<()>;
    async fn load(&self, key: &str) -> Result<Option<Value>>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// The persistent chain: filesystem first, embedded store as fallback.
///
/// Every operation retries the chain from the top; a failed filesystem
/// write on one call does not demote later calls. If neither tier is
/// available operations fail loudly — callers that need durability check
/// [`HybridStorage::is_available`] up front.
pub struct HybridStorage {
    fs: FsTier,
    embedded: Option<EmbeddedTier>,
}

impl HybridStorage {
    /// Open both tiers under the configured data directory.
    pub fn open(config: &EngineConfig) -> Self {
        let fs = FsTier::open(&config.data_dir.join("files"));
        let embedded = match EmbeddedTier::open(&config.data_dir.join("store.db")) {
            Ok(tier) => Some(tier),
            Err(e) => {
                warn!("embedded store unavailable: {e}");
                None
            }
        };
        Self { fs, embedded }
    }

    /// Explicit tiers (tests exercise specific availability combinations).
    pub fn with_tiers(fs: FsTier, embedded: Option<EmbeddedTier>) -> Self {
        Self { fs, embedded }
    }

    fn tiers(&self) -> Vec<&dyn StorageTier> {
        let mut tiers: Vec<&dyn StorageTier> = vec![&self.fs];
        if let Some(ref embedded) = self.embedded {
            tiers.push(embedded);
        }
        tiers
    }

    /// Whether any persistent tier is available.
    pub fn is_available(&self) -> bool {
        self.tiers().iter().any(|t| t.is_available())
    }

    /// Whether the native filesystem tier specifically is available.
    pub fn is_filesystem_available(&self) -> bool {
        self.fs.is_available()
    }

    /// Write to the first tier that accepts the value.
    pub async fn save(&self, key: &str, value: &Value) -> Result<()> {
        let mut last_err = None;
        for tier in self.tiers() {
            if !tier.is_available() {
                continue;
            }
            match tier.save(key, value).await {
                Ok(()) => {
                    debug!("saved {key} to {} tier", tier.name());
                    return Ok(());
                }
                Err(e) => {
                    warn!("{} tier save failed for {key}: {e}", tier.name());
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(EngineError::StorageUnavailable))
    }

    /// Read from the first tier that has the key.
    pub async fn load(&self, key: &str) -> Result<Option<Value>> {
        let mut any_available = false;
        for tier in self.tiers() {
            if !tier.is_available() {
                continue;
            }
            any_available = true;
            match tier.load(key).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => continue,
                Err(e) => {
                    warn!("{} tier load failed for {key}: {e}", tier.name());
                    continue;
                }
            }
        }
        if any_available {
            Ok(None)
        } else {
            Err(EngineError::StorageUnavailable)
        }
    }

    /// Remove the key from every tier, so a stale copy in a fallback tier
    /// cannot resurface after a miss higher up.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut any_available = false;
        for tier in self.tiers() {
            if !tier.is_available() {
                continue;
            }
            any_available = true;
            if let Err(e) = tier.delete(key).await {
                warn!("{} tier delete failed for {key}: {e}", tier.name());
            }
        }
        if any_available {
            Ok(())
        } else {
            Err(EngineError::StorageUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hybrid_with_fs(dir: &std::path::Path) -> HybridStorage {
        HybridStorage::with_tiers(
            FsTier::open(dir),
            Some(EmbeddedTier::open_in_memory().unwrap()),
        )
    }

    #[tokio::test]
    async fn prefers_filesystem_tier() {
        let dir = tempfile::tempdir().unwrap();
        let storage = hybrid_with_fs(dir.path());

        storage.save("kjv", &json!({ "Genesis": {} })).await.unwrap();
        assert!(dir.path().join("kjv.json").exists());
    }

    #[tokio::test]
    async fn falls_back_to_embedded_when_fs_unavailable() {
        let storage = HybridStorage::with_tiers(
            FsTier::unavailable(),
            Some(EmbeddedTier::open_in_memory().unwrap()),
        );
        assert!(storage.is_available());
        assert!(!storage.is_filesystem_available());

        storage.save("kjv", &json!({ "Genesis": {} })).await.unwrap();
        assert!(storage.load("kjv").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fails_loudly_with_no_tiers() {
        let storage = HybridStorage::with_tiers(FsTier::unavailable(), None);
        assert!(!storage.is_available());

        let err = storage.save("kjv", &json!({})).await.unwrap_err();
        assert!(matches!(err, EngineError::StorageUnavailable));
        let err = storage.load("kjv").await.unwrap_err();
        assert!(matches!(err, EngineError::StorageUnavailable));
    }

    #[tokio::test]
    async fn delete_clears_every_tier() {
        let dir = tempfile::tempdir().unwrap();
        let storage = hybrid_with_fs(dir.path());

        // Seed both tiers: embedded directly, then the chain (which lands
        // on the filesystem).
        storage
            .embedded
            .as_ref()
            .unwrap()
            .save("kjv", &json!({ "stale": true }))
            .await
            .unwrap();
        storage.save("kjv", &json!({ "Genesis": {} })).await.unwrap();

        storage.delete("kjv").await.unwrap();
        assert_eq!(storage.load("kjv").await.unwrap(), None);
    }
}
