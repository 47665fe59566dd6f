//! Bundled static asset adapter — no network access.
//!
//! Assets ship with the application under a fixed naming convention,
//! `<assets_dir>/<module_id>.json`. Besides serving bundled-source modules,
//! these assets act as an opportunistic fast path for every module: the
//! engine checks here before reaching for the network.

use crate::catalog::ModuleDescriptor;
use crate::error::{EngineError, Result};
use crate::payload::ModulePayload;
use crate::progress::ProgressReporter;
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct BundledAdapter {
    assets_dir: PathBuf,
}

impl BundledAdapter {
    pub fn new(assets_dir: &Path) -> Self {
        Self {
            assets_dir: assets_dir.to_path_buf(),
        }
    }

    fn asset_path(&self, id: &str) -> PathBuf {
        self.assets_dir.join(format!("{id}.json"))
    }

    /// Load the asset for a module id, `None` when no asset exists. Used
    /// both by `acquire` and by the engine's static fast path.
    pub fn load(&self, id: &str) -> Result<Option<ModulePayload>> {
        let path = self.asset_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&path)?;
        let value: Value = serde_json::from_slice(&data)?;
        debug!("loaded bundled asset for {id} ({} bytes)", data.len());
        Ok(Some(ModulePayload::from_value(value)))
    }
}

#[async_trait]
impl SourceAdapter for BundledAdapter {
    /// No download happens; completion just means the asset is present.
    async fn acquire(
        &self,
        descriptor: &ModuleDescriptor,
        progress: &ProgressReporter,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<ModulePayload> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled(descriptor.id.clone()));
        }
        progress.downloading();
        self.load(&descriptor.id)?
            .ok_or_else(|| EngineError::ModuleUnavailable(descriptor.id.clone()))
    }

    async fn fetch_slice(
        &self,
        descriptor: &ModuleDescriptor,
        unit_path: &[String],
    ) -> Result<Value> {
        let payload = self
            .load(&descriptor.id)?
            .ok_or_else(|| EngineError::ModuleUnavailable(descriptor.id.clone()))?;
        payload
            .slice(unit_path)
            .ok_or_else(|| EngineError::UnitNotFound {
                module: descriptor.id.clone(),
                path: unit_path.join("/"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, SourceDescriptor};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn kjv_descriptor() -> ModuleDescriptor {
        let catalog = Catalog::builtin();
        let d = catalog.get("kjv").unwrap().clone();
        assert_eq!(d.source, SourceDescriptor::BundledStatic);
        d
    }

    fn write_asset(dir: &Path, id: &str, value: &Value) {
        std::fs::write(
            dir.join(format!("{id}.json")),
            serde_json::to_vec(value).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn acquire_loads_asset() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(
            dir.path(),
            "kjv",
            &json!({ "Genesis": { "1": { "1": "In the beginning" } } }),
        );

        let adapter = BundledAdapter::new(dir.path());
        let progress = ProgressReporter::new("kjv", None);
        let payload = adapter
            .acquire(&kjv_descriptor(), &progress, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(payload.unit_count(), 1);
    }

    #[tokio::test]
    async fn missing_asset_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = BundledAdapter::new(dir.path());
        let progress = ProgressReporter::new("kjv", None);
        let err = adapter
            .acquire(&kjv_descriptor(), &progress, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ModuleUnavailable(_)));
    }

    #[tokio::test]
    async fn fetch_slice_resolves_path() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(
            dir.path(),
            "kjv",
            &json!({ "Genesis": { "1": { "1": "In the beginning" } } }),
        );

        let adapter = BundledAdapter::new(dir.path());
        let slice = adapter
            .fetch_slice(&kjv_descriptor(), &["Genesis".into(), "1".into()])
            .await
            .unwrap();
        assert_eq!(slice["1"], "In the beginning");

        let err = adapter
            .fetch_slice(&kjv_descriptor(), &["Malachi".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnitNotFound { .. }));
    }
}
