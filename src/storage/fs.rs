//! Filesystem storage tier — one JSON file per key.
//!
//! Available only on hosts that expose a writable data directory. When the
//! directory cannot be created the tier reports unavailable and the hybrid
//! chain falls back to the embedded store.

use crate::error::Result;
use crate::storage::StorageTier;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FsTier {
    dir: PathBuf,
    available: bool,
}

impl FsTier {
    /// Open the tier at `dir`, creating it if needed. Creation failure makes
    /// the tier unavailable rather than an error; availability is the hybrid
    /// chain's fallback signal.
    pub fn open(dir: &Path) -> Self {
        let available = match std::fs::create_dir_all(dir) {
            Ok(()) => true,
            Err(e) => {
                debug!("filesystem tier unavailable at {}: {e}", dir.display());
                false
            }
        };
        Self {
            dir: dir.to_path_buf(),
            available,
        }
    }

    /// A tier that reports unavailable (browser-like hosts).
    pub fn unavailable() -> Self {
        Self {
            dir: PathBuf::new(),
            available: false,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are catalog ids plus the reserved manifest key; keep the
        // mapping reversible and shell-safe.
        self.dir.join(format!("{}.json", key.replace('/', "_")))
    }
}

#[async_trait]
impl StorageTier for FsTier {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        let data = serde_json::to_vec(value)?;
        // Write via a temp file so a crash mid-write cannot leave a
        // truncated entry under the real key.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &data)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
