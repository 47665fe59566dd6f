//! Engine configuration — storage locations and network knobs.

use std::path::PathBuf;

/// Configuration for a [`crate::engine::ModuleEngine`].
///
/// Constructed explicitly and passed in; the engine holds no process-wide
/// state. Tests point `data_dir`/`assets_dir` at temp directories.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root for persistent storage (filesystem tier + embedded store).
    pub data_dir: PathBuf,
    /// Directory of read-only bundled module assets (`<id>.json`).
    pub assets_dir: PathBuf,
    /// Per-request HTTP timeout in milliseconds.
    pub http_timeout_ms: u64,
}

impl EngineConfig {
    /// Default locations under `~/.lectern/`.
    pub fn default_dirs() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        let root = home.join(".lectern");
        Self {
            data_dir: root.join("modules"),
            assets_dir: root.join("assets"),
            http_timeout_ms: 30_000,
        }
    }

    /// Config rooted at an arbitrary directory (used by tests and the CLI
    /// `--data-dir` override).
    pub fn rooted_at(root: PathBuf) -> Self {
        Self {
            data_dir: root.join("modules"),
            assets_dir: root.join("assets"),
            http_timeout_ms: 30_000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_dirs()
    }
}
