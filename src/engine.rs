// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Acquisition orchestrator — the engine behind install, read, and cancel.
//!
//! Coordinates single-flight download tracking per module id, cancellation
//! tokens, progress reporting, write-through to the persistent chain, and
//! the read-path fallthrough across tiers with corruption detection and
//! self-healing eviction.
//!
//! Read path: memory → persistent chain → bundled static assets → error.
//! A structurally invalid entry at any tier is evicted so it cannot poison
//! later reads, and the next tier is consulted. Bundled assets also serve
//! as an opportunistic fast path during install, preempting network
//! downloads for every source kind.

use crate::catalog::{Catalog, ModuleDescriptor};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::manifest::{Manifest, ManifestStore};
use crate::payload::ModulePayload;
use crate::progress::{DownloadProgress, ProgressReceiver, ProgressReporter, ProgressSender};
use crate::sources::{HttpClient, Sources};
use crate::storage::{HybridStorage, MemoryCache};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A descriptor plus its installed state, the shape UI pickers consume.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    #[serde(flatten)]
    pub descriptor: ModuleDescriptor,
    pub installed: bool,
}

/// How one install ended. Cloneable so every joiner of a shared in-flight
/// install observes the same outcome.
#[derive(Debug, Clone)]
enum TerminalOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

impl TerminalOutcome {
    fn into_result(self, id: &str) -> Result<()> {
        match self {
            TerminalOutcome::Completed => Ok(()),
            TerminalOutcome::Cancelled => Err(EngineError::Cancelled(id.to_string())),
            TerminalOutcome::Failed(reason) => Err(EngineError::InstallFailed {
                module: id.to_string(),
                reason,
            }),
        }
    }
}

/// Per-id in-flight tracking entry. Its presence in the map is the
/// single-flight guard.
struct InFlight {
    reporter: ProgressReporter,
    cancel: CancellationToken,
    done: watch::Receiver<Option<TerminalOutcome>>,
}

/// The module acquisition and caching engine.
///
/// Explicitly constructed and passed to consumers; holds no process-wide
/// state. The rendering layer calls [`ModuleEngine::read`]; first-run
/// initialization calls [`ModuleEngine::ensure_defaults`].
pub struct ModuleEngine {
    catalog: Catalog,
    memory: MemoryCache,
    storage: Arc<HybridStorage>,
    manifest: ManifestStore,
    sources: Sources,
    inflight: DashMap<String, InFlight>,
    /// Terminal records retained for UI polling after the in-flight entry
    /// is gone.
    recent: DashMap<String, DownloadProgress>,
    progress_tx: ProgressSender,
}

impl ModuleEngine {
    /// Engine over the built-in catalog.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_catalog(config, Catalog::builtin())
    }

    /// Engine over an explicit catalog (tests).
    pub fn with_catalog(config: EngineConfig, catalog: Catalog) -> Self {
        let storage = Arc::new(HybridStorage::open(&config));
        let http = HttpClient::new(config.http_timeout_ms);
        let sources = Sources::new(http, &config.assets_dir);
        let (progress_tx, _) = crate::progress::channel();
        Self {
            catalog,
            memory: MemoryCache::new(),
            manifest: ManifestStore::new(storage.clone()),
            storage,
            sources,
            inflight: DashMap::new(),
            recent: DashMap::new(),
            progress_tx,
        }
    }

    // ── Catalog & manifest surface ────────────────────

    /// Every catalog descriptor with its installed flag.
    pub async fn list_available(&self) -> Result<Vec<ModuleInfo>> {
        let installed = self.manifest.list_installed(&self.catalog).await?;
        Ok(self
            .catalog
            .list()
            .iter()
            .map(|d| ModuleInfo {
                descriptor: d.clone(),
                installed: installed.contains(&d.id),
            })
            .collect())
    }

    /// Installed module ids.
    pub async fn list_installed(&self) -> Result<Vec<String>> {
        self.manifest.list_installed(&self.catalog).await
    }

    /// The current manifest.
    pub async fn manifest(&self) -> Result<Manifest> {
        self.manifest.manifest(&self.catalog).await
    }

    /// Replace the manifest wholesale (sync/restore flows).
    pub async fn put_manifest(&self, manifest: Manifest) -> Result<()> {
        self.manifest.put_manifest(manifest).await
    }

    /// Descriptor lookup; unknown ids and the reserved manifest key error.
    pub fn descriptor(&self, id: &str) -> Result<&ModuleDescriptor> {
        self.catalog
            .get(id)
            .ok_or_else(|| EngineError::UnknownModule(id.to_string()))
    }

    /// Whether the native filesystem tier backs persistence on this host.
    pub fn is_filesystem_available(&self) -> bool {
        self.storage.is_filesystem_available()
    }

    /// Whether any persistent tier is available.
    pub fn is_persistence_available(&self) -> bool {
        self.storage.is_available()
    }

    // ── Progress surface ────────────────────

    /// Subscribe to progress updates for all modules.
    pub fn subscribe_progress(&self) -> ProgressReceiver {
        self.progress_tx.subscribe()
    }

    /// Latest progress record for a module: the live in-flight record if
    /// one exists, else the retained terminal record.
    pub fn progress(&self, id: &str) -> Option<DownloadProgress> {
        if let Some(entry) = self.inflight.get(id) {
            return Some(entry.reporter.snapshot());
        }
        self.recent.get(id).map(|r| r.value().clone())
    }

    // ── Install / cancel / uninstall ────────────────────

    /// Acquire a module and record it as installed.
    ///
    /// Single-flight: if an install for this id is already in flight, no
    /// second acquisition starts; this call awaits the in-flight outcome.
    pub async fn install(&self, id: &str) -> Result<()> {
        let descriptor = self.descriptor(id)?.clone();

        let (reporter, cancel, done_tx, done_rx) = {
            match self.inflight.entry(id.to_string()) {
                dashmap::mapref::entry::Entry::Occupied(entry) => {
                    let done = entry.get().done.clone();
                    drop(entry);
                    info!("{id}: install already in flight, awaiting its outcome");
                    return Self::await_outcome(id, done).await;
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    let reporter = ProgressReporter::new(id, Some(self.progress_tx.clone()));
                    let cancel = CancellationToken::new();
                    let (done_tx, done_rx) = watch::channel(None);
                    slot.insert(InFlight {
                        reporter: reporter.clone(),
                        cancel: cancel.clone(),
                        done: done_rx.clone(),
                    });
                    (reporter, cancel, done_tx, done_rx)
                }
            }
        };

        let result = self.run_install(&descriptor, &reporter, &cancel).await;

        match &result {
            Ok(()) => reporter.completed(),
            Err(e) => reporter.failed(e),
        }
        let outcome = match &result {
            Ok(()) => TerminalOutcome::Completed,
            Err(e) if e.is_cancelled() => TerminalOutcome::Cancelled,
            Err(e) => TerminalOutcome::Failed(e.to_string()),
        };
        let _ = done_tx.send(Some(outcome));

        self.recent.insert(id.to_string(), reporter.snapshot());
        // `cancel` may already have removed this entry and a new install may
        // have claimed the id since; only remove our own entry.
        self.inflight
            .remove_if(id, |_, entry| entry.done.same_channel(&done_rx));
        result
    }

    /// Install every module flagged for default install. First-run setup.
    pub async fn ensure_defaults(&self) -> Result<()> {
        for id in self.catalog.default_install_ids() {
            if let Err(e) = self.install(&id).await {
                warn!("default install of {id} failed: {e}");
            }
        }
        Ok(())
    }

    /// Signal cancellation for an in-flight install. The adapter observes
    /// the token between work units; the install terminates Failed with a
    /// distinguished cancelled error. The tracking entry is removed
    /// immediately; there is no retry scheduling.
    pub fn cancel(&self, id: &str) -> bool {
        match self.inflight.remove(id) {
            Some((_, entry)) => {
                info!("{id}: cancelling in-flight install");
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove a module from every tier and the manifest.
    pub async fn uninstall(&self, id: &str) -> Result<()> {
        self.descriptor(id)?;
        self.memory.remove(id);
        if let Err(e) = self.storage.delete(id).await {
            warn!("{id}: persistent delete failed: {e}");
        }
        self.manifest.mark_uninstalled(&self.catalog, id).await?;
        info!("{id}: uninstalled");
        Ok(())
    }

    // ── Read path ────────────────────

    /// Serve a module payload, optionally sliced to a unit path.
    ///
    /// Falls through memory → persistent → bundled, self-healing corrupt
    /// entries along the way. Works for never-installed modules when a
    /// bundled asset exists (zero-network default content). Lazily-sourced
    /// modules route slice misses through their adapter.
    pub async fn read(&self, id: &str, unit_path: &[String]) -> Result<Value> {
        let descriptor = self.descriptor(id)?.clone();

        if let Some(payload) = self.cached_payload(&descriptor).await {
            match payload.slice(unit_path) {
                Some(value) => return Ok(value),
                None if descriptor.is_lazy() => {
                    // Slice not cached yet; fetch it below.
                }
                None => {
                    return Err(EngineError::UnitNotFound {
                        module: id.to_string(),
                        path: unit_path.join("/"),
                    })
                }
            }
        } else if !descriptor.is_lazy() || unit_path.is_empty() {
            return Err(EngineError::ModuleUnavailable(id.to_string()));
        }

        // Lazy path: one network call for the requested unit, merged into
        // the cached tree so the next read is local.
        let slice = self
            .sources
            .for_descriptor(&descriptor)
            .fetch_slice(&descriptor, unit_path)
            .await?;
        self.merge_lazy_slice(&descriptor, unit_path, &slice).await;
        Ok(slice)
    }

    // ── Internals ────────────────────

    async fn run_install(
        &self,
        descriptor: &ModuleDescriptor,
        reporter: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let id = &descriptor.id;

        // Opportunistic static fast path, whatever the source kind:
        // co-located assets beat a network download.
        let fast_path = match self.sources.bundled().load(id) {
            Ok(found) => found.filter(|p| p.is_structurally_valid(descriptor.content_type)),
            Err(e) => {
                warn!("{id}: bundled fast path unreadable: {e}");
                None
            }
        };

        let payload = match fast_path {
            Some(payload) => {
                info!("{id}: satisfied install from bundled asset");
                payload
            }
            None => {
                let payload = self
                    .sources
                    .for_descriptor(descriptor)
                    .acquire(descriptor, reporter, cancel)
                    .await?;
                // A best-effort acquisition can come back hollow (every unit
                // skipped). Caching it would leave the module marked
                // installed while the read path evicts it on sight.
                if !payload.is_structurally_valid(descriptor.content_type) {
                    return Err(EngineError::SourceUnavailable {
                        module: id.clone(),
                        reason: "acquired payload is structurally invalid".into(),
                    });
                }
                payload
            }
        };

        self.memory.put(id, payload.clone());
        // Persistence failure degrades to memory-only, it does not fail
        // the install.
        if let Err(e) = self.storage.save(id, &payload.to_value()).await {
            warn!("{id}: persist failed, continuing memory-only: {e}");
        }

        self.manifest.mark_installed(&self.catalog, id).await?;
        info!("{id}: installed ({} units)", payload.unit_count());
        Ok(())
    }

    async fn await_outcome(
        id: &str,
        mut done: watch::Receiver<Option<TerminalOutcome>>,
    ) -> Result<()> {
        loop {
            if let Some(outcome) = done.borrow().clone() {
                return outcome.into_result(id);
            }
            if done.changed().await.is_err() {
                return Err(EngineError::InstallFailed {
                    module: id.to_string(),
                    reason: "install task dropped before completing".into(),
                });
            }
        }
    }

    /// Tier fallthrough with validation, eviction, and promotion.
    async fn cached_payload(&self, descriptor: &ModuleDescriptor) -> Option<ModulePayload> {
        let id = &descriptor.id;

        if let Some(payload) = self.memory.get(id) {
            if payload.is_structurally_valid(descriptor.content_type) {
                return Some(payload);
            }
            warn!("{id}: corrupt memory entry, evicting");
            self.memory.remove(id);
        }

        match self.storage.load(id).await {
            Ok(Some(value)) => {
                let payload = ModulePayload::from_value(value);
                if payload.is_structurally_valid(descriptor.content_type) {
                    self.memory.put(id, payload.clone());
                    return Some(payload);
                }
                // Delete so the corrupt entry cannot poison future reads.
                warn!("{id}: corrupt persisted entry, deleting");
                if let Err(e) = self.storage.delete(id).await {
                    warn!("{id}: could not delete corrupt entry: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{id}: persistent load failed: {e}"),
        }

        // Last resort: bundled asset. On success it becomes the new cache
        // content in both faster tiers.
        match self.sources.bundled().load(id) {
            Ok(Some(payload)) if payload.is_structurally_valid(descriptor.content_type) => {
                self.memory.put(id, payload.clone());
                if let Err(e) = self.storage.save(id, &payload.to_value()).await {
                    warn!("{id}: could not promote bundled asset: {e}");
                }
                Some(payload)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("{id}: bundled fallback unreadable: {e}");
                None
            }
        }
    }

    /// Merge a lazily fetched chapter into the cached tree. Only
    /// chapter-granularity slices are merged; deeper slices are served
    /// without caching.
    async fn merge_lazy_slice(
        &self,
        descriptor: &ModuleDescriptor,
        unit_path: &[String],
        slice: &Value,
    ) {
        if unit_path.len() != 2 {
            return;
        }
        let id = &descriptor.id;
        let mut payload = self.memory.get(id).unwrap_or_else(ModulePayload::empty);
        payload.insert_subunit(&unit_path[0], &unit_path[1], slice.clone());
        self.memory.put(id, payload.clone());
        if let Err(e) = self.storage.save(id, &payload.to_value()).await {
            warn!("{id}: could not persist lazy slice: {e}");
        }
    }
}
