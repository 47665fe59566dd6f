// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Source adapters — protocol-specific strategies for acquiring module
//! content from its origin.
//!
//! Three variants behind one contract:
//!
//! - [`per_unit`]: one remote file per top-level unit, fetched sequentially
//!   and merged (best-effort on partial failure)
//! - [`rest`]: a single endpoint serving one slice per request; acquisition
//!   is only a connectivity check, content is always lazy
//! - [`bundled`]: static assets shipped with the application, no network
//!
//! Dispatch is an exhaustive match on [`SourceDescriptor`], so adding a
//! source kind forces every call site to handle it.

pub mod bundled;
pub mod http;
pub mod per_unit;
pub mod rest;

pub use bundled::BundledAdapter;
pub use http::HttpClient;
pub use per_unit::PerUnitAdapter;
pub use rest::RestAdapter;

use crate::catalog::{ModuleDescriptor, SourceDescriptor};
use crate::error::Result;
use crate::payload::ModulePayload;
use crate::progress::ProgressReporter;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Uniform acquisition contract every source variant implements.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch the whole module (or, for lazy sources, verify the source and
    /// return whatever seed content the check produced). The token is
    /// observed between work units; cancellation surfaces as
    /// [`crate::error::EngineError::Cancelled`].
    async fn acquire(
        &self,
        descriptor: &ModuleDescriptor,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ModulePayload>;

    /// Fetch one slice addressed by unit path, transformed into the
    /// internal nested shape.
    async fn fetch_slice(&self, descriptor: &ModuleDescriptor, unit_path: &[String])
        -> Result<Value>;
}

/// The three adapters, constructed once and shared by the engine.
pub struct Sources {
    per_unit: PerUnitAdapter,
    rest: RestAdapter,
    bundled: BundledAdapter,
}

impl Sources {
    pub fn new(http: HttpClient, assets_dir: &Path) -> Self {
        Self {
            per_unit: PerUnitAdapter::new(http.clone()),
            rest: RestAdapter::new(http),
            bundled: BundledAdapter::new(assets_dir),
        }
    }

    /// The adapter configured for a descriptor's source.
    pub fn for_descriptor(&self, descriptor: &ModuleDescriptor) -> &dyn SourceAdapter {
        match descriptor.source {
            SourceDescriptor::RemoteFilePerUnit { .. } => &self.per_unit,
            SourceDescriptor::RestEndpoint { .. } => &self.rest,
            SourceDescriptor::BundledStatic => &self.bundled,
        }
    }

    /// Direct access to the bundled adapter for the opportunistic static
    /// fast path (consulted for every module, whatever its source kind).
    pub fn bundled(&self) -> &BundledAdapter {
        &self.bundled
    }
}
