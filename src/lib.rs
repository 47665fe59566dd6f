// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lectern module engine — acquisition and caching for swappable content
//! packs (translations, dictionaries, commentaries, cross-references).
//!
//! The engine knows which modules exist ([`catalog`]), fetches them from
//! heterogeneous remote sources ([`sources`]), caches them across storage
//! tiers ([`storage`]), and serves validated slices back to the rest of
//! the application ([`engine`]).

#![allow(clippy::new_without_default)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod payload;
pub mod progress;
pub mod sources;
pub mod storage;

pub use config::EngineConfig;
pub use engine::ModuleEngine;
pub use error::{EngineError, Result};
