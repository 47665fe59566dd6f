//! `lectern status` — manifest summary and storage tier availability.

use anyhow::Result;
use crate::ModuleEngine;
use serde_json::json;

pub async fn run(engine: &ModuleEngine, json_out: bool) -> Result<()> {
    let manifest = engine.manifest().await?;
    let installed: Vec<&str> = manifest.installed.iter().map(String::as_str).collect();

    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "installed": installed,
                "knownModules": manifest.available.len(),
                "manifestVersion": manifest.version,
                "lastUpdated": manifest.last_updated,
                "filesystemTier": engine.is_filesystem_available(),
                "persistenceAvailable": engine.is_persistence_available(),
            }))?
        );
        return Ok(());
    }

    println!("manifest version : {}", manifest.version);
    println!("last updated     : {}", manifest.last_updated);
    println!("known modules    : {}", manifest.available.len());
    println!(
        "installed        : {}",
        if installed.is_empty() {
            "(none)".to_string()
        } else {
            installed.join(", ")
        }
    );
    println!(
        "filesystem tier  : {}",
        if engine.is_filesystem_available() {
            "available"
        } else {
            "unavailable (embedded fallback)"
        }
    );
    if !engine.is_persistence_available() {
        println!("warning: no persistent tier; installs will not survive restart");
    }
    Ok(())
}
