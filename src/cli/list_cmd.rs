//! `lectern list` — every known module with its installed state.

use anyhow::Result;
use crate::ModuleEngine;

pub async fn run(engine: &ModuleEngine, json: bool) -> Result<()> {
    let modules = engine.list_available().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    println!("{:<10} {:<38} {:<16} installed", "id", "name", "type");
    for info in modules {
        println!(
            "{:<10} {:<38} {:<16} {}",
            info.descriptor.id,
            info.descriptor.name,
            format!("{:?}", info.descriptor.content_type),
            if info.installed { "yes" } else { "" }
        );
    }
    Ok(())
}
