//! `lectern setup` — first-run installation of the default content set.

use anyhow::Result;
use crate::ModuleEngine;

pub async fn run(engine: &ModuleEngine) -> Result<()> {
    engine.ensure_defaults().await?;
    let installed = engine.list_installed().await?;
    println!("default modules ready: {}", installed.join(", "));
    Ok(())
}
