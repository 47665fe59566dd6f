//! `lectern uninstall` — remove a module from every tier.

use anyhow::{Context, Result};
use crate::ModuleEngine;

pub async fn run(engine: &ModuleEngine, id: &str) -> Result<()> {
    engine
        .uninstall(id)
        .await
        .with_context(|| format!("uninstalling {id}"))?;
    println!("{id}: removed");
    Ok(())
}
