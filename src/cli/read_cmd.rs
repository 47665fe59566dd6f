//! `lectern read` — print a module payload or a slice of it.

use anyhow::{Context, Result};
use crate::ModuleEngine;

pub async fn run(engine: &ModuleEngine, id: &str, path: &[String], json: bool) -> Result<()> {
    let slice = engine
        .read(id, path)
        .await
        .with_context(|| format!("reading {id} {}", path.join("/")))?;

    if json {
        println!("{}", serde_json::to_string(&slice)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&slice)?);
    }
    Ok(())
}
