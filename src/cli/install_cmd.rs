//! `lectern install` — download a module with a progress bar.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use crate::progress::DownloadStatus;
use crate::ModuleEngine;

pub async fn run(engine: &ModuleEngine, id: &str, quiet: bool) -> Result<()> {
    let mut updates = engine.subscribe_progress();

    let bar = if quiet {
        None
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{msg:24} [{bar:40}] {pos:>3}%")
                .expect("valid progress template")
                .progress_chars("=> "),
        );
        bar.set_message(id.to_string());
        Some(bar)
    };

    // Render progress updates while the install runs.
    let install = engine.install(id);
    tokio::pin!(install);
    let result = loop {
        tokio::select! {
            result = &mut install => break result,
            update = updates.recv() => {
                if let (Some(bar), Ok(update)) = (bar.as_ref(), update) {
                    if update.module_id == id && update.status == DownloadStatus::Downloading {
                        bar.set_position(update.progress_percent as u64);
                        if let Some(unit) = update.current_unit {
                            bar.set_message(format!("{id}: {unit}"));
                        }
                    }
                }
            }
        }
    };

    match result {
        Ok(()) => {
            if let Some(bar) = bar {
                bar.finish_with_message(format!("{id}: installed"));
            }
            if let Some(record) = engine.progress(id) {
                if !record.failed_units.is_empty() && !quiet {
                    eprintln!(
                        "warning: {} unit(s) could not be fetched: {}",
                        record.failed_units.len(),
                        record.failed_units.join(", ")
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            if let Some(bar) = bar {
                bar.abandon_with_message(format!("{id}: failed"));
            }
            Err(e).with_context(|| format!("installing {id}"))
        }
    }
}
