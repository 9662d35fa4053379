//! CSV `export` and `import`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::session::{Mode, Session};

pub async fn export(config: Option<PathBuf>, output: PathBuf) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let bytes = session.drill.export_csv().await?;
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Exported to {}", output.display());
    Ok(())
}

pub async fn import(config: Option<PathBuf>, input: PathBuf) -> Result<()> {
    let bytes =
        std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let session = Session::open(config, Mode::Offline)?;
    let summary = session
        .drill
        .import_csv(&bytes)
        .await
        .with_context(|| format!("failed to import {}", input.display()))?;
    session.save()?;

    println!("Imported {} word(s)", summary.imported);
    if !summary.skipped_lines.is_empty() {
        let lines: Vec<String> = summary.skipped_lines.iter().map(|l| l.to_string()).collect();
        println!("Skipped short line(s): {}", lines.join(", "));
    }
    Ok(())
}
