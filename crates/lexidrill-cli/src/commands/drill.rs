//! Flashcard drill: `draw` and `check`.

use std::path::PathBuf;

use anyhow::Result;

use lexidrill_core::model::EntryId;

use crate::session::{Mode, Session};

pub async fn draw(config: Option<PathBuf>, language: Option<String>) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let entry = session.drill.draw_entry(language.as_deref()).await?;
    println!(
        "#{} {} ({}, level {})",
        entry.id.unwrap_or_default(),
        entry.original_word,
        entry.language,
        entry.proficiency_level
    );
    println!(
        "Answer with: lexidrill check {} <translation>",
        entry.id.unwrap_or_default()
    );
    Ok(())
}

pub async fn check(config: Option<PathBuf>, id: EntryId, answer: String) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let check = session.drill.check_translation(id, &answer).await?;
    session.save()?;

    println!("{}", check.message);
    if !check.example_usage.is_empty() {
        println!("Example: {}", check.example_usage);
    }
    if !check.explanation.is_empty() {
        println!("Note: {}", check.explanation);
    }
    println!("Proficiency level: {}", check.proficiency_level);
    Ok(())
}
