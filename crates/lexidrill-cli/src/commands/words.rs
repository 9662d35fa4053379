//! Library editing: `add`, `edit`, `list` and `delete`.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use lexidrill_core::model::{EntryId, NewEntry};

use crate::session::{Mode, Session};

pub fn draft(
    word: String,
    translation: String,
    language: String,
    example: String,
    explanation: String,
) -> NewEntry {
    NewEntry {
        original_word: word,
        translation,
        language,
        example_usage: example,
        explanation,
    }
}

pub async fn add(config: Option<PathBuf>, draft: NewEntry) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let entry = session.drill.create_entry(draft).await?;
    session.save()?;
    println!(
        "Added #{}: {} -> {} ({})",
        entry.id.unwrap_or_default(),
        entry.original_word,
        entry.translation,
        entry.language
    );
    Ok(())
}

pub async fn edit(config: Option<PathBuf>, id: EntryId, draft: NewEntry) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let entry = session.drill.update_entry(id, draft).await?;
    session.save()?;
    println!(
        "Updated #{id}: {} -> {} ({})",
        entry.original_word, entry.translation, entry.language
    );
    Ok(())
}

pub async fn list(config: Option<PathBuf>, language: Option<String>) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let entries = session.drill.list_entries(language.as_deref()).await?;

    if entries.is_empty() {
        println!("No words yet. Add one with `lexidrill add`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Word", "Translation", "Language", "Level", "Example"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.id.unwrap_or_default()),
            Cell::new(&entry.original_word),
            Cell::new(&entry.translation),
            Cell::new(&entry.language),
            Cell::new(entry.proficiency_level),
            Cell::new(&entry.example_usage),
        ]);
    }
    println!("{table}");
    println!("{} word(s)", entries.len());
    Ok(())
}

pub async fn delete(config: Option<PathBuf>, ids: Vec<EntryId>) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let deleted = session.drill.delete_entries(&ids).await?;
    session.save()?;
    println!("Deleted {deleted} of {} word(s)", ids.len());
    Ok(())
}
