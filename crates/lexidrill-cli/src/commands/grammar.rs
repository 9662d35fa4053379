//! Grammar drill: `grammar` and `validate`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use lexidrill_core::model::EntryId;
use lexidrill_core::practice::ValidationRequest;

use crate::session::{Mode, Session};

pub async fn draw(config: Option<PathBuf>) -> Result<()> {
    let session = Session::open(config, Mode::Offline)?;
    let drill = session.drill.draw_grammar_drill().await?;
    println!(
        "#{} {} -> {} ({})",
        drill.entry.id.unwrap_or_default(),
        drill.entry.original_word,
        drill.entry.translation,
        drill.entry.language
    );
    println!("Grammar topic: {}", drill.grammar_topic);
    println!("Write a sentence using the word, then run: lexidrill validate <id> --sentence ... --topic ...");
    Ok(())
}

pub async fn validate(
    config: Option<PathBuf>,
    id: EntryId,
    sentence: String,
    topic: String,
    audio: Option<PathBuf>,
) -> Result<()> {
    let session = Session::open(config, Mode::Online)?;
    let request = ValidationRequest {
        entry_id: id,
        sentence,
        grammar_topic: topic,
        timeout: session.config.generator_timeout(),
        with_audio: audio.is_some(),
    };
    let outcome = session.drill.validate_sentence(&request).await?;
    let result = &outcome.result;

    println!("{}", if result.is_correct { "Correct" } else { "Incorrect" });
    println!("Feedback: {}", result.feedback);
    if let Some(correction) = &result.correction {
        println!("Correction: {correction}");
    }
    println!("\n{}", result.explanation);

    if let Some(path) = audio {
        match &outcome.audio {
            Some(bytes) => {
                std::fs::write(&path, bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("\nAudio written to {}", path.display());
            }
            None => println!("\nNo audio available."),
        }
    }
    Ok(())
}
