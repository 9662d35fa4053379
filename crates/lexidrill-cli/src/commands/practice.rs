//! Free practice: `generate`, `verify` and `speak`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use lexidrill_core::model::{PracticeRequest, TranslationRequest};

use crate::session::{Mode, Session};

pub async fn generate(
    config: Option<PathBuf>,
    source: String,
    target: String,
    level: String,
    sentences: u32,
    topic: Option<String>,
) -> Result<()> {
    let session = Session::open(config, Mode::Online)?;
    let request = PracticeRequest {
        source_language: source,
        target_language: target,
        level,
        sentence_count: sentences,
        topic,
    };
    let text = session
        .drill
        .generate_practice_text(&request, session.config.generator_timeout())
        .await
        .context("text generator is unavailable, try again later")?;
    println!("{text}");
    Ok(())
}

pub async fn verify(
    config: Option<PathBuf>,
    source: String,
    target: String,
    text: String,
    translation: String,
) -> Result<()> {
    let session = Session::open(config, Mode::Online)?;
    let request = TranslationRequest {
        source_language: source,
        target_language: target,
        source_text: text,
        user_translation: translation,
    };
    let verification = session
        .drill
        .verify_translation(&request, session.config.generator_timeout())
        .await;

    println!(
        "{}",
        if verification.is_correct { "Correct" } else { "Incorrect" }
    );
    println!("Feedback: {}", verification.feedback);
    println!("Translation: {}", verification.correct_translation);
    if !verification.explanation.is_empty() {
        println!("\n{}", verification.explanation);
    }
    Ok(())
}

pub async fn speak(
    config: Option<PathBuf>,
    text: String,
    language: String,
    output: PathBuf,
) -> Result<()> {
    let session = Session::open(config, Mode::Online)?;
    if session.config.speech.is_none() {
        anyhow::bail!("speech is not configured; add a [speech] section to lexidrill.toml");
    }
    let audio = session
        .drill
        .render_speech(&text, &language)
        .await
        .context("could not render speech")?;
    std::fs::write(&output, &audio)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Audio written to {}", output.display());
    Ok(())
}
