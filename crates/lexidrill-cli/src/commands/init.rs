//! The `lexidrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("lexidrill.toml").exists() {
        println!("lexidrill.toml already exists, skipping.");
    } else {
        std::fs::write("lexidrill.toml", SAMPLE_CONFIG)?;
        println!("Created lexidrill.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit lexidrill.toml with your API keys");
    println!("  2. Run: lexidrill add dog pies --language pl");
    println!("  3. Run: lexidrill draw");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lexidrill configuration

default_provider = "openai"
default_model = "gpt-4o"
temperature = 0.4
max_tokens = 1024
generator_timeout_secs = 30
library = "./lexidrill-library.json"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

# Spoken audio for validated sentences (OpenAI only).
[speech]
provider = "openai"
model = "tts-1"

# Prompt overrides use positional placeholders: {0}, {1}, ...
# [prompts]
# grammar_validation = "..."        # sentence, word, translation, topic
# practice_generation = "..."       # source, target, level, count, topic clause
# translation_verification = "..."  # source, target, text, translation
"#;
