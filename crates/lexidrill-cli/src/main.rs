//! lexidrill CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod session;

#[derive(Parser)]
#[command(
    name = "lexidrill",
    version,
    about = "Weighted vocabulary and grammar drill backed by an LLM"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter lexidrill.toml
    Init,

    /// Add a word to the library
    Add {
        /// Word in the source language
        word: String,
        /// Its translation
        translation: String,
        /// Language of the translation (e.g. "pl")
        #[arg(long)]
        language: String,
        /// Example sentence
        #[arg(long, default_value = "")]
        example: String,
        /// Short note shown after a check
        #[arg(long, default_value = "")]
        explanation: String,
    },

    /// Replace the fields of an existing word
    Edit {
        id: u64,
        word: String,
        translation: String,
        #[arg(long)]
        language: String,
        #[arg(long, default_value = "")]
        example: String,
        #[arg(long, default_value = "")]
        explanation: String,
    },

    /// List words in the library
    List {
        /// Only words in this language
        #[arg(long)]
        language: Option<String>,
    },

    /// Delete words by id
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Draw a word to practice, favouring the least mastered
    Draw {
        #[arg(long)]
        language: Option<String>,
    },

    /// Check a translation answer and update proficiency
    Check {
        id: u64,
        answer: String,
    },

    /// Export the library as a UTF-16 CSV file
    Export {
        #[arg(long)]
        output: PathBuf,
    },

    /// Import words from a CSV file
    Import {
        #[arg(long)]
        input: PathBuf,
    },

    /// Draw a word together with a grammar topic
    Grammar,

    /// Validate a sentence using a word and grammar topic
    Validate {
        /// Id of the word the sentence must use
        id: u64,
        #[arg(long)]
        sentence: String,
        #[arg(long)]
        topic: String,
        /// Write spoken audio of the (corrected) sentence here
        #[arg(long)]
        audio: Option<PathBuf>,
    },

    /// Generate a practice text to translate
    Generate {
        /// Language the text is written in
        #[arg(long)]
        source: String,
        /// Language the student translates into
        #[arg(long)]
        target: String,
        /// Difficulty level (e.g. "A2", "B1")
        #[arg(long, default_value = "B1")]
        level: String,
        #[arg(long, default_value = "5")]
        sentences: u32,
        #[arg(long)]
        topic: Option<String>,
    },

    /// Check a free translation of a text
    Verify {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        /// The original text
        #[arg(long)]
        text: String,
        /// The student's translation
        #[arg(long)]
        translation: String,
    },

    /// Render speech audio for a text
    Speak {
        text: String,
        #[arg(long)]
        language: String,
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lexidrill=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Add {
            word,
            translation,
            language,
            example,
            explanation,
        } => {
            let draft = commands::words::draft(word, translation, language, example, explanation);
            commands::words::add(config, draft).await
        }
        Commands::Edit {
            id,
            word,
            translation,
            language,
            example,
            explanation,
        } => {
            let draft = commands::words::draft(word, translation, language, example, explanation);
            commands::words::edit(config, id, draft).await
        }
        Commands::List { language } => commands::words::list(config, language).await,
        Commands::Delete { ids } => commands::words::delete(config, ids).await,
        Commands::Draw { language } => commands::drill::draw(config, language).await,
        Commands::Check { id, answer } => commands::drill::check(config, id, answer).await,
        Commands::Export { output } => commands::transfer::export(config, output).await,
        Commands::Import { input } => commands::transfer::import(config, input).await,
        Commands::Grammar => commands::grammar::draw(config).await,
        Commands::Validate {
            id,
            sentence,
            topic,
            audio,
        } => commands::grammar::validate(config, id, sentence, topic, audio).await,
        Commands::Generate {
            source,
            target,
            level,
            sentences,
            topic,
        } => commands::practice::generate(config, source, target, level, sentences, topic).await,
        Commands::Verify {
            source,
            target,
            text,
            translation,
        } => commands::practice::verify(config, source, target, text, translation).await,
        Commands::Speak {
            text,
            language,
            output,
        } => commands::practice::speak(config, text, language, output).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
