//! Per-invocation wiring: config, the JSON library file and the orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lexidrill_core::model::Entry;
use lexidrill_core::practice::PracticeOrchestrator;
use lexidrill_core::store::MemoryStore;
use lexidrill_core::traits::{GenerateRequest, GenerateResponse, TextGenerator};
use lexidrill_providers::config::load_config_from;
use lexidrill_providers::{create_speech_renderer, LexidrillConfig};

/// Whether the command talks to the text generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Offline,
    Online,
}

#[derive(Serialize, Deserialize)]
struct LibraryFile {
    entries: Vec<Entry>,
}

pub struct Session {
    pub config: LexidrillConfig,
    pub drill: PracticeOrchestrator,
    store: Arc<MemoryStore>,
    library: PathBuf,
}

impl Session {
    pub fn open(config_path: Option<PathBuf>, mode: Mode) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let library = config.library.clone();
        let store = Arc::new(MemoryStore::from_entries(read_library(&library)?));

        let generator: Arc<dyn TextGenerator> = match mode {
            Mode::Online => config.default_generator()?,
            Mode::Offline => Arc::new(Disconnected),
        };
        let mut drill = PracticeOrchestrator::new(
            store.clone(),
            generator,
            config.prompt_templates()?,
            config.practice_config(),
        );
        if mode == Mode::Online {
            if let Some(speech) = create_speech_renderer(&config)? {
                drill = drill.with_speech(speech);
            }
        }

        Ok(Self {
            config,
            drill,
            store,
            library,
        })
    }

    /// Write the library back to disk.
    pub fn save(&self) -> Result<()> {
        let file = LibraryFile {
            entries: self.store.snapshot()?,
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.library, json)
            .with_context(|| format!("failed to write library: {}", self.library.display()))?;
        tracing::debug!(
            path = %self.library.display(),
            entries = file.entries.len(),
            "saved library"
        );
        Ok(())
    }
}

fn read_library(path: &Path) -> Result<Vec<Entry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read library: {}", path.display()))?;
    let file: LibraryFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse library: {}", path.display()))?;
    Ok(file.entries)
}

/// Stand-in generator for commands that never call one.
struct Disconnected;

#[async_trait]
impl TextGenerator for Disconnected {
    fn name(&self) -> &str {
        "disconnected"
    }

    async fn generate(&self, _request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        anyhow::bail!("no text generator in offline mode")
    }
}
