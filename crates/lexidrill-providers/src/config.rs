//! Configuration loading and the generator/speech factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lexidrill_core::practice::PracticeConfig;
use lexidrill_core::prompt::{PromptOverrides, PromptTemplates};
use lexidrill_core::traits::{SpeechRenderer, TextGenerator};

use crate::anthropic::AnthropicGenerator;
use crate::openai::{OpenAiGenerator, OpenAiSpeech, DEFAULT_SPEECH_MODEL};

/// Configuration for a single backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Anthropic {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Speech rendering settings. The named provider must be an OpenAI one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Key into `providers`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    /// Voice per language code or name.
    #[serde(default)]
    pub voices: HashMap<String, String>,
}

/// Top-level lexidrill configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexidrillConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used for text generation.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on a single generator call.
    #[serde(default = "default_generator_timeout")]
    pub generator_timeout_secs: u64,
    /// Speech rendering; disabled when absent.
    #[serde(default)]
    pub speech: Option<SpeechConfig>,
    /// JSON file holding the entry library.
    #[serde(default = "default_library")]
    pub library: PathBuf,
    /// Prompt template overrides.
    #[serde(default)]
    pub prompts: PromptOverrides,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f64 {
    0.4
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_generator_timeout() -> u64 {
    30
}
fn default_speech_model() -> String {
    DEFAULT_SPEECH_MODEL.to_string()
}
fn default_library() -> PathBuf {
    PathBuf::from("./lexidrill-library.json")
}

impl Default for LexidrillConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            generator_timeout_secs: default_generator_timeout(),
            speech: None,
            library: default_library(),
            prompts: PromptOverrides::default(),
        }
    }
}

impl LexidrillConfig {
    /// Generation settings for the practice orchestrator.
    pub fn practice_config(&self) -> PracticeConfig {
        PracticeConfig {
            model: self.default_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: None,
        }
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_secs)
    }

    /// Parse the prompt templates, applying overrides.
    pub fn prompt_templates(&self) -> Result<PromptTemplates> {
        PromptTemplates::from_overrides(&self.prompts).context("invalid prompt override")
    }

    /// Generator for `default_provider`.
    pub fn default_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        let provider = self.providers.get(&self.default_provider).with_context(|| {
            format!(
                "provider '{}' is not configured (run `lexidrill init` or set LEXIDRILL_OPENAI_KEY)",
                self.default_provider
            )
        })?;
        create_generator(&self.default_provider, provider)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `lexidrill.toml` in the current directory
/// 2. `~/.config/lexidrill/config.toml`
///
/// Environment variable overrides: `LEXIDRILL_OPENAI_KEY`, `LEXIDRILL_ANTHROPIC_KEY`.
pub fn load_config() -> Result<LexidrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LexidrillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("lexidrill.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LexidrillConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse TOML text and resolve `${VAR}` references in provider tables.
pub fn parse_config(content: &str) -> Result<LexidrillConfig> {
    let mut config: LexidrillConfig = toml::from_str(content)?;
    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    Ok(config)
}

fn apply_env_overrides(config: &mut LexidrillConfig) {
    if let Ok(key) = std::env::var("LEXIDRILL_ANTHROPIC_KEY") {
        let entry = config
            .providers
            .entry("anthropic".into())
            .or_insert(ProviderConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Anthropic { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("LEXIDRILL_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lexidrill"))
}

/// Create a text generator from its configuration.
pub fn create_generator(name: &str, config: &ProviderConfig) -> Result<Arc<dyn TextGenerator>> {
    tracing::debug!(provider = name, "creating generator");
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => {
            Ok(Arc::new(AnthropicGenerator::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Arc::new(OpenAiGenerator::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        ))),
    }
}

/// Create the speech renderer, or `None` when speech is not configured.
pub fn create_speech_renderer(config: &LexidrillConfig) -> Result<Option<Arc<dyn SpeechRenderer>>> {
    let Some(speech) = &config.speech else {
        return Ok(None);
    };
    match config.providers.get(&speech.provider) {
        Some(ProviderConfig::OpenAI {
            api_key, base_url, ..
        }) => Ok(Some(Arc::new(
            OpenAiSpeech::new(api_key, base_url.clone(), Some(speech.model.clone()))
                .with_voices(speech.voices.clone()),
        ))),
        Some(other) => anyhow::bail!(
            "speech provider '{}' must be an openai provider, found {other:?}",
            speech.provider
        ),
        None => anyhow::bail!("speech provider '{}' is not configured", speech.provider),
    }
}
