//! lexidrill-providers — Text generation and speech backends.
//!
//! Implements the core `TextGenerator` trait for OpenAI-compatible and
//! Anthropic APIs, `SpeechRenderer` for OpenAI speech, and the TOML
//! configuration that selects between them.

pub mod anthropic;
pub mod config;
mod http;
pub mod mock;
pub mod openai;

pub use config::{
    create_generator, create_speech_renderer, load_config, LexidrillConfig, ProviderConfig,
};
pub use lexidrill_core::error::ProviderError;
