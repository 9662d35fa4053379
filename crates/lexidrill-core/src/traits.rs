//! Collaborator traits: entry storage, text generation and speech rendering.
//!
//! The core only depends on these seams. `lexidrill-providers` implements
//! the generator and speech traits over HTTP; [`crate::store::MemoryStore`]
//! implements the store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DrillError;
use crate::model::{Entry, EntryId};

// ---------------------------------------------------------------------------
// Entry store
// ---------------------------------------------------------------------------

/// Persistent collection of entries. Implementations serialize their own writes.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Every entry, ordered by id.
    async fn find_all(&self) -> Result<Vec<Entry>, DrillError>;

    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>, DrillError>;

    /// Entries whose language matches `language` (case-insensitive).
    async fn find_by_language(&self, language: &str) -> Result<Vec<Entry>, DrillError>;

    /// Insert (when `entry.id` is `None`) or replace. Returns the stored entry.
    async fn save(&self, entry: Entry) -> Result<Entry, DrillError>;

    /// Save several entries at once, all or nothing.
    async fn save_all(&self, entries: Vec<Entry>) -> Result<Vec<Entry>, DrillError>;

    /// Delete the given ids, returning how many existed.
    async fn delete_by_ids(&self, ids: &[EntryId]) -> Result<usize, DrillError>;
}

// ---------------------------------------------------------------------------
// Text generator
// ---------------------------------------------------------------------------

/// Backend that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate a reply for the prompt.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// Request for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "gpt-4o").
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Reply from a text generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw reply text.
    pub content: String,
    /// Model that actually produced the reply.
    pub model: String,
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// System prompt used when a request does not carry its own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a patient language teacher. When asked for JSON, respond with a single JSON object and nothing else.";

// ---------------------------------------------------------------------------
// Speech renderer
// ---------------------------------------------------------------------------

/// Backend that synthesizes speech audio.
#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    fn name(&self) -> &str;

    /// Render `text` spoken in `language` (an ISO code or language name).
    async fn render(&self, text: &str, language: &str) -> anyhow::Result<Vec<u8>>;
}
