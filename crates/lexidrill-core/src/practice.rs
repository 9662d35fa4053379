//! Practice orchestrator.
//!
//! Ties the entry store, the weighted sampler, prompt templates, the text
//! generator, the reply interpreter and speech rendering together into the
//! drill flows. Generator and speech failures never fail a request: they are
//! logged and replaced by fallback results.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::csv;
use crate::error::{DrillError, ProviderError};
use crate::interpreter::{self, Interpretation, ReplyContext};
use crate::model::{
    Entry, EntryId, GrammarDrill, GrammarValidationResult, NewEntry, PracticeRequest,
    TranslationCheck, TranslationRequest, TranslationVerification, GRAMMAR_TOPICS,
};
use crate::prompt::PromptTemplates;
use crate::sampler;
use crate::traits::{EntryStore, GenerateRequest, SpeechRenderer, TextGenerator};

/// Generation settings shared by every practice request.
#[derive(Debug, Clone)]
pub struct PracticeConfig {
    /// Model passed to the generator.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Optional system prompt override.
    pub system_prompt: Option<String>,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.4,
            max_tokens: 1024,
            system_prompt: None,
        }
    }
}

/// Steps of a sentence validation, in order. Used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    BuildPrompt,
    CallGenerator,
    Interpret,
    ResolveAudio,
    Respond,
}

/// A sentence to validate against an entry and grammar topic.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub entry_id: EntryId,
    pub sentence: String,
    pub grammar_topic: String,
    /// Upper bound on the generator call.
    pub timeout: Duration,
    /// Whether to render speech for the resulting sentence.
    pub with_audio: bool,
}

/// Everything a validation produced.
#[derive(Debug, Clone)]
pub struct SentenceValidation {
    pub entry: Entry,
    pub grammar_topic: String,
    pub result: GrammarValidationResult,
    pub audio: Option<Vec<u8>>,
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_lines: Vec<usize>,
}

/// The drill service.
pub struct PracticeOrchestrator {
    store: Arc<dyn EntryStore>,
    generator: Arc<dyn TextGenerator>,
    speech: Option<Arc<dyn SpeechRenderer>>,
    prompts: PromptTemplates,
    config: PracticeConfig,
    rng: Mutex<StdRng>,
}

impl PracticeOrchestrator {
    pub fn new(
        store: Arc<dyn EntryStore>,
        generator: Arc<dyn TextGenerator>,
        prompts: PromptTemplates,
        config: PracticeConfig,
    ) -> Self {
        Self {
            store,
            generator,
            speech: None,
            prompts,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Enable speech rendering for validations and [`Self::render_speech`].
    pub fn with_speech(mut self, speech: Arc<dyn SpeechRenderer>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Replace the random source, e.g. with a seeded one in tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    // -----------------------------------------------------------------------
    // Entries
    // -----------------------------------------------------------------------

    pub async fn list_entries(&self, language: Option<&str>) -> Result<Vec<Entry>, DrillError> {
        match language {
            Some(language) => self.store.find_by_language(language).await,
            None => self.store.find_all().await,
        }
    }

    pub async fn get_entry(&self, id: EntryId) -> Result<Entry, DrillError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(DrillError::NotFound(id))
    }

    /// Store a new entry at proficiency level 1.
    pub async fn create_entry(&self, draft: NewEntry) -> Result<Entry, DrillError> {
        let entry = self.store.save(draft.into_entry()?).await?;
        tracing::info!(id = ?entry.id, word = %entry.original_word, "created entry");
        Ok(entry)
    }

    /// Replace the editable fields of an entry; id and level are kept.
    pub async fn update_entry(&self, id: EntryId, draft: NewEntry) -> Result<Entry, DrillError> {
        let mut entry = self.get_entry(id).await?;
        draft.apply_to(&mut entry)?;
        self.store.save(entry).await
    }

    pub async fn delete_entries(&self, ids: &[EntryId]) -> Result<usize, DrillError> {
        let deleted = self.store.delete_by_ids(ids).await?;
        tracing::info!(requested = ids.len(), deleted, "deleted entries");
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // CSV
    // -----------------------------------------------------------------------

    pub async fn export_csv(&self) -> Result<Vec<u8>, DrillError> {
        let entries = self.store.find_all().await?;
        let bytes = csv::encode(&entries);
        tracing::info!(entries = entries.len(), bytes = bytes.len(), "exported CSV");
        Ok(bytes)
    }

    /// Decode and save a CSV document. A format error rejects the whole file.
    pub async fn import_csv(&self, bytes: &[u8]) -> Result<ImportSummary, DrillError> {
        let decoded = csv::decode_with_report(bytes)?;
        let imported = if decoded.entries.is_empty() {
            0
        } else {
            self.store.save_all(decoded.entries).await?.len()
        };
        tracing::info!(
            imported,
            skipped = decoded.skipped_lines.len(),
            "imported CSV"
        );
        Ok(ImportSummary {
            imported,
            skipped_lines: decoded.skipped_lines,
        })
    }

    // -----------------------------------------------------------------------
    // Drills
    // -----------------------------------------------------------------------

    /// Weighted pick among all entries, or those in `language`.
    pub async fn draw_entry(&self, language: Option<&str>) -> Result<Entry, DrillError> {
        let entries = self.list_entries(language).await?;
        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            sampler::sample(&entries, &mut *rng)?.clone()
        };
        tracing::debug!(id = ?picked.id, level = %picked.proficiency_level, "drew entry");
        Ok(picked)
    }

    /// Weighted entry plus a uniformly drawn grammar topic.
    pub async fn draw_grammar_drill(&self) -> Result<GrammarDrill, DrillError> {
        let entries = self.store.find_all().await?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = sampler::sample(&entries, &mut *rng)?.clone();
        let grammar_topic = GRAMMAR_TOPICS
            .choose(&mut *rng)
            .copied()
            .unwrap_or(GRAMMAR_TOPICS[0])
            .to_string();
        Ok(GrammarDrill {
            entry,
            grammar_topic,
        })
    }

    /// Exact-match translation check that moves the entry's proficiency.
    pub async fn check_translation(
        &self,
        id: EntryId,
        answer: &str,
    ) -> Result<TranslationCheck, DrillError> {
        let mut entry = self.get_entry(id).await?;
        let is_correct = entry.translation.trim().to_lowercase() == answer.trim().to_lowercase();
        let before = entry.proficiency_level;
        entry.proficiency_level = before.next(is_correct);
        let entry = self.store.save(entry).await?;

        tracing::info!(
            id,
            is_correct,
            from = %before,
            to = %entry.proficiency_level,
            "checked translation"
        );

        let message = if is_correct {
            "Correct!".to_string()
        } else {
            format!("Incorrect. The correct answer is: {}", entry.translation)
        };
        Ok(TranslationCheck {
            is_correct,
            correct_translation: entry.translation,
            example_usage: entry.example_usage,
            explanation: entry.explanation,
            message,
            proficiency_level: entry.proficiency_level,
        })
    }

    /// Validate a free-text sentence through the generator.
    ///
    /// Only an unknown entry id is an error; everything after the lookup
    /// degrades to a fallback result.
    pub async fn validate_sentence(
        &self,
        request: &ValidationRequest,
    ) -> Result<SentenceValidation, DrillError> {
        let entry = self.get_entry(request.entry_id).await?;
        let start = Instant::now();
        let context = ReplyContext {
            original_sentence: &request.sentence,
            grammar_topic: &request.grammar_topic,
        };

        tracing::debug!(stage = ?ValidationStage::BuildPrompt, id = request.entry_id);
        let prompt = self.prompts.grammar_validation(
            &request.sentence,
            &entry.original_word,
            &entry.translation,
            &request.grammar_topic,
        );

        let result = match prompt {
            Err(e) => {
                tracing::error!("failed to render validation prompt: {e}");
                interpreter::unavailable()
            }
            Ok(prompt) => {
                tracing::debug!(stage = ?ValidationStage::CallGenerator);
                match self.call_generator(prompt, request.timeout).await {
                    Ok(reply) => {
                        tracing::debug!(stage = ?ValidationStage::Interpret);
                        let (result, outcome) = interpreter::interpret_with_outcome(&reply, context);
                        if outcome == Interpretation::Degraded {
                            tracing::warn!(id = request.entry_id, "validation reply degraded");
                        }
                        result
                    }
                    Err(_) => interpreter::unavailable(),
                }
            }
        };

        let audio = if request.with_audio {
            tracing::debug!(stage = ?ValidationStage::ResolveAudio);
            let spoken = result.correction.as_deref().unwrap_or(&request.sentence);
            self.render_speech(spoken, &entry.language).await
        } else {
            None
        };

        tracing::debug!(stage = ?ValidationStage::Respond);
        tracing::info!(
            id = request.entry_id,
            topic = %request.grammar_topic,
            is_correct = result.is_correct,
            has_audio = audio.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "validated sentence"
        );

        Ok(SentenceValidation {
            entry,
            grammar_topic: request.grammar_topic.clone(),
            result,
            audio,
        })
    }

    /// Generate a practice text; `None` when the generator is unavailable.
    pub async fn generate_practice_text(
        &self,
        request: &PracticeRequest,
        timeout: Duration,
    ) -> Option<String> {
        let prompt = match self.prompts.practice_generation(request) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("failed to render practice prompt: {e}");
                return None;
            }
        };
        self.call_generator(prompt, timeout)
            .await
            .ok()
            .map(|text| text.trim().to_string())
    }

    /// Grade a free translation through the generator.
    pub async fn verify_translation(
        &self,
        request: &TranslationRequest,
        timeout: Duration,
    ) -> TranslationVerification {
        let prompt = match self.prompts.translation_verification(request) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("failed to render verification prompt: {e}");
                return interpreter::translation_unverified();
            }
        };
        match self.call_generator(prompt, timeout).await {
            Ok(reply) => interpreter::interpret_translation(&reply, &request.user_translation),
            Err(_) => interpreter::translation_unverified(),
        }
    }

    /// Best-effort speech synthesis; `None` on blank text, no renderer, or failure.
    pub async fn render_speech(&self, text: &str, language: &str) -> Option<Vec<u8>> {
        if text.trim().is_empty() {
            tracing::warn!("refusing to render speech for empty text");
            return None;
        }
        let speech = self.speech.as_ref()?;
        match speech.render(text, language).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(renderer = speech.name(), language, "speech rendering failed: {e:#}");
                None
            }
        }
    }

    /// Send one prompt, bounded by `timeout`.
    async fn call_generator(&self, prompt: String, timeout: Duration) -> Result<String, DrillError> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt,
            system_prompt: self.config.system_prompt.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match tokio::time::timeout(timeout, self.generator.generate(&request)).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    provider = self.generator.name(),
                    model = %response.model,
                    latency_ms = response.latency_ms,
                    tokens = response.token_usage.total_tokens,
                    "generator replied"
                );
                Ok(response.content)
            }
            Ok(Err(e)) => {
                let permanent = e
                    .downcast_ref::<ProviderError>()
                    .is_some_and(ProviderError::is_permanent);
                tracing::warn!(
                    provider = self.generator.name(),
                    permanent,
                    "generator failed: {e:#}"
                );
                Err(DrillError::GeneratorUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.generator.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "generator timed out"
                );
                Err(DrillError::GeneratorUnavailable(format!(
                    "timed out after {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }
}
