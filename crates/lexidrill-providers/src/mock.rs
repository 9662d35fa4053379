//! Mock collaborators for exercising the drill flows without network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use lexidrill_core::traits::{
    GenerateRequest, GenerateResponse, SpeechRenderer, TextGenerator, TokenUsage,
};

use crate::ProviderError;

/// A scripted text generator.
///
/// Replies are chosen by prompt substring, falling back to a default reply.
pub struct MockGenerator {
    /// Map of prompt substring → reply.
    responses: HashMap<String, String>,
    default_response: String,
    /// Fail every call with an API error instead of replying.
    failing: bool,
    /// Sleep before replying.
    delay: Option<Duration>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockGenerator {
    /// Create a mock with the given prompt→reply mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "{}".to_string(),
            failing: false,
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.default_response = response.to_string();
        mock
    }

    /// Create a mock whose every call fails.
    pub fn failing() -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.failing = true;
        mock
    }

    /// Delay each reply, e.g. to trip a caller's timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(ProviderError::ApiError {
                status: 503,
                message: "mock generator is failing".into(),
            }
            .into());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        let prompt_tokens = (request.prompt.len() / 4) as u32; // Rough estimate
        let completion_tokens = (content.len() / 4) as u32;
        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }
}

/// A speech renderer that returns fixed bytes, or fails.
pub struct MockSpeech {
    audio: Vec<u8>,
    failing: bool,
    call_count: AtomicU32,
    last_text: Mutex<Option<(String, String)>>,
}

impl MockSpeech {
    pub fn new(audio: &[u8]) -> Self {
        Self {
            audio: audio.to_vec(),
            failing: false,
            call_count: AtomicU32::new(0),
            last_text: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let mut mock = Self::new(&[]);
        mock.failing = true;
        mock
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Last `(text, language)` pair rendered.
    pub fn last_text(&self) -> Option<(String, String)> {
        self.last_text.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl SpeechRenderer for MockSpeech {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(&self, text: &str, language: &str) -> anyhow::Result<Vec<u8>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_text.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((text.to_string(), language.to_string()));
        if self.failing {
            return Err(ProviderError::NetworkError("mock speech is failing".into()).into());
        }
        Ok(self.audio.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock".into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let generator = MockGenerator::with_fixed_response(r#"{"isCorrect":true}"#);
        let response = generator.generate(&request("anything")).await.unwrap();
        assert_eq!(response.content, r#"{"isCorrect":true}"#);
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert("Grammar topic".to_string(), r#"{"isCorrect":false}"#.to_string());
        responses.insert("translation exercise".to_string(), "Mam psa.".to_string());
        let generator = MockGenerator::new(responses);

        let resp = generator
            .generate(&request("Write a text for a translation exercise."))
            .await
            .unwrap();
        assert_eq!(resp.content, "Mam psa.");

        let resp = generator
            .generate(&request("Grammar topic: Past Simple"))
            .await
            .unwrap();
        assert!(resp.content.contains("isCorrect"));

        let resp = generator.generate(&request("unrelated")).await.unwrap();
        assert_eq!(resp.content, "{}");
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_generator_reports_provider_error() {
        let generator = MockGenerator::failing();
        let err = generator.generate(&request("x")).await.unwrap_err();
        assert!(err.downcast_ref::<ProviderError>().is_some());
    }

    #[tokio::test]
    async fn poisoned_lock_still_records() {
        let generator = MockGenerator::with_fixed_response("ok");
        std::thread::scope(|scope| {
            let handle = scope.spawn(|| {
                let _guard = generator.last_request.lock();
                panic!("holder panicked");
            });
            assert!(handle.join().is_err());
        });
        assert!(generator.last_request.is_poisoned());

        let response = generator.generate(&request("after")).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(generator.last_request().unwrap().prompt, "after");
    }

    #[tokio::test]
    async fn speech_records_text() {
        let speech = MockSpeech::new(b"mp3");
        assert_eq!(speech.render("Hola", "es").await.unwrap(), b"mp3");
        assert_eq!(
            speech.last_text(),
            Some(("Hola".to_string(), "es".to_string()))
        );
        assert!(MockSpeech::failing().render("Hola", "es").await.is_err());
    }
}
