//! OpenAI API backends: chat completions and speech.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lexidrill_core::traits::{
    GenerateRequest, GenerateResponse, SpeechRenderer, TextGenerator, TokenUsage,
    DEFAULT_SYSTEM_PROMPT,
};

use crate::http::{self, DEFAULT_TIMEOUT_SECS};
use crate::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "alloy";

/// OpenAI-compatible chat completions generator.
pub struct OpenAiGenerator {
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            org_id,
            client: http::client(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage>,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
    model: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OpenAiError>(body)
        .ok()
        .map(|e| e.error.message)
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let body = OpenAiRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = http::check_status(response, &request.model, error_message).await?;

        let api_response: OpenAiResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(GenerateResponse {
            content,
            model: api_response.model,
            token_usage: TokenUsage {
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            latency_ms,
        })
    }
}

/// OpenAI text-to-speech renderer producing MP3 audio.
pub struct OpenAiSpeech {
    api_key: String,
    base_url: String,
    model: String,
    /// Voice per lowercase language code or name; unlisted languages use [`DEFAULT_VOICE`].
    voices: HashMap<String, String>,
    client: reqwest::Client,
}

impl OpenAiSpeech {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string()),
            voices: HashMap::new(),
            client: http::client(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_voices(mut self, voices: HashMap<String, String>) -> Self {
        self.voices = voices
            .into_iter()
            .map(|(language, voice)| (language.trim().to_lowercase(), voice))
            .collect();
        self
    }

    pub fn voice_for(&self, language: &str) -> &str {
        self.voices
            .get(&language.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(DEFAULT_VOICE)
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f64,
}

#[async_trait]
impl SpeechRenderer for OpenAiSpeech {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn render(&self, text: &str, language: &str) -> anyhow::Result<Vec<u8>> {
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: self.voice_for(language),
            response_format: "mp3",
            speed: 1.0,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = http::check_status(response, &self.model, error_message).await?;

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        tracing::debug!(bytes = audio.len(), "rendered speech");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> GenerateRequest {
        GenerateRequest {
            model: model.into(),
            prompt: "Check: I has a dog.".into(),
            system_prompt: None,
            max_tokens: 256,
            temperature: 0.4,
        }
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "{\"isCorrect\": true}", "role": "assistant"}, "index": 0}],
            "model": "gpt-4o",
            "usage": {"prompt_tokens": 40, "completion_tokens": 15, "total_tokens": 55}
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o", "temperature": 0.4})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("test-key", Some(server.uri()), None);
        let response = generator.generate(&request("gpt-4o")).await.unwrap();
        assert_eq!(response.content, "{\"isCorrect\": true}");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.token_usage.total_tokens, 55);
    }

    #[tokio::test]
    async fn organization_header_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("OpenAI-Organization", "org-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}],
                "model": "gpt-4o"
            })))
            .mount(&server)
            .await;

        let generator =
            OpenAiGenerator::new("key", Some(server.uri()), Some("org-1".to_string()));
        let response = generator.generate(&request("gpt-4o")).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(response.token_usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("key", Some(server.uri()), None);
        let err = generator.generate(&request("gpt-4o")).await.unwrap_err();
        match err.downcast_ref::<ProviderError>() {
            Some(ProviderError::ApiError { status, message }) => {
                assert_eq!(*status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_uses_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided"}
            })))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("bad", Some(server.uri()), None);
        let err = generator.generate(&request("gpt-4o")).await.unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(provider_err.is_permanent());
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("key", Some(server.uri()), None);
        let err = generator.generate(&request("gpt-4o")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::RateLimited {
                retry_after_ms: 7000
            })
        ));
    }

    #[tokio::test]
    async fn speech_returns_audio_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(header("Authorization", "Bearer key"))
            .and(body_partial_json(serde_json::json!({
                "model": "tts-1",
                "input": "Mam psa.",
                "voice": "nova",
                "response_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake".to_vec()))
            .mount(&server)
            .await;

        let voices = HashMap::from([("PL".to_string(), "nova".to_string())]);
        let speech = OpenAiSpeech::new("key", Some(server.uri()), None).with_voices(voices);
        let audio = speech.render("Mam psa.", "pl").await.unwrap();
        assert_eq!(audio, b"ID3fake");
    }

    #[test]
    fn unknown_language_uses_default_voice() {
        let speech = OpenAiSpeech::new("key", None, None);
        assert_eq!(speech.voice_for("klingon"), DEFAULT_VOICE);
    }

    #[tokio::test]
    async fn speech_error_status_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let speech = OpenAiSpeech::new("key", Some(server.uri()), None);
        let err = speech.render("Hello", "en").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
