use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{ErrorContext, ProfolioError, ProfolioResult};
use crate::prompts::RenderedPrompt;

// LLM Provider enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LLMProvider {
    #[default]
    OpenRouter,
    Gemini,
    Anthropic,
}

impl LLMProvider {
    /// Environment variable holding the provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
            LLMProvider::Gemini => "GEMINI_API_KEY",
            LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LLMProvider::OpenRouter => DEFAULT_OPENROUTER_MODEL,
            LLMProvider::Gemini => DEFAULT_GEMINI_MODEL,
            LLMProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }
}

// OpenRouter API configuration
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash";

// Gemini API configuration
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

// Anthropic API configuration
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_MAX_TOKENS: u32 = 8192;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap();
}

/// Boundary to the external text generation service
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Send the prompt and return the parsed JSON output, or `None` when the
    /// service produced nothing usable
    async fn generate(&self, prompt: &RenderedPrompt, output_schema: &Value) -> ProfolioResult<Option<Value>>;
}

// Struct to hold the OpenRouter LLM response
#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<OpenRouterChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Debug, Deserialize)]
struct OpenRouterMessage {
    content: Option<String>,
}

// Struct to hold the Gemini LLM response
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

// Struct to hold the Anthropic LLM response
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
    #[serde(rename = "type")]
    content_type: String,
}

/// Pull the JSON document out of a model reply, tolerating Markdown fences
/// and chatter around the object.
pub fn extract_json(content: &str) -> Option<Value> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return Some(value);
    }

    if let Some(captures) = FENCED_JSON.captures(content) {
        if let Ok(value) = serde_json::from_str::<Value>(captures[1].trim()) {
            return Some(value);
        }
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

fn json_instructions(system_prompt: &str, output_schema: &Value) -> String {
    format!(
        "{}\n\nRespond with a single JSON object that conforms to the following JSON schema. Do not add any text outside the JSON.\n{}",
        system_prompt, output_schema
    )
}

// LLM Provider implementation
pub struct LLMProviderImpl {
    provider_type: LLMProvider,
    client: Client,
    model: String,
    api_key: Option<String>,
}

impl LLMProviderImpl {
    pub fn new(provider_type: LLMProvider, model: Option<String>, api_key: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| provider_type.default_model().to_string());
        debug!("Using {:?} with model {}", provider_type, model);

        Self {
            provider_type,
            client: Client::new(),
            model,
            api_key,
        }
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider_type
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> ProfolioResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            ProfolioError::Config(format!("{} environment variable not set", self.provider_type.api_key_var()))
        })
    }

    pub async fn send_prompt(&self, system_prompt: &str, user_prompt: &str) -> ProfolioResult<String> {
        match self.provider_type {
            LLMProvider::OpenRouter => self.send_openrouter_prompt(system_prompt, user_prompt).await,
            LLMProvider::Gemini => self.send_gemini_prompt(system_prompt, user_prompt).await,
            LLMProvider::Anthropic => self.send_anthropic_prompt(system_prompt, user_prompt).await,
        }
    }

    async fn post_json(&self, request: reqwest::RequestBuilder, payload: &Value, provider: &str) -> ProfolioResult<reqwest::Response> {
        let response = request
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .with_context(format!("Failed to send request to {}", provider))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} returned {}: {}", provider, status, body);
            return Err(ProfolioError::Upstream(format!("{} returned {}: {}", provider, status, body)));
        }

        Ok(response)
    }

    async fn send_openrouter_prompt(&self, system_prompt: &str, user_prompt: &str) -> ProfolioResult<String> {
        let api_key = self.api_key()?;

        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "response_format": { "type": "json_object" }
        });

        let request = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", api_key));
        let response_body = self
            .post_json(request, &payload, "OpenRouter")
            .await?
            .json::<OpenRouterResponse>()
            .await
            .with_context("Failed to parse OpenRouter response")?;

        Ok(response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn send_gemini_prompt(&self, system_prompt: &str, user_prompt: &str) -> ProfolioResult<String> {
        let api_key = self.api_key()?;

        let payload = json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let request = self.client.post(url).header("x-goog-api-key", api_key);
        let response_body = self
            .post_json(request, &payload, "Gemini")
            .await?
            .json::<GeminiResponse>()
            .await
            .with_context("Failed to parse Gemini response")?;

        Ok(response_body
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }

    async fn send_anthropic_prompt(&self, system_prompt: &str, user_prompt: &str) -> ProfolioResult<String> {
        let api_key = self.api_key()?;

        let payload = json!({
            "model": self.model,
            "system": system_prompt,
            "messages": [
                { "role": "user", "content": user_prompt }
            ],
            "max_tokens": ANTHROPIC_MAX_TOKENS
        });

        let request = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01");
        let response_body = self
            .post_json(request, &payload, "Anthropic")
            .await?
            .json::<AnthropicResponse>()
            .await
            .with_context("Failed to parse Anthropic response")?;

        Ok(response_body
            .content
            .into_iter()
            .filter(|content| content.content_type == "text")
            .map(|content| content.text)
            .collect::<String>())
    }
}

#[async_trait]
impl GenerationService for LLMProviderImpl {
    async fn generate(&self, prompt: &RenderedPrompt, output_schema: &Value) -> ProfolioResult<Option<Value>> {
        let system_prompt = json_instructions(&prompt.system, output_schema);
        let content = self.send_prompt(&system_prompt, &prompt.user).await?;

        let parsed = extract_json(&content);
        if parsed.is_none() {
            warn!("{:?} reply contained no JSON ({} chars)", self.provider_type, content.len());
        }
        Ok(parsed)
    }
}
