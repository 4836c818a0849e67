//! Provider chat invocation: one wire codec per provider family.
//!
//! This module converts the two-part extraction prompt into a provider API
//! call and returns the raw response text plus token counters. It is
//! intentionally thin — all prompt engineering lives in [`crate::prompts`]
//! and all response interpretation in [`crate::pipeline::decode`].
//!
//! ## Failure policy
//!
//! Fail-fast, no retry: the pipeline processes one invoice per invocation
//! and the caller owns the user-visible outcome. A timeout surfaces as
//! [`ExtractError::ProviderTimeout`]; every other provider-side failure
//! propagates unchanged as [`ExtractError::LlmApi`].

use crate::catalog::{ModelSpec, ProviderFamily};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

/// Raw response from one chat call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A chat client bound to one catalog entry and its credentials.
///
/// Construction validates that the credential for the model's provider
/// family is configured; no network call occurs until [`ChatClient::chat`].
#[derive(Debug)]
pub struct ChatClient {
    spec: &'static ModelSpec,
    api_key: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(
        spec: &'static ModelSpec,
        config: &ExtractionConfig,
    ) -> Result<Self, ExtractError> {
        let (key, env_hint) = match spec.family {
            ProviderFamily::AzureOpenAi { .. } => {
                (config.azure_openai_key.as_deref(), "AZURE_OPENAI_API_KEY")
            }
            ProviderFamily::Anthropic { .. } => {
                (config.anthropic_key.as_deref(), "ANTHROPIC_API_KEY")
            }
            ProviderFamily::Gemini { .. } => (config.gemini_key.as_deref(), "GOOGLE_AI_API_KEY"),
        };
        let api_key = key
            .ok_or_else(|| {
                ExtractError::InvalidConfig(format!(
                    "no API key configured for provider family '{}' ({env_hint})",
                    spec.family.name()
                ))
            })?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(spec.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            spec,
            api_key,
            http,
        })
    }

    /// Invoke the model with the system and user prompts.
    pub async fn chat(&self, system: &str, user: &str) -> Result<ChatResponse, ExtractError> {
        let start = Instant::now();
        let request = self.build_request(system, user);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::ProviderTimeout {
                    model: self.spec.id.to_string(),
                    secs: self.spec.timeout_secs,
                }
            } else {
                ExtractError::LlmApi {
                    model: self.spec.id.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::LlmApi {
                model: self.spec.id.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: Value = response.json().await.map_err(|e| ExtractError::LlmApi {
            model: self.spec.id.to_string(),
            message: format!("invalid response body: {e}"),
        })?;

        let parsed = self.parse_response(&body)?;
        debug!(
            model = self.spec.id,
            input_tokens = parsed.input_tokens,
            output_tokens = parsed.output_tokens,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chat call complete"
        );
        Ok(parsed)
    }

    fn build_request(&self, system: &str, user: &str) -> reqwest::RequestBuilder {
        match self.spec.family {
            ProviderFamily::AzureOpenAi {
                deployment,
                endpoint,
                api_version,
            } => {
                let url = format!(
                    "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
                );
                let mut body = json!({
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": user},
                    ],
                    "temperature": self.spec.temperature,
                });
                if let Some(max) = self.spec.max_tokens {
                    body["max_tokens"] = json!(max);
                }
                self.http.post(url).header("api-key", &self.api_key).json(&body)
            }
            ProviderFamily::Anthropic { model } => {
                let body = json!({
                    "model": model,
                    // The messages API requires max_tokens.
                    "max_tokens": self.spec.max_tokens.unwrap_or(8192),
                    "temperature": self.spec.temperature,
                    "system": system,
                    "messages": [{"role": "user", "content": user}],
                });
                self.http
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&body)
            }
            ProviderFamily::Gemini { model } => {
                let url = format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
                );
                let mut generation_config = json!({"temperature": self.spec.temperature});
                if let Some(max) = self.spec.max_tokens {
                    generation_config["maxOutputTokens"] = json!(max);
                }
                let body = json!({
                    "system_instruction": {"parts": [{"text": system}]},
                    "contents": [{"role": "user", "parts": [{"text": user}]}],
                    "generationConfig": generation_config,
                });
                self.http
                    .post(url)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&body)
            }
        }
    }

    fn parse_response(&self, body: &Value) -> Result<ChatResponse, ExtractError> {
        let malformed = |what: &str| ExtractError::LlmApi {
            model: self.spec.id.to_string(),
            message: format!("malformed response: missing {what}"),
        };

        match self.spec.family {
            ProviderFamily::AzureOpenAi { .. } => Ok(ChatResponse {
                content: body["choices"][0]["message"]["content"]
                    .as_str()
                    .ok_or_else(|| malformed("choices[0].message.content"))?
                    .to_string(),
                input_tokens: body["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
                output_tokens: body["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            }),
            ProviderFamily::Anthropic { .. } => Ok(ChatResponse {
                content: body["content"][0]["text"]
                    .as_str()
                    .ok_or_else(|| malformed("content[0].text"))?
                    .to_string(),
                input_tokens: body["usage"]["input_tokens"].as_u64().unwrap_or(0),
                output_tokens: body["usage"]["output_tokens"].as_u64().unwrap_or(0),
            }),
            ProviderFamily::Gemini { .. } => Ok(ChatResponse {
                content: body["candidates"][0]["content"]["parts"][0]["text"]
                    .as_str()
                    .ok_or_else(|| malformed("candidates[0].content.parts[0].text"))?
                    .to_string(),
                input_tokens: body["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0),
                output_tokens: body["usageMetadata"]["candidatesTokenCount"]
                    .as_u64()
                    .unwrap_or(0),
            }),
        }
    }
}
