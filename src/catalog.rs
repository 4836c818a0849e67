//! The recognised model catalog.
//!
//! Each entry maps a model identifier to a provider family, deployment
//! settings, generation parameters, and fixed per-million-token cost rates.
//! The catalog is deployment configuration, not core logic: adding a model
//! means adding one row here.
//!
//! Lookup is a total mapping with an explicit not-found case — an
//! unrecognised identifier fails with [`ExtractError::UnknownModel`] before
//! any client is constructed or any network call attempted.

use crate::error::ExtractError;

/// Provider family a model belongs to, with the per-family settings needed
/// to address its chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Azure-hosted OpenAI chat-completion deployment.
    AzureOpenAi {
        deployment: &'static str,
        endpoint: &'static str,
        api_version: &'static str,
    },
    /// Anthropic messages API.
    Anthropic { model: &'static str },
    /// Google Gemini generateContent API.
    Gemini { model: &'static str },
}

impl ProviderFamily {
    /// Short family name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderFamily::AzureOpenAi { .. } => "azure-openai",
            ProviderFamily::Anthropic { .. } => "anthropic",
            ProviderFamily::Gemini { .. } => "gemini",
        }
    }
}

/// One recognised model: identity, addressing, generation parameters, and
/// cost rates in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub family: ProviderFamily,
    pub temperature: f32,
    /// Maximum output tokens; `None` leaves the provider default in place.
    pub max_tokens: Option<u32>,
    /// Request timeout enforced by the HTTP client.
    pub timeout_secs: u64,
    /// USD per million input tokens.
    pub rate_in: f64,
    /// USD per million output tokens.
    pub rate_out: f64,
}

/// The fixed roster of recognised models.
///
/// Temperatures, token limits and timeouts mirror the deployed
/// configuration; reasoning-family deployments (o4-mini, o3, gpt-5) only
/// accept temperature 1.
pub static MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "azure-gpt-4o",
        family: ProviderFamily::AzureOpenAi {
            deployment: "gpt-4o",
            endpoint: "https://construct-llm.openai.azure.com",
            api_version: "2024-08-01-preview",
        },
        temperature: 0.0,
        max_tokens: Some(16384),
        timeout_secs: 240,
        rate_in: 2.5,
        rate_out: 10.0,
    },
    ModelSpec {
        id: "azure-gpt-4.1-mini",
        family: ProviderFamily::AzureOpenAi {
            deployment: "gpt-4.1-mini",
            endpoint: "https://chris-m5tp6zj5-eastus2.cognitiveservices.azure.com",
            api_version: "2024-12-01-preview",
        },
        temperature: 0.0,
        max_tokens: Some(16384),
        timeout_secs: 240,
        rate_in: 0.4,
        rate_out: 1.6,
    },
    ModelSpec {
        id: "azure-gpt-4.1",
        family: ProviderFamily::AzureOpenAi {
            deployment: "gpt-4.1-parsetron",
            endpoint: "https://parsetron.openai.azure.com",
            api_version: "2024-12-01-preview",
        },
        temperature: 0.0,
        max_tokens: None,
        timeout_secs: 240,
        rate_in: 2.0,
        rate_out: 8.0,
    },
    ModelSpec {
        id: "azure-o4-mini",
        family: ProviderFamily::AzureOpenAi {
            deployment: "o4-mini-parsetron",
            endpoint: "https://parsetron.openai.azure.com",
            api_version: "2024-12-01-preview",
        },
        temperature: 1.0,
        max_tokens: None,
        timeout_secs: 240,
        rate_in: 1.1,
        rate_out: 4.4,
    },
    ModelSpec {
        id: "azure-o3",
        family: ProviderFamily::AzureOpenAi {
            deployment: "o3-parsetron",
            endpoint: "https://parsetron.openai.azure.com",
            api_version: "2024-12-01-preview",
        },
        temperature: 1.0,
        max_tokens: None,
        timeout_secs: 240,
        rate_in: 2.0,
        rate_out: 8.0,
    },
    ModelSpec {
        id: "azure-gpt-5",
        family: ProviderFamily::AzureOpenAi {
            deployment: "gpt-5-parsetron",
            endpoint: "https://parsetron.openai.azure.com",
            api_version: "2024-12-01-preview",
        },
        temperature: 1.0,
        max_tokens: None,
        timeout_secs: 240,
        rate_in: 1.25,
        rate_out: 10.0,
    },
    ModelSpec {
        id: "claude-3-5-sonnet",
        family: ProviderFamily::Anthropic {
            model: "claude-3-5-sonnet-latest",
        },
        temperature: 0.0,
        max_tokens: Some(8192),
        timeout_secs: 240,
        rate_in: 3.0,
        rate_out: 15.0,
    },
    ModelSpec {
        id: "claude-3-7-sonnet",
        family: ProviderFamily::Anthropic {
            model: "claude-3-7-sonnet-latest",
        },
        temperature: 0.0,
        max_tokens: Some(64000),
        timeout_secs: 240,
        rate_in: 3.0,
        rate_out: 15.0,
    },
    ModelSpec {
        id: "gemini-2.0-flash",
        family: ProviderFamily::Gemini {
            model: "gemini-2.0-flash",
        },
        temperature: 0.0,
        max_tokens: Some(32000),
        timeout_secs: 240,
        rate_in: 0.10,
        rate_out: 0.40,
    },
    ModelSpec {
        id: "gemini-2.5-flash",
        family: ProviderFamily::Gemini {
            model: "gemini-2.5-flash",
        },
        temperature: 0.0,
        max_tokens: Some(65000),
        timeout_secs: 240,
        rate_in: 0.30,
        rate_out: 2.50,
    },
    ModelSpec {
        id: "gemini-2.5-pro",
        family: ProviderFamily::Gemini {
            model: "gemini-2.5-pro",
        },
        temperature: 0.0,
        max_tokens: Some(65000),
        timeout_secs: 300,
        rate_in: 1.25,
        rate_out: 10.0,
    },
];

impl ModelSpec {
    /// Resolve a model identifier to its catalog entry.
    pub fn lookup(id: &str) -> Result<&'static ModelSpec, ExtractError> {
        MODELS
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ExtractError::UnknownModel { id: id.to_string() })
    }

    /// All recognised model identifiers, in catalog order.
    pub fn all() -> impl Iterator<Item = &'static str> {
        MODELS.iter().map(|m| m.id)
    }
}
