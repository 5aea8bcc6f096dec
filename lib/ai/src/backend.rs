//! Text generator abstraction.
//!
//! Provides a single interface over the hosted LLM providers an agent node
//! can be configured with.

use crate::error::GenerateError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosted providers an agent node can target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// OpenAI chat completions.
    #[default]
    OpenAi,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl AiProvider {
    /// Parses the provider name stored in node config.
    ///
    /// Unknown names fall back to the default provider.
    #[must_use]
    pub fn from_config(name: Option<&str>) -> Self {
        match name {
            Some("gemini") => Self::Gemini,
            _ => Self::OpenAi,
        }
    }

    /// Model used when the node does not name one.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Gemini => "gemini-pro",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// A single-shot generation request.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Provider to call.
    pub provider: AiProvider,
    /// Provider API key taken from the node config.
    pub api_key: String,
    /// Model override.
    pub model: Option<String>,
    /// Rendered system prompt.
    pub system: String,
    /// Rendered user prompt.
    pub user: String,
}

impl GenerateRequest {
    /// Creates a request for `provider` with the rendered prompts.
    #[must_use]
    pub fn new(
        provider: AiProvider,
        api_key: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
            system: system.into(),
            user: user.into(),
        }
    }

    /// Sets the model override.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the model to call.
    ///
    /// Gemini only accepts Gemini model names; anything else falls back to
    /// the provider default.
    #[must_use]
    pub fn effective_model(&self) -> &str {
        match (self.provider, self.model.as_deref()) {
            (AiProvider::Gemini, Some(model)) if model.contains("gemini") => model,
            (AiProvider::OpenAi, Some(model)) if !model.is_empty() => model,
            (provider, _) => provider.default_model(),
        }
    }
}

impl fmt::Debug for GenerateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("system", &self.system)
            .field("user", &self.user)
            .finish()
    }
}

/// Trait for text generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a reply for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError>;
}
