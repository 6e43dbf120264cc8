//! LLM integration for db-sage.
//!
//! Provides the [`LlmClient`] trait, the OpenAI implementation, a mock for
//! tests, and the prompt/extraction helpers around them.

pub mod extract;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod types;

pub use extract::{extract_sql, ExtractedSql};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::config::LlmConfig;
use crate::error::{Result, SageError};

/// Trait for LLM clients that can generate completions.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        (**self).complete(messages).await
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI chat completions.
    #[default]
    OpenAi,
    /// Mock client for tests and offline use (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fully resolved LLM settings.
///
/// Built once at startup from config, CLI flags, and the environment, then
/// passed explicitly to whatever needs it. Nothing downstream reads or
/// writes environment variables.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Which provider to talk to.
    pub provider: LlmProvider,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// API key, if one is present in the environment.
    pub api_key: Option<String>,
}

impl LlmSettings {
    /// Resolves settings from config with optional CLI overrides.
    ///
    /// This is the only place the `OPENAI_API_KEY` environment variable is
    /// read.
    pub fn resolve(
        config: &LlmConfig,
        provider_override: Option<&str>,
        model_override: Option<&str>,
    ) -> Result<Self> {
        let provider_name = provider_override.unwrap_or(&config.provider);
        let provider = provider_name
            .parse::<LlmProvider>()
            .map_err(SageError::config)?;

        Ok(Self {
            provider,
            model: model_override.unwrap_or(&config.model).to_string(),
            temperature: config.temperature,
            api_key: std::env::var("OPENAI_API_KEY").ok(),
        })
    }

    /// Settings for the mock provider, used by tests.
    pub fn mock() -> Self {
        Self {
            provider: LlmProvider::Mock,
            model: "mock".to_string(),
            temperature: 0.0,
            api_key: None,
        }
    }
}

/// Creates an LLM client for the given settings.
pub fn create_client(settings: &LlmSettings) -> Result<Box<dyn LlmClient>> {
    match settings.provider {
        LlmProvider::OpenAi => {
            let api_key = settings.api_key.clone().ok_or_else(|| {
                SageError::config(
                    "OPENAI_API_KEY is not set. Export it or add it to a .env file.",
                )
            })?;
            let config = OpenAiConfig::new(api_key, &settings.model)
                .with_temperature(settings.temperature);
            Ok(Box::new(OpenAiClient::new(config)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
