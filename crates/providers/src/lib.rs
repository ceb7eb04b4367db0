//! LLM provider implementations for autochat.
//!
//! All providers implement the `autochat_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use autochat_config::AppConfig;
use autochat_core::error::ProviderError;
use autochat_core::provider::Provider;
use std::sync::Arc;

/// Build the completion provider described by the configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured("no API key (set OPENAI_API_KEY or AUTOCHAT_API_KEY)".into())
    })?;
    let name = if config.api_url.contains("api.openai.com") {
        "openai"
    } else {
        "custom"
    };
    Ok(Arc::new(OpenAiCompatProvider::new(name, &config.api_url, api_key)))
}
