pub mod agent;
pub mod chat;
pub mod onboard;

use std::sync::Arc;

use autochat_config::AppConfig;
use autochat_core::conversation::Conversation;
use autochat_core::provider::Provider;

/// Build the completion provider, explaining how to set a key if none is configured.
pub fn provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY='sk-...'     (for OpenAI)");
        eprintln!("    export AUTOCHAT_API_KEY='sk-...'   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    Ok(autochat_providers::build_from_config(config)?)
}

/// A fresh conversation for one session.
pub fn conversation(config: &AppConfig, provider: Arc<dyn Provider>) -> Conversation {
    let conversation = Conversation::new(provider, &config.default_model);
    match config.max_tokens {
        Some(max) => conversation.with_max_tokens(max),
        None => conversation,
    }
}
