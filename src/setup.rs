use anyhow::Result;
use log::debug;

use crate::config::{ApiKey, Config};
use crate::error::ConfigError;
use crate::llm::LlmClient;
use crate::llm::gemini::GeminiClient;
use crate::term::Console;

/// Use the configured key, or ask for one on an interactive terminal.
pub fn resolve_api_key(cfg: &Config, console: &dyn Console) -> Result<ApiKey> {
    if let Some(key) = &cfg.api_key {
        return Ok(key.clone());
    }

    eprintln!("Google API key for Gemini not found in GOOGLE_API_KEY or the config file.");
    let entered = console.prompt_secret("Please enter your API key: ")?;

    entered
        .as_deref()
        .and_then(ApiKey::parse)
        .ok_or_else(|| ConfigError::MissingApiKey.into())
}

/// Build the LLM client based on CLI + config.
pub fn build_llm_client(cfg: &Config, console: &dyn Console) -> Result<Box<dyn LlmClient>> {
    let key = resolve_api_key(cfg, console)?;

    debug!("Using GeminiClient with model: {}", cfg.model);

    let client = GeminiClient::new(
        key,
        cfg.model.clone(),
        cfg.api_base_url.clone(),
        cfg.request_timeout,
    )?;
    Ok(Box::new(client))
}
