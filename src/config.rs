use crate::Cli;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::prompt_builder::DEFAULT_MAX_DIFF_BYTES;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_HISTORY_DEPTH: u32 = 50;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
const MODEL_ENV: &str = "AI_COMMIT_MODEL";
const API_BASE_URL_ENV: &str = "AI_COMMIT_API_BASE_URL";

/// A provider credential. Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    /// `None` for blank input.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        (!key.is_empty()).then(|| ApiKey::new(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Final resolved configuration for git-ai-commit.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` until prompted for; see `setup::resolve_api_key`.
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub api_base_url: String,
    pub history_depth: u32,
    pub max_diff_bytes: usize,
    pub request_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--model`, `--history-depth`)
    ///   2. Env vars (`GOOGLE_API_KEY`, `AI_COMMIT_MODEL`, `AI_COMMIT_API_BASE_URL`)
    ///   3. TOML `~/.config/git-ai-commit.toml`
    ///   4. Hardcoded defaults
    pub fn from_sources(cli: &Cli) -> Self {
        let file_cfg = load_file_config().unwrap_or_default();
        Self::resolve(cli, file_cfg, |name| env::var(name).ok())
    }

    fn resolve(cli: &Cli, file_cfg: FileConfig, env_var: impl Fn(&str) -> Option<String>) -> Self {
        let model = cli
            .model
            .clone()
            .or_else(|| env_var(MODEL_ENV))
            .or(file_cfg.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_key = env_var(API_KEY_ENV)
            .as_deref()
            .and_then(ApiKey::parse)
            .or_else(|| file_cfg.google_api_key.as_deref().and_then(ApiKey::parse));

        let api_base_url = env_var(API_BASE_URL_ENV)
            .or(file_cfg.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let history_depth = cli
            .history_depth
            .or(file_cfg.history_depth)
            .unwrap_or(DEFAULT_HISTORY_DEPTH);

        Config {
            api_key,
            model,
            api_base_url,
            history_depth,
            max_diff_bytes: file_cfg.max_diff_bytes.unwrap_or(DEFAULT_MAX_DIFF_BYTES),
            request_timeout: Duration::from_secs(
                file_cfg
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            fetch_timeout: Duration::from_secs(
                file_cfg
                    .fetch_timeout_secs
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    model: Option<String>,
    google_api_key: Option<String>,
    api_base_url: Option<String>,
    history_depth: Option<u32>,
    max_diff_bytes: Option<usize>,
    request_timeout_secs: Option<u64>,
    fetch_timeout_secs: Option<u64>,
}

/// Return `~/.config/git-ai-commit.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("git-ai-commit.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        return None;
    }

    let data = fs::read_to_string(&path).ok()?;
    match toml::from_str::<FileConfig>(&data) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("ignoring invalid config file {:?}: {e}", path);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("git-ai-commit").chain(args.iter().copied())).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_any_source() {
        let cfg = Config::resolve(&cli(&[]), FileConfig::default(), env_of(&[]));

        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.history_depth, DEFAULT_HISTORY_DEPTH);
        assert_eq!(cfg.max_diff_bytes, DEFAULT_MAX_DIFF_BYTES);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file: FileConfig = toml::from_str(
            "model = \"from-file\"\ngoogle_api_key = \"file-key\"\nhistory_depth = 7\nmax_diff_bytes = 1000\n",
        )
        .unwrap();
        let env = env_of(&[(MODEL_ENV, "from-env"), (API_KEY_ENV, "env-key")]);

        let cfg = Config::resolve(&cli(&["--model", "from-cli"]), file, env);
        assert_eq!(cfg.model, "from-cli");
        assert_eq!(cfg.api_key, Some(ApiKey::new("env-key")));
        assert_eq!(cfg.history_depth, 7);
        assert_eq!(cfg.max_diff_bytes, 1000);
    }

    #[test]
    fn blank_env_key_falls_back_to_file() {
        let file: FileConfig = toml::from_str("google_api_key = \"file-key\"").unwrap();
        let cfg = Config::resolve(&cli(&[]), file, env_of(&[(API_KEY_ENV, "  ")]));
        assert_eq!(cfg.api_key, Some(ApiKey::new("file-key")));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let cfg = Config::resolve(&cli(&[]), FileConfig::default(), env_of(&[(API_KEY_ENV, "sekrit")]));
        assert!(!format!("{cfg:?}").contains("sekrit"));
    }
}
