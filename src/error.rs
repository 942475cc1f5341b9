//! Error types shared across git-ai-commit.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, reported before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "no Gemini API key found. Set GOOGLE_API_KEY, add google_api_key to ~/.config/git-ai-commit.toml, or run from a terminal to enter it"
    )]
    MissingApiKey,

    #[error("cancelled by user")]
    Cancelled,
}

/// A `--guidelines` value could not be turned into text.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to read guidelines file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch guidelines from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("guidelines URL {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("guidelines from {0} are empty")]
    Empty(String),
}

/// The style cache file exists but cannot be used.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read style cache {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("style cache {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write style cache {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode style profile: {0}")]
    Encode(#[source] serde_json::Error),
}

/// The model could not produce a commit message.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request to Gemini failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Gemini API error: HTTP {status} - {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode Gemini response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Gemini returned an empty commit message")]
    EmptyResponse,
}

impl GenerationError {
    /// Connection failures and timeouts are worth one more attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
