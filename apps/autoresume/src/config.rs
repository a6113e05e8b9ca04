use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::llm_client::{LlmClient, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::signals::CategoryWeights;

/// Application configuration loaded from environment variables (and `.env`).
///
/// The API key is only required by commands that call the model, so it is checked
/// lazily by `llm_client()` rather than at load time.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    /// Minimum spacing between consecutive model calls.
    pub call_spacing: Duration,
    pub weights_path: Option<PathBuf>,
    pub pdflatex_bin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            call_spacing: Duration::from_secs(10),
            weights_path: None,
            pdflatex_bin: "pdflatex".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_base: optional_env("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            call_spacing: Duration::from_secs(parse_env(
                "AUTORESUME_CALL_SPACING_SECS",
                optional_env("AUTORESUME_CALL_SPACING_SECS"),
                defaults.call_spacing.as_secs(),
            )?),
            weights_path: optional_env("AUTORESUME_WEIGHTS_PATH").map(PathBuf::from),
            pdflatex_bin: optional_env("PDFLATEX_BIN").unwrap_or(defaults.pdflatex_bin),
            port: parse_env("PORT", optional_env("PORT"), defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }

    /// Builds the Gemini client. Fails if GEMINI_API_KEY is not set.
    pub fn llm_client(&self) -> Result<LlmClient> {
        let api_key = self
            .gemini_api_key
            .clone()
            .context("Required environment variable 'GEMINI_API_KEY' is not set")?;
        LlmClient::new(
            api_key,
            self.gemini_api_base.clone(),
            self.gemini_model.clone(),
            self.call_spacing,
        )
    }

    /// Category weights from `override_path`, else AUTORESUME_WEIGHTS_PATH, else defaults.
    pub fn load_weights(&self, override_path: Option<&Path>) -> Result<CategoryWeights> {
        match override_path.or(self.weights_path.as_deref()) {
            Some(path) => {
                let weights = CategoryWeights::load(path)?;
                info!(
                    "Loaded {} category weights from {}",
                    weights.len(),
                    path.display()
                );
                Ok(weights)
            }
            None => Ok(CategoryWeights::default()),
        }
    }
}

/// Unset and blank are the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
