//! Application configuration

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::infrastructure::ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL};

/// Where narration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarratorMode {
    /// Ollama behind the retry wrapper
    Llm,
    /// Deterministic fallbacks only
    Offline,
}

impl NarratorMode {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "llm" | "ollama" => Ok(Self::Llm),
            "offline" | "none" => Ok(Self::Offline),
            other => bail!("NARRATOR_MODE must be 'llm' or 'offline', got '{}'", other),
        }
    }
}

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection URL for the world store
    pub database_url: String,

    /// Ollama API base URL (OpenAI-compatible)
    pub ollama_base_url: String,
    /// Model used for narration and classification
    pub ollama_model: String,
    pub narrator_mode: NarratorMode,
    /// Upper bound on a single narrator call, fallbacks kick in after it
    pub narrator_timeout: Duration,
    pub llm_max_retries: u32,

    /// Fixed seed for reproducible dice; thread RNG when unset
    pub rng_seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let narrator_timeout_secs: u64 = lookup("NARRATOR_TIMEOUT_SECS")
            .unwrap_or_else(|| "20".to_string())
            .parse()
            .context("NARRATOR_TIMEOUT_SECS must be a whole number of seconds")?;

        let rng_seed = match lookup("RPG_SEED") {
            Some(seed) => Some(seed.parse().context("RPG_SEED must be an unsigned integer")?),
            None => None,
        };

        Ok(Self {
            database_url: lookup("RPG_DATABASE_URL")
                .unwrap_or_else(|| "sqlite:rpg_world.db?mode=rwc".to_string()),

            ollama_base_url: lookup("OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
            ollama_model: lookup("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            narrator_mode: NarratorMode::parse(
                &lookup("NARRATOR_MODE").unwrap_or_else(|| "llm".to_string()),
            )?,
            narrator_timeout: Duration::from_secs(narrator_timeout_secs),
            llm_max_retries: lookup("LLM_MAX_RETRIES")
                .unwrap_or_else(|| "2".to_string())
                .parse()
                .context("LLM_MAX_RETRIES must be a non-negative integer")?,

            rng_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.database_url, "sqlite:rpg_world.db?mode=rwc");
        assert_eq!(config.ollama_base_url, DEFAULT_OLLAMA_BASE_URL);
        assert_eq!(config.narrator_mode, NarratorMode::Llm);
        assert_eq!(config.narrator_timeout, Duration::from_secs(20));
        assert_eq!(config.llm_max_retries, 2);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("NARRATOR_MODE", "Offline"),
            ("NARRATOR_TIMEOUT_SECS", "5"),
            ("RPG_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(config.narrator_mode, NarratorMode::Offline);
        assert_eq!(config.narrator_timeout, Duration::from_secs(5));
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[("NARRATOR_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("RPG_SEED", "-1")]).is_err());
        assert!(load(&[("NARRATOR_MODE", "telepathy")]).is_err());
    }
}
