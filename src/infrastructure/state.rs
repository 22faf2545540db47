//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::ports::outbound::{LlmPort, NarratorPort, RandomPort};
use crate::application::services::GameEngine;
use crate::infrastructure::config::{AppConfig, NarratorMode};
use crate::infrastructure::llm_narrator::{LlmNarrator, OfflineNarrator};
use crate::infrastructure::ollama::OllamaClient;
use crate::infrastructure::persistence::SqliteWorldStore;
use crate::infrastructure::random::{SeededRandom, ThreadRandom};
use crate::infrastructure::resilient_llm::{ResilientLlmClient, RetryConfig};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SqliteWorldStore>,
    pub engine: GameEngine,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store = Arc::new(
            SqliteWorldStore::connect(&config.database_url)
                .await
                .with_context(|| format!("failed to open world store at {}", config.database_url))?,
        );
        tracing::info!("Connected to world store");

        let narrator: Arc<dyn NarratorPort> = match config.narrator_mode {
            NarratorMode::Offline => {
                tracing::info!("Narrator disabled, using built-in narration");
                Arc::new(OfflineNarrator)
            }
            NarratorMode::Llm => {
                let ollama = OllamaClient::new(&config.ollama_base_url, &config.ollama_model);
                tracing::info!(model = ollama.model(), "Using Ollama narrator");
                let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(
                    Arc::new(ollama),
                    RetryConfig::default().with_max_retries(config.llm_max_retries),
                ));
                Arc::new(LlmNarrator::new(llm))
            }
        };

        let random: Arc<dyn RandomPort> = match config.rng_seed {
            Some(seed) => {
                tracing::info!(seed, "Using seeded dice");
                Arc::new(SeededRandom::new(seed))
            }
            None => Arc::new(ThreadRandom),
        };

        let engine = GameEngine::new(store.clone(), narrator, random, config.narrator_timeout);

        Ok(Self {
            config,
            store,
            engine,
        })
    }
}
