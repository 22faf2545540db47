//! RPG Engine - terminal front end
//!
//! Reads player input line by line from stdin and prints whatever the
//! engine says back. `quit` or end of input ends the session.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rpg_engine::application::dto::GameState;
use rpg_engine::infrastructure::config::AppConfig;
use rpg_engine::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the story on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rpg_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting RPG Engine");

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Narrator: {:?} ({})", config.narrator_mode, config.ollama_base_url);

    let state = AppState::new(config).await?;
    tracing::info!("Application state initialized");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = GameState::new();

    print_messages(&mut stdout, &state.engine.intro()).await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }

        let (next, messages) = state
            .engine
            .step(session, &line)
            .await
            .context("the session cannot continue")?;
        session = next;
        print_messages(&mut stdout, &messages).await?;
    }

    tracing::info!(turns = session.turn, "Session ended");
    stdout.write_all(b"Farewell, adventurer.\n").await?;
    Ok(())
}

async fn print_messages(stdout: &mut tokio::io::Stdout, messages: &[String]) -> anyhow::Result<()> {
    for message in messages {
        stdout.write_all(message.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;
    Ok(())
}
