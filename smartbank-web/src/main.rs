use anyhow::Context;
use clap::Parser;
use config::{PathManager, Settings};
use llm::OllamaProvider;
use smartbank_web::{AppState, logging, router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "SmartBank AI banking assistant", long_about = None)]
struct Args {
    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_BASE_URL")]
    ollama_url: Option<String>,

    /// Model selected for new sessions
    #[arg(long, env = "SMARTBANK_MODEL")]
    model: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:8501
    #[arg(long, env = "SMARTBANK_BIND")]
    bind: Option<String>,

    /// Directory for settings.toml and logs
    #[arg(long, env = "SMARTBANK_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[arg(long, short)]
    tracing: bool,
}

impl Args {
    /// Command line and environment take precedence over settings.toml.
    fn apply(self, settings: &mut Settings) {
        if let Some(url) = self.ollama_url {
            settings.ollama_url = url;
        }
        if let Some(model) = self.model {
            settings.default_model = model;
        }
        if let Some(bind) = self.bind {
            settings.bind = bind;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env_file();
    let args = Args::parse();
    let verbose = args.tracing;
    if let Some(dir) = args.config_dir.clone() {
        PathManager::set_config_dir(dir);
    }

    let mut settings = Settings::load();
    args.apply(&mut settings);

    logging::init_logging(verbose, settings.log_to_file);

    let provider = Arc::new(OllamaProvider::new(&settings.ollama_url));
    let state = AppState::new(provider, settings.default_model.clone(), settings.session_idle_ttl());
    state.sessions.clone().spawn_sweeper();

    let listener = TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    info!(
        bind = %settings.bind,
        ollama = %settings.ollama_url,
        model = %settings.default_model,
        "SmartBank listening"
    );

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;
    Ok(())
}
