//! Solace server binary — the main entry point for the Solace platform.
//!
//! Starts an axum HTTP server with structured logging, pipeline wiring,
//! the reply-audio retention task, and graceful shutdown on
//! SIGTERM/SIGINT.

use solace_server::{app, config, retention, AppState};
use solace_turn::{
    AnalyzerCliFaceEmotion, ArtifactStore, CliSentimentModel, FaceEmotion, FacialEmotionAnalyzer,
    GeminiClient, ResponseGenerator, ResponseModel, SentimentAnalyzer, SentimentModel,
    SpeechSynthesizer, SpeechToText, TtsCli, TurnPipeline, Validator, WhisperCliStt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SOLACE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// Wires the configured external capabilities into a pipeline.
fn build_pipeline(config: &config::Config) -> TurnPipeline {
    let stt: Arc<dyn SpeechToText> = Arc::new(WhisperCliStt::new(
        &config.speech.stt_binary,
        &config.speech.stt_model,
    ));

    let sentiment_model: Option<Arc<dyn SentimentModel>> =
        config.sentiment.classifier_binary.as_ref().map(|binary| {
            Arc::new(CliSentimentModel::new(
                binary,
                config.sentiment.classifier_model.clone(),
            )) as Arc<dyn SentimentModel>
        });
    if sentiment_model.is_none() {
        tracing::info!("no sentiment classifier configured, using lexical analysis only");
    }

    let facial_capability: Option<Arc<dyn FaceEmotion>> = config
        .facial
        .analyzer_binary
        .as_ref()
        .map(|binary| Arc::new(AnalyzerCliFaceEmotion::new(binary)) as Arc<dyn FaceEmotion>);

    let response_model: Option<Arc<dyn ResponseModel>> = match &config.generation.api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.generation.model.clone())
                .expect("failed to build generation HTTP client");
            Some(Arc::new(client) as Arc<dyn ResponseModel>)
        }
        None => {
            tracing::warn!(
                "GEMINI_API_KEY is not set, text turns will receive the explanatory fallback reply"
            );
            None
        }
    };

    let synthesizer: Arc<dyn SpeechSynthesizer> =
        Arc::new(TtsCli::new(&config.speech.tts_binary));

    TurnPipeline::new(
        Validator::new(config.audio.clone(), &config.storage.dir),
        stt,
        SentimentAnalyzer::new(sentiment_model),
        FacialEmotionAnalyzer::new(facial_capability),
        ResponseGenerator::new(response_model),
        synthesizer,
        ArtifactStore::new(&config.storage.dir),
    )
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Storage must exist before the first upload or synthesis.
    std::fs::create_dir_all(&config.storage.dir)
        .expect("failed to create storage directory — check storage.dir in config");

    let pipeline = Arc::new(build_pipeline(&config));

    // Start the reply-audio retention task.
    tokio::spawn(retention::start_artifact_reaper(
        pipeline.artifacts().clone(),
        Duration::from_secs(config.storage.artifact_ttl_secs),
        Duration::from_secs(config.storage.reap_interval_secs),
    ));

    // Build application
    let state = Arc::new(AppState { pipeline });
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting solace server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("solace server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
