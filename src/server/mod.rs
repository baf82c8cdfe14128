//! Salary prediction server
//!
//! Serves one loaded pipeline artifact over HTTP: `POST /predict` for JSON
//! clients, `GET /` for the job-details form, `GET /health` for liveness checks.

mod api;
mod error;
mod handlers;
mod state;
mod ui;

pub use api::create_router;
pub use error::ServerError;
pub use state::{AppState, LocationOptions, DEFAULT_STATE_CODES, LOCATION_FALLBACK_NOTICE};
pub use ui::render_index;

use crate::inference::PredictionService;
use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub stop_words_path: PathBuf,
    /// JSON object whose values are the state codes offered by the form
    pub location_mapping_path: PathBuf,
    /// Endpoint the form posts to
    pub predict_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            model_path: env_path("MODEL_PATH", "models/best_model.bin"),
            stop_words_path: env_path("STOP_WORDS_PATH", "stop_words.json"),
            location_mapping_path: env_path("LOCATION_MAPPING_PATH", "location_renaming_mapping.json"),
            predict_url: std::env::var("PREDICT_URL").unwrap_or_else(|_| "/predict".to_string()),
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Load the artifact and serve until ctrl-c.
///
/// A missing or unreadable artifact is returned as an error before the
/// listener is bound.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let model_path = config.model_path.clone();
    let stop_words_path = config.stop_words_path.clone();
    let service = tokio::task::spawn_blocking(move || PredictionService::load(&model_path, stop_words_path))
        .await?
        .with_context(|| format!("failed to load model from {}", config.model_path.display()))?;

    let state = Arc::new(AppState::new(config.clone(), Arc::new(service)));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        model = %config.model_path.display(),
        started_at = %start_time.to_rfc3339(),
        "Salary predictor server starting"
    );
    info!(url = %format!("http://{}", addr), "Web UI available");
    info!(url = %format!("http://{}/predict", addr), "Prediction endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");

    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        if std::env::var("API_PORT").is_err() {
            assert_eq!(config.port, 8080);
        }
        if std::env::var("PREDICT_URL").is_err() {
            assert_eq!(config.predict_url, "/predict");
        }
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            model_path: dir.path().join("missing.bin"),
            stop_words_path: dir.path().join("stop_words.json"),
            location_mapping_path: dir.path().join("locations.json"),
            predict_url: "/predict".to_string(),
        };
        let err = run_server(config).await.unwrap_err();
        assert!(err.to_string().contains("missing.bin"));
    }
}
