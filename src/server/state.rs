//! Application state

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::inference::PredictionService;

use super::{ui, ServerConfig};

/// Offered when the location mapping file is missing
pub const DEFAULT_STATE_CODES: [&str; 10] =
    ["CA", "NY", "TX", "FL", "IL", "WA", "MA", "CO", "GA", "NC"];

pub const LOCATION_FALLBACK_NOTICE: &str =
    "Location mapping file not found. Using default state codes.";

/// State codes shown in the form's dropdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOptions {
    pub codes: Vec<String>,
    /// Set when the defaults are in use
    pub notice: Option<String>,
}

impl LocationOptions {
    pub fn defaults() -> Self {
        Self {
            codes: DEFAULT_STATE_CODES.iter().map(|s| s.to_string()).collect(),
            notice: Some(LOCATION_FALLBACK_NOTICE.to_string()),
        }
    }

    /// Sorted unique values of a `{"location name": "CODE"}` JSON object,
    /// falling back to [`DEFAULT_STATE_CODES`] when the file cannot be used.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Location mapping unavailable, using defaults");
                return Self::defaults();
            }
        };

        match serde_json::from_str::<std::collections::HashMap<String, String>>(&text) {
            Ok(mapping) if !mapping.is_empty() => {
                let codes: BTreeSet<String> = mapping.into_values().collect();
                tracing::info!(path = %path.display(), states = codes.len(), "Loaded location mapping");
                Self {
                    codes: codes.into_iter().collect(),
                    notice: None,
                }
            }
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Location mapping is empty, using defaults");
                Self::defaults()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Location mapping is not valid JSON, using defaults");
                Self::defaults()
            }
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub service: Arc<PredictionService>,
    pub locations: LocationOptions,
    /// Form page, rendered once at start-up
    pub index_html: String,
}

impl AppState {
    pub fn new(config: ServerConfig, service: Arc<PredictionService>) -> Self {
        let locations = LocationOptions::load(&config.location_mapping_path);
        let index_html = ui::render_index(&locations, &config.predict_url);
        Self {
            config,
            service,
            locations,
            index_html,
        }
    }
}
