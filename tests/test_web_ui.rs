//! Integration test: the job-details form

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::trained_model;
use salary_predictor::inference::PredictionService;
use salary_predictor::server::{create_router, AppState, ServerConfig, LOCATION_FALLBACK_NOTICE};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with_locations(location_mapping_path: PathBuf, predict_url: &str) -> axum::Router {
    let model = trained_model();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        model_path: model.model_path().to_path_buf(),
        stop_words_path: model.stop_words_path(),
        location_mapping_path,
        predict_url: predict_url.to_string(),
    };
    let service = PredictionService::load(model.model_path(), model.stop_words_path()).unwrap();
    create_router(Arc::new(AppState::new(config, Arc::new(service))))
}

async fn get_index(app: axum::Router) -> String {
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_form_has_every_request_field() {
    let dir = tempfile::tempdir().unwrap();
    let html = get_index(app_with_locations(dir.path().join("absent.json"), "/predict")).await;

    assert!(html.contains("Salary Prediction Tool"));
    for field in [
        r#"name="title""#,
        r#"name="company_name""#,
        r#"name="state""#,
        r#"name="remote_allowed""#,
        r#"name="work_type""#,
        r#"name="description""#,
    ] {
        assert!(html.contains(field), "missing {field}");
    }
    for option in ["Full Time", "Part Time", "Contract"] {
        assert!(html.contains(option));
    }
}

#[tokio::test]
async fn test_missing_mapping_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let html = get_index(app_with_locations(dir.path().join("absent.json"), "/predict")).await;

    assert!(html.contains(LOCATION_FALLBACK_NOTICE));
    for code in ["CA", "NY", "TX", "FL", "IL", "WA", "MA", "CO", "GA", "NC"] {
        assert!(html.contains(&format!(r#"value="{code}""#)), "missing {code}");
    }
}

#[tokio::test]
async fn test_mapping_populates_dropdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("location_renaming_mapping.json");
    std::fs::write(
        &path,
        r#"{"Seattle, WA": "WA", "Boston, MA": "MA", "Bellevue, WA": "WA"}"#,
    )
    .unwrap();

    let html = get_index(app_with_locations(path, "/predict")).await;
    assert!(!html.contains(LOCATION_FALLBACK_NOTICE));
    assert!(html.contains(r#"<option value="MA">MA</option>"#));
    assert!(html.contains(r#"<option value="WA">WA</option>"#));
    assert!(!html.contains(r#"value="NC""#));

    let ma = html.find(r#"value="MA""#).unwrap();
    let wa = html.find(r#"value="WA""#).unwrap();
    assert!(ma < wa);
}

#[tokio::test]
async fn test_form_posts_to_configured_url() {
    let dir = tempfile::tempdir().unwrap();
    let html = get_index(app_with_locations(
        dir.path().join("absent.json"),
        "https://salary.example.com/predict",
    ))
    .await;

    assert!(html.contains(r#"const PREDICT_URL = "https://salary.example.com/predict";"#));
    assert!(html.contains("'API Error: ' + response.status"));
    assert!(html.contains("'Request failed: ' + err"));
}
