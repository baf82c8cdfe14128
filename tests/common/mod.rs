//! Shared fixtures: a deterministic postings CSV, a stop-word file and a
//! small search configuration that trains in well under a second.

#![allow(dead_code)]

use salary_predictor::embedding::EmbedderKind;
use salary_predictor::optimizer::SearchSpace;
use salary_predictor::training::{CachePolicy, TrainingConfig, TrainingDriver, TrainingOutcome};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

pub const STATES: [&str; 5] = ["CA", "NY", "TX", "WA", "FL"];

const TITLES: [(&str, f64); 5] = [
    ("Data Analyst", 70_000.0),
    ("Software Engineer", 120_000.0),
    ("Registered Nurse", 85_000.0),
    ("Sales Associate", 40_000.0),
    ("Director of Engineering", 180_000.0),
];

const DESCRIPTIONS: [&str; 4] = [
    "Analyze data and create reports for the business",
    "Build and maintain backend services in a fast paced team",
    "Provide patient care and coordinate with physicians",
    "Help customers on the floor and manage inventory",
];

pub const STOP_WORDS: [&str; 12] = [
    "and", "the", "for", "in", "a", "of", "on", "with", "to", "is", "an", "at",
];

/// Rows are a pure function of their index, so the file is byte-identical
/// across runs.
pub fn postings_csv(n_rows: usize) -> String {
    let mut csv = String::from(
        "target,state,remote_allowed,work_type_CONTRACT,work_type_FULL_TIME,work_type_PART_TIME,company_name,title,description\n",
    );
    for i in 0..n_rows {
        let (title, base) = TITLES[i % TITLES.len()];
        let state = STATES[(i / 2) % STATES.len()];
        let remote = (i % 3 == 0) as u8;
        let work = i % 7;
        let (contract, full, part) = match work {
            0 => (1, 0, 0),
            1 => (0, 0, 1),
            _ => (0, 1, 0),
        };
        let state_bonus = match state {
            "CA" | "NY" => 15_000.0,
            "WA" => 10_000.0,
            _ => 0.0,
        };
        let part_penalty = if part == 1 { 0.5 } else { 1.0 };
        let jitter = ((i * 37) % 11) as f64 * 500.0;
        let target = (base + state_bonus + remote as f64 * 5_000.0) * part_penalty + jitter;

        // a few rows exercise the missing-text placeholder
        let company = if i % 13 == 5 { String::new() } else { format!("Company {}", i % 9) };
        let description = if i % 17 == 3 { "" } else { DESCRIPTIONS[i % DESCRIPTIONS.len()] };

        let _ = writeln!(
            csv,
            "{target},{state},{remote},{contract},{full},{part},{company},{title},{description}"
        );
    }
    csv
}

pub fn write_postings_csv(path: &Path, n_rows: usize) {
    std::fs::write(path, postings_csv(n_rows)).unwrap();
}

pub fn write_stop_words(path: &Path) {
    std::fs::write(path, serde_json::to_string(&STOP_WORDS).unwrap()).unwrap();
}

pub fn small_search_space() -> SearchSpace {
    SearchSpace::new()
        .int("n_components", 4, 8)
        .log_float("learning_rate", 0.05, 0.3)
        .int("max_iter", 10, 20)
        .int("max_leaf_nodes", 4, 8)
        .int("min_samples_leaf", 3, 6)
}

/// Dataset and stop words written into `dir`, outputs pointed at `dir`.
pub fn small_config(dir: &Path) -> TrainingConfig {
    let data = dir.join("postings.csv");
    let stop_words = dir.join("stop_words.json");
    write_postings_csv(&data, 120);
    write_stop_words(&stop_words);

    TrainingConfig::new()
        .with_dataset_path(data)
        .with_model_path(dir.join("models").join("best_model.bin"))
        .with_score_path(dir.join("out").join("score.txt"))
        .with_stop_words_path(stop_words)
        .with_search_space(small_search_space())
        .with_embedder(EmbedderKind::Hashing { dimension: 32 })
        .with_n_iter(3)
        .with_cv_folds(3)
        .with_random_state(42)
}

pub struct TrainedModel {
    _dir: TempDir,
    pub config: TrainingConfig,
}

impl TrainedModel {
    pub fn model_path(&self) -> &Path {
        &self.config.model_path
    }

    pub fn stop_words_path(&self) -> PathBuf {
        self.config.stop_words_path.clone()
    }
}

/// One model trained per test binary and shared read-only.
pub fn trained_model() -> &'static TrainedModel {
    static MODEL: OnceLock<TrainedModel> = OnceLock::new();
    MODEL.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let outcome = TrainingDriver::new(config.clone())
            .run(CachePolicy::Overwrite)
            .unwrap();
        assert!(matches!(outcome, TrainingOutcome::Trained(_)));
        TrainedModel { _dir: dir, config }
    })
}
