//! Randomized hyperparameter search with K-fold cross-validation
//!
//! Candidates are sampled up front from a seeded RNG, scored in parallel by
//! mean negative RMSE over unshuffled folds, and the winner is refit on the
//! whole training partition.

use super::search_space::{ParameterValue, SearchSpace, TrialParams};
use crate::error::{PredictorError, Result};
use crate::pipeline::FeaturePipeline;
use crate::preprocessing::PcaConfig;
use crate::record::FeatureFrame;
use crate::training::cross_validation::{CVSplit, KFold};
use crate::training::metrics::root_mean_squared_error;
use crate::training::{HgbrConfig, HistGradientBoostingRegressor};
use ndarray::{Array1, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Typed view of one sampled configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub n_components: usize,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub max_leaf_nodes: usize,
    pub min_samples_leaf: usize,
}

impl PipelineParams {
    pub fn from_trial(params: &TrialParams) -> Result<Self> {
        fn get<'a>(params: &'a TrialParams, name: &str) -> Result<&'a ParameterValue> {
            params.get(name).ok_or_else(|| PredictorError::InvalidParameter {
                name: name.to_string(),
                value: "<missing>".to_string(),
                reason: "not in the search space".to_string(),
            })
        }
        fn count(params: &TrialParams, name: &str) -> Result<usize> {
            let value = get(params, name)?;
            value
                .as_int()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| PredictorError::InvalidParameter {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: "expected a non-negative integer".to_string(),
                })
        }

        Ok(Self {
            n_components: count(params, "n_components")?,
            learning_rate: get(params, "learning_rate")?.as_float(),
            max_iter: count(params, "max_iter")?,
            max_leaf_nodes: count(params, "max_leaf_nodes")?,
            min_samples_leaf: count(params, "min_samples_leaf")?,
        })
    }

    pub fn build_pipeline(&self) -> FeaturePipeline {
        let model = HistGradientBoostingRegressor::new(HgbrConfig {
            learning_rate: self.learning_rate,
            max_iter: self.max_iter,
            max_leaf_nodes: self.max_leaf_nodes,
            min_samples_leaf: self.min_samples_leaf,
            ..Default::default()
        });
        FeaturePipeline::new(
            PcaConfig {
                n_components: self.n_components,
            },
            model,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Candidates to sample
    pub n_iter: usize,
    pub cv_folds: usize,
    pub random_state: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_iter: 100,
            cv_folds: 10,
            random_state: 42,
        }
    }
}

/// Result of a single candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: usize,
    pub params: TrialParams,
    /// Mean negative RMSE; `-inf` when the candidate failed
    pub value: f64,
    pub fold_scores: Vec<f64>,
    pub duration_secs: f64,
    pub error: Option<String>,
}

impl TrialResult {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// All candidates of one search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
    pub trials: Vec<TrialResult>,
    pub best_trial_idx: Option<usize>,
    pub total_duration_secs: f64,
}

impl Study {
    /// Best = highest score among successful trials, earliest on ties
    pub fn from_trials(trials: Vec<TrialResult>, total_duration_secs: f64) -> Self {
        let mut best: Option<usize> = None;
        for (idx, trial) in trials.iter().enumerate() {
            if trial.failed() {
                continue;
            }
            if best.map_or(true, |b| trial.value > trials[b].value) {
                best = Some(idx);
            }
        }
        Self {
            trials,
            best_trial_idx: best,
            total_duration_secs,
        }
    }

    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.best_trial_idx.map(|idx| &self.trials[idx])
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_trial().map(|t| t.value)
    }

    pub fn n_failed(&self) -> usize {
        self.trials.iter().filter(|t| t.failed()).count()
    }
}

/// Winner of a search, refit on all training rows
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub study: Study,
    pub best_params: PipelineParams,
    pub best_score: f64,
    pub pipeline: FeaturePipeline,
}

pub struct RandomizedSearch {
    space: SearchSpace,
    config: SearchConfig,
}

impl RandomizedSearch {
    pub fn new(space: SearchSpace, config: SearchConfig) -> Self {
        Self { space, config }
    }

    pub fn sample_candidates(&self) -> Vec<TrialParams> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        (0..self.config.n_iter).map(|_| self.space.sample(&mut rng)).collect()
    }

    /// Score every candidate without refitting
    pub fn run(&self, frame: &FeatureFrame, y: &Array1<f64>) -> Result<Study> {
        self.space.validate()?;
        if self.config.n_iter == 0 {
            return Err(PredictorError::InvalidParameter {
                name: "n_iter".to_string(),
                value: "0".to_string(),
                reason: "must sample at least one candidate".to_string(),
            });
        }
        let splits = KFold::new(self.config.cv_folds).split(frame.n_rows())?;
        let candidates = self.sample_candidates();
        let start = Instant::now();

        tracing::info!(
            n_candidates = candidates.len(),
            cv_folds = self.config.cv_folds,
            n_samples = frame.n_rows(),
            "Starting randomized search"
        );

        let trials: Vec<TrialResult> = candidates
            .into_par_iter()
            .enumerate()
            .map(|(trial_id, params)| {
                let trial_start = Instant::now();
                let (value, fold_scores, error) = match evaluate(&params, frame, y, &splits) {
                    Ok(scores) => {
                        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                        (mean, scores, None)
                    }
                    Err(e) => (f64::NEG_INFINITY, Vec::new(), Some(e.to_string())),
                };
                let trial = TrialResult {
                    trial_id,
                    params,
                    value,
                    fold_scores,
                    duration_secs: trial_start.elapsed().as_secs_f64(),
                    error,
                };
                match &trial.error {
                    None => tracing::info!(trial = trial_id, score = trial.value, "Candidate scored"),
                    Some(e) => tracing::warn!(trial = trial_id, error = %e, "Candidate failed"),
                }
                trial
            })
            .collect();

        let study = Study::from_trials(trials, start.elapsed().as_secs_f64());
        if study.best_trial_idx.is_none() {
            return Err(PredictorError::TrainingError(format!(
                "all {} search candidates failed",
                study.trials.len()
            )));
        }
        Ok(study)
    }

    /// Search, then refit the best configuration on every row of `frame`
    pub fn fit(&self, frame: &FeatureFrame, y: &Array1<f64>) -> Result<SearchOutcome> {
        let study = self.run(frame, y)?;
        let best = study
            .best_trial()
            .ok_or_else(|| PredictorError::TrainingError("search produced no candidate".into()))?;
        let best_params = PipelineParams::from_trial(&best.params)?;
        let best_score = best.value;

        tracing::info!(
            trial = best.trial_id,
            score = best_score,
            params = ?best_params,
            "Refitting best candidate"
        );

        let mut pipeline = best_params.build_pipeline();
        pipeline.fit(frame, y)?;

        Ok(SearchOutcome {
            study,
            best_params,
            best_score,
            pipeline,
        })
    }
}

/// Negative RMSE per fold
fn evaluate(
    params: &TrialParams,
    frame: &FeatureFrame,
    y: &Array1<f64>,
    splits: &[CVSplit],
) -> Result<Vec<f64>> {
    let params = PipelineParams::from_trial(params)?;
    splits
        .iter()
        .map(|split| -> Result<f64> {
            let train = frame.select_rows(&split.train_indices);
            let test = frame.select_rows(&split.test_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let y_test = y.select(Axis(0), &split.test_indices);

            let mut pipeline = params.build_pipeline();
            pipeline.fit(&train, &y_train)?;
            let preds = pipeline.predict(&test)?;
            Ok(-root_mean_squared_error(&y_test, &preds)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn frame(n: usize) -> (FeatureFrame, Array1<f64>) {
        let states = ["CA", "NY", "TX", "WA"];
        let numeric = Array2::from_shape_fn((n, 6), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y = Array1::from_iter((0..n).map(|i| 100.0 * ((i * 3) % 17) as f64 + (i % 4) as f64));
        let frame = FeatureFrame::new(
            "state",
            (0..n).map(|i| states[i % 4].to_string()).collect(),
            (0..6).map(|i| i.to_string()).collect(),
            numeric,
        )
        .unwrap();
        (frame, y)
    }

    fn small_space() -> SearchSpace {
        SearchSpace::new()
            .int("n_components", 3, 6)
            .log_float("learning_rate", 0.05, 0.5)
            .int("max_iter", 5, 10)
            .int("max_leaf_nodes", 4, 8)
            .int("min_samples_leaf", 2, 5)
    }

    #[test]
    fn test_search_picks_best_and_refits() {
        let (frame, y) = frame(60);
        let search = RandomizedSearch::new(
            small_space(),
            SearchConfig { n_iter: 4, cv_folds: 3, random_state: 42 },
        );
        let outcome = search.fit(&frame, &y).unwrap();

        assert_eq!(outcome.study.trials.len(), 4);
        let best = outcome.study.best_value().unwrap();
        assert!(outcome.study.trials.iter().all(|t| t.value <= best));
        assert_eq!(outcome.study.best_trial().unwrap().fold_scores.len(), 3);
        assert!(best <= 0.0);
        assert!(outcome.pipeline.is_fitted());
        assert_eq!(outcome.pipeline.predict(&frame).unwrap().len(), 60);
    }

    #[test]
    fn test_candidates_are_seeded() {
        let config = SearchConfig { n_iter: 5, cv_folds: 2, random_state: 9 };
        let a = RandomizedSearch::new(small_space(), config.clone()).sample_candidates();
        let b = RandomizedSearch::new(small_space(), config).sample_candidates();
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_failed_candidates_is_an_error() {
        let (frame, y) = frame(20);
        // min_samples_leaf of 0 is rejected by the regressor
        let space = SearchSpace::new()
            .int("n_components", 2, 3)
            .log_float("learning_rate", 0.05, 0.5)
            .int("max_iter", 2, 3)
            .int("max_leaf_nodes", 4, 5)
            .int("min_samples_leaf", 0, 0);
        let search = RandomizedSearch::new(space, SearchConfig { n_iter: 2, cv_folds: 2, random_state: 1 });
        assert!(matches!(search.run(&frame, &y), Err(PredictorError::TrainingError(_))));
    }

    #[test]
    fn test_ties_go_to_earliest_trial() {
        let trial = |id, value| TrialResult {
            trial_id: id,
            params: TrialParams::new(),
            value,
            fold_scores: vec![value],
            duration_secs: 0.0,
            error: None,
        };
        let mut failed = trial(0, f64::NEG_INFINITY);
        failed.error = Some("boom".into());
        let study = Study::from_trials(vec![failed, trial(1, -2.0), trial(2, -1.0), trial(3, -1.0)], 0.0);
        assert_eq!(study.best_trial_idx, Some(2));
        assert_eq!(study.n_failed(), 1);
    }
}
