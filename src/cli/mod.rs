//! Salary predictor CLI
//!
//! `train` fits and persists the pipeline, `serve` runs the HTTP service,
//! `predict` scores one request file offline and `check` posts the example
//! request to a running server.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::embedding::EmbedderKind;
use crate::inference::PredictionService;
use crate::record::{PredictionRequest, PredictionResponse};
use crate::training::{CachePolicy, TrainingConfig, TrainingDriver, TrainingOutcome};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "salary-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, serve and query a job-posting salary model")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the pipeline and write the model artifact and error report
    Train(TrainArgs),

    /// Serve predictions and the job-details form over HTTP
    Serve(ServeArgs),

    /// Predict the salary for a JSON request file
    Predict {
        /// Trained model artifact
        #[arg(short, long, env = "MODEL_PATH", default_value = "models/best_model.bin")]
        model: PathBuf,

        /// JSON file holding one prediction request
        #[arg(short, long)]
        request: PathBuf,

        /// Stop-word list used by the text normalizer
        #[arg(long, env = "STOP_WORDS_PATH", default_value = "stop_words.json")]
        stop_words: PathBuf,
    },

    /// Post the example request to a running server
    Check {
        #[arg(short, long, default_value = "http://127.0.0.1:8080/predict")]
        url: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Training CSV with a `target` column
    #[arg(short, long, env = "DATASET_PATH", default_value = "data/postings.csv")]
    pub data: PathBuf,

    /// Where the fitted pipeline is written
    #[arg(long, env = "MODEL_PATH", default_value = "models/best_model.bin")]
    pub model_out: PathBuf,

    /// Where the in/out-of-sample error report is written
    #[arg(long, env = "SCORE_PATH", default_value = "out/score.txt")]
    pub score_out: PathBuf,

    /// Stop-word list used by the text normalizer
    #[arg(long, env = "STOP_WORDS_PATH", default_value = "stop_words.json")]
    pub stop_words: PathBuf,

    /// Target column name
    #[arg(short, long, default_value = "target")]
    pub target: String,

    /// Number of sampled search candidates
    #[arg(long, default_value = "100")]
    pub n_iter: usize,

    /// Number of cross-validation folds
    #[arg(long, default_value = "10")]
    pub cv_folds: usize,

    /// Seed for the train/test split and the search
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Text embedder (hashing, minilm); defaults to minilm when compiled in
    #[arg(long)]
    pub embedder: Option<EmbedderKind>,

    /// Retrain even if the artifact exists
    #[arg(long, conflicts_with = "if_changed")]
    pub force: bool,

    /// Retrain only if the dataset changed since the artifact was written
    #[arg(long)]
    pub if_changed: bool,
}

impl TrainArgs {
    pub fn cache_policy(&self) -> CachePolicy {
        if self.force {
            CachePolicy::Overwrite
        } else if self.if_changed {
            CachePolicy::SkipIfUnchanged
        } else {
            CachePolicy::SkipIfExists
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        let mut config = TrainingConfig::new()
            .with_dataset_path(&self.data)
            .with_model_path(&self.model_out)
            .with_score_path(&self.score_out)
            .with_stop_words_path(&self.stop_words)
            .with_target_column(&self.target)
            .with_n_iter(self.n_iter)
            .with_cv_folds(self.cv_folds)
            .with_random_state(self.seed);
        if let Some(embedder) = &self.embedder {
            config = config.with_embedder(embedder.clone());
        }
        config
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "API_PORT", default_value = "8080")]
    pub port: u16,

    /// Trained model artifact
    #[arg(short, long, env = "MODEL_PATH", default_value = "models/best_model.bin")]
    pub model: PathBuf,

    /// Stop-word list, read on the first prediction
    #[arg(long, env = "STOP_WORDS_PATH", default_value = "stop_words.json")]
    pub stop_words: PathBuf,

    /// JSON mapping whose values populate the form's state dropdown
    #[arg(long, env = "LOCATION_MAPPING_PATH", default_value = "location_renaming_mapping.json")]
    pub locations: PathBuf,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    section("Train");

    let config = args.training_config();
    println!("  {:<16} {}", muted("Dataset"), config.dataset_path.display().to_string().white());
    println!("  {:<16} {}", muted("Embedder"), config.embedder.to_string().white());
    println!(
        "  {:<16} {}",
        muted("Search"),
        format!("{} candidates × {} folds", config.n_iter, config.cv_folds).white()
    );
    println!();

    step_run("Training");
    let start = Instant::now();
    let outcome = TrainingDriver::new(config.clone()).run(args.cache_policy())?;

    match outcome {
        TrainingOutcome::Skipped { reason } => {
            println!("{} {}", "skipped".yellow(), dim(&reason));
            println!("  {}", dim("pass --force to retrain or --if-changed to compare the dataset"));
        }
        TrainingOutcome::Trained(report) => {
            step_done(&format!("{:?}", start.elapsed()));
            println!();
            println!("  {:<16} {}", muted("Train RMSE"), format!("{:.4}", report.train_rmse).white().bold());
            println!("  {:<16} {}", muted("Test RMSE"), format!("{:.4}", report.test_rmse).white().bold());
            println!("  {:<16} {}", muted("Test MAE"), format!("{:.4}", report.test_mae).white());
            println!("  {:<16} {}", muted("Test R²"), format!("{:.4}", report.test_r2).white());
            println!("  {:<16} {}", muted("CV score"), format!("{:.4}", report.cv_score).white());
            println!(
                "  {:<16} {}",
                muted("Best params"),
                format!(
                    "n_components={} lr={:.4} max_iter={} leaves={} min_leaf={}",
                    report.best_params.n_components,
                    report.best_params.learning_rate,
                    report.best_params.max_iter,
                    report.best_params.max_leaf_nodes,
                    report.best_params.min_samples_leaf
                )
                .white()
            );
            if report.n_failed > 0 {
                println!("  {:<16} {}", muted("Failed"), report.n_failed.to_string().yellow());
            }
            println!("  {:<16} {}", muted("Model"), config.model_path.display().to_string().white());
            println!("  {:<16} {}", muted("Report"), config.score_path.display().to_string().white());
        }
    }
    println!();
    Ok(())
}

pub fn cmd_predict(model: &Path, request: &Path, stop_words: &Path) -> anyhow::Result<()> {
    section("Predict");

    let text = std::fs::read_to_string(request)?;
    let request: PredictionRequest = serde_json::from_str(&text)?;

    step_run("Loading model");
    let start = Instant::now();
    let service = PredictionService::load(model, stop_words)?;
    step_done(&format!("{:?}", start.elapsed()));

    let salary = service.predict(request)?;
    println!();
    println!("  {:<16} {}", muted("Predicted salary"), format!("${:.2}", salary).white().bold());
    println!();
    println!("{}", serde_json::to_string(&PredictionResponse { salary })?);
    Ok(())
}

pub async fn cmd_serve(args: &ServeArgs) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Salary Predictor".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Web UI ", &format!("http://{}:{}", args.host, args.port)));
    line_box(&kv("Predict", &format!("http://{}:{}/predict", args.host, args.port)));
    line_box(&kv("Health ", &format!("http://{}:{}/health", args.host, args.port)));
    line_box(&kv("Model  ", &args.model.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
        model_path: args.model.clone(),
        stop_words_path: args.stop_words.clone(),
        location_mapping_path: args.locations.clone(),
        ..Default::default()
    };
    run_server(config).await
}

pub async fn cmd_check(url: &str) -> anyhow::Result<()> {
    section("Check");

    let request = PredictionRequest::example();
    step_run(&format!("POST {}", url));
    let start = Instant::now();
    let response = reqwest::Client::new().post(url).json(&request).send().await?;
    let status = response.status();

    if !status.is_success() {
        println!("{}", "failed".red());
        println!("  {}", format!("API Error: {}", status).red());
        anyhow::bail!("server answered {}", status);
    }

    let body: PredictionResponse = response.json().await?;
    step_done(&format!("{} in {:?}", status, start.elapsed()));
    println!();
    println!("  {:<16} {}", muted("Salary"), format!("${:.2}", body.salary).white().bold());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_train_flags_select_cache_policy() {
        let cli = Cli::try_parse_from(["salary-predictor", "train", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Train(args)) => assert_eq!(args.cache_policy(), CachePolicy::Overwrite),
            _ => panic!("expected train"),
        }

        let cli = Cli::try_parse_from(["salary-predictor", "train", "--if-changed"]).unwrap();
        match cli.command {
            Some(Commands::Train(args)) => {
                assert_eq!(args.cache_policy(), CachePolicy::SkipIfUnchanged)
            }
            _ => panic!("expected train"),
        }

        assert!(Cli::try_parse_from(["salary-predictor", "train", "--force", "--if-changed"]).is_err());
    }

    #[test]
    fn test_train_embedder_flag() {
        let cli = Cli::try_parse_from([
            "salary-predictor", "train", "--embedder", "hashing", "--n-iter", "5", "--seed", "7",
        ])
        .unwrap();
        let Some(Commands::Train(args)) = cli.command else {
            panic!("expected train");
        };
        let config = args.training_config();
        assert_eq!(config.embedder, EmbedderKind::Hashing { dimension: 384 });
        assert_eq!(config.n_iter, 5);
        assert_eq!(config.random_state, 7);
    }

    #[test]
    fn test_strip_ansi() {
        let colored = "\x1b[1mbold\x1b[0m";
        assert_eq!(strip_ansi(colored), "bold");
    }
}
