//! Salary predictor entry point

use clap::Parser;
use salary_predictor::cli::{cmd_check, cmd_predict, cmd_serve, cmd_train, Cli, Commands};
use salary_predictor::server::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salary_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train(args)) => {
            // CPU-bound; keep it off the async workers
            tokio::task::spawn_blocking(move || cmd_train(&args)).await??;
        }
        Some(Commands::Serve(args)) => {
            cmd_serve(&args).await?;
        }
        Some(Commands::Predict { model, request, stop_words }) => {
            tokio::task::spawn_blocking(move || cmd_predict(&model, &request, &stop_words)).await??;
        }
        Some(Commands::Check { url }) => {
            cmd_check(&url).await?;
        }
        None => {
            // Default: serve with env/default settings
            run_server(ServerConfig::default()).await?;
        }
    }

    Ok(())
}
