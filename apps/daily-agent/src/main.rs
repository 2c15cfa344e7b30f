mod article;
mod backup;
mod config;
mod history;
mod normalize;
mod notify;
mod pipeline;
mod select;
mod storage;
mod trends;

use llm_client::init_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_logging();

    // Configuration problems are setup errors: stop before any side effect.
    let cfg = config::AgentConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!(mode = ?cfg.trend_mode, history = %cfg.history_path.display(), "Starting ikuji daily agent");

    let outcome = pipeline::run_once(&cfg).await?;

    info!(
        topic = %outcome.topic,
        score = outcome.score,
        source = outcome.source,
        notified = outcome.notified,
        "Run complete"
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
