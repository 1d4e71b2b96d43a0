//! Pricecast worker
//!
//! Runs the prediction scheduler without the HTTP API.

use dotenvy::dotenv;
use pricecast::config::AppConfig;
use pricecast::core::runtime::PredictionService;
use pricecast::logging;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = AppConfig::from_env()?;
    logging::init_logging(&config);
    println!("Starting Pricecast worker");
    println!("  Environment: {}", config.environment);
    println!("  Coins: {}", config.coins.codes().join(", "));

    let service = PredictionService::from_config(&config).await?;
    service.start().await;

    let status = service.scheduler_status().await;
    for job in &status.jobs {
        println!("  • {} (ID: {}, {})", job.name, job.id, job.trigger);
    }

    signal::ctrl_c().await?;
    info!("Shutting down, waiting for running jobs...");
    service.stop().await;
    Ok(())
}
