//! Pricecast server
//!
//! Serves the HTTP API and, unless `SCHEDULER_ENABLED=false`, runs the
//! prediction scheduler alongside it.

use dotenvy::dotenv;
use pricecast::config::AppConfig;
use pricecast::core::http::start_server;
use pricecast::core::runtime::PredictionService;
use pricecast::logging;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = AppConfig::from_env()?;
    logging::init_logging(&config);
    println!("Starting Pricecast server");
    println!("  Environment: {}", config.environment);
    println!("  HTTP Server: http://0.0.0.0:{}", config.port);
    println!("  Coins: {}", config.coins.codes().join(", "));
    println!("  Models: {}", config.models_dir.display());

    let service = Arc::new(PredictionService::from_config(&config).await?);

    if config.scheduler_enabled {
        service.start().await;
    } else {
        println!("  Scheduler: disabled (set SCHEDULER_ENABLED=true to enable)");
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_service = service.clone();
    let port = config.port;
    let mut server_handle = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = start_server(server_service, port, shutdown).await {
            error!(error = %e, "HTTP server error");
        }
    });

    let interrupted = tokio::select! {
        _ = signal::ctrl_c() => true,
        _ = &mut server_handle => false,
    };
    if interrupted {
        info!("Shutting down...");
        let _ = shutdown_tx.send(());
        let _ = server_handle.await;
    } else {
        error!("HTTP server stopped");
    }

    service.stop().await;
    Ok(())
}
