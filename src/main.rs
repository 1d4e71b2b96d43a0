//! One-shot sweep: predict every coin on every timeframe, print the results,
//! and append them to the configured ledger.

use dotenvy::dotenv;
use pricecast::config::AppConfig;
use pricecast::core::runtime::PredictionService;
use pricecast::logging;
use pricecast::models::{prediction::change_pct, Timeframe, Trend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = AppConfig::from_env()?;
    logging::init_logging(&config);
    let service = PredictionService::from_config(&config).await?;

    println!("{:<6} {:<4} {:>14} {:>14} {:<10} {:>8}", "COIN", "TF", "CURRENT", "PREDICTED", "TREND", "CHANGE");
    for coin in service.coins() {
        for timeframe in Timeframe::ALL {
            match service.run_prediction(&coin, timeframe.as_str()).await {
                Ok(p) => {
                    let trend = Trend::from_prices(p.current_price, p.predicted_price);
                    println!(
                        "{:<6} {:<4} {:>14.2} {:>14.2} {:<10} {:>7.2}%",
                        coin,
                        timeframe,
                        p.current_price,
                        p.predicted_price,
                        trend,
                        change_pct(p.current_price, p.predicted_price)
                    );
                    service
                        .context()
                        .ledger
                        .save(&coin, timeframe.as_str(), p.current_price, p.predicted_price, trend)
                        .await;
                }
                Err(e) => println!("{:<6} {:<4} error: {}", coin, timeframe, e),
            }
        }
    }

    Ok(())
}
