use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod db;
mod models;
mod services;
mod utils;

use config::{ChartConfig, StoreConfig};
use services::chart_service::ChartComposer;
use services::price_service::PriceSeriesLoader;
use services::spike_service;
use utils::ChartError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spike_kline=info")),
        )
        .with_target(false)
        .init();

    let args = match cli::Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args).await {
        Ok(path) => {
            info!("Chart saved to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e @ ChartError::NotFound { .. }) => {
            warn!("{}, nothing to visualize", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load, align and render one chart
async fn run(args: &cli::Args) -> Result<PathBuf, ChartError> {
    let store_config = StoreConfig::from_env()?;
    let chart_config = ChartConfig::from_env()?;
    let destination = chart_config.output_path(&args.symbol);

    let loader = PriceSeriesLoader::new(store_config);

    info!("Fetching {} candles for {}...", args.limit, args.symbol);
    let series = loader.load(&args.symbol, args.limit).await?;
    info!("Fetched {} records for {}", series.len(), series.symbol());
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        info!("Date range: {} to {}", first.timestamp, last.timestamp);
    }

    let events = loader.load_spikes(&args.symbol).await?;
    let markers = spike_service::align(&series, &events);
    info!("{} of {} spike events fall on a loaded candle", markers.marked_count(), events.len());

    info!("Generating candlestick chart...");
    ChartComposer::new(chart_config).compose(&series, &markers, &args.symbol, &destination)
}
