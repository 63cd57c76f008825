//! `era5-tmax`: download ERA5-Land daily maximum temperature as GeoTIFFs.
//!
//! Exits 0 when every requested month succeeded and 1 otherwise.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tmax_common::MonthRange;
use tracing::{info, warn};

use tmax_downloader::cli::Args;
use tmax_downloader::logging::init_logging;
use tmax_downloader::{CdsClient, CdsCredentials, Config, MonthFetcher, OutputLayout, PeriodRunner};

fn main() -> Result<ExitCode> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let _guard = init_logging(&args.log_level, args.log_format, &config.logging)?;
    if args.config.is_none() {
        warn!("No config file provided, using default configuration");
    }

    let range = args.resolve_range(&config.period)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    runtime.block_on(run(config, range))
}

async fn run(config: Config, range: MonthRange) -> Result<ExitCode> {
    let layout = OutputLayout::new(&config.paths.base_dir);
    layout.ensure_dirs().with_context(|| {
        format!(
            "Failed to create output directories under {}",
            layout.base_dir().display()
        )
    })?;

    netcdf_parser::silence_hdf5_errors();

    let credentials = CdsCredentials::discover().context("Failed to initialize CDS client")?;
    let client =
        CdsClient::new(credentials, &config.archive).context("Failed to initialize CDS client")?;
    info!("CDS client initialized successfully");

    let fetcher = MonthFetcher::new(client, layout, config.area, config.archive.dataset.clone());
    let runner = PeriodRunner::new(fetcher, config.delay());

    let summary = runner.run(range).await;
    info!("Process completed");

    Ok(if summary.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
