//! Recompute stored rating aggregates for one or more cafes.
//!
//! Repairs `average_rating` and `rating_count` after manual data fixes.
//! Recomputing is idempotent, so the tool is safe to rerun.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use cafehub::CafeEngine;
use cafehub::domain::CafeId;
use cafehub::settings::EngineSettings;
use clap::Parser;
use ortho_config::OrthoConfig as _;
use tokio::runtime::Builder;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `recompute-ratings` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "recompute-ratings",
    about = "Recompute average rating and rating count for the given cafes",
    version
)]
struct CliArgs {
    /// Cafe to recompute; repeat for several cafes.
    #[arg(long = "cafe-id", value_name = "uuid", required = true)]
    cafe_ids: Vec<CafeId>,
    /// Database connection URL. Falls back to `CAFEHUB_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let mut settings = EngineSettings::load_from_iter([OsString::from("recompute-ratings")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    if let Some(url) = args.database_url {
        settings.database_url = Some(url);
    }

    let engine = CafeEngine::connect(&settings)
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let mut failures = 0_usize;
    for cafe_id in &args.cafe_ids {
        match engine.aggregates.recompute_aggregates(cafe_id).await {
            Ok(aggregates) => println!(
                "cafe_id={cafe_id} average_rating={} rating_count={}",
                aggregates.average_rating(),
                aggregates.rating_count()
            ),
            Err(err) => {
                error!(%cafe_id, code = ?err.code(), message = err.message(), "recompute failed");
                failures += 1;
            }
        }
    }
    info!(
        requested = args.cafe_ids.len(),
        failures, "rating recompute finished"
    );

    if failures > 0 {
        return Err(io::Error::other(format!(
            "{failures} of {} cafes failed to recompute",
            args.cafe_ids.len()
        )));
    }
    Ok(())
}
