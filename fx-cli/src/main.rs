//! FX CLI
//!
//! Runs one-off range queries against the upstream exchange-rate API,
//! through the same cache and dispatcher the server uses.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, TimeDelta};
use clap::{Parser, Subcommand};

use fx_cache::SeriesCache;
use fx_client::{DEFAULT_BASE_URL, ExchangeRateClient};
use fx_hex::{CancellationToken, Dispatcher, RateService};
use fx_types::domain::utc_midnight;
use fx_types::{DataQuery, TimeRange};

#[derive(Parser)]
#[command(name = "fx")]
#[command(author, version, about = "Exchange-rate time-series CLI", long_about = None)]
struct Cli {
    /// Base URL of the upstream exchange-rate API
    #[arg(long, env = "FX_UPSTREAM_URL", default_value = DEFAULT_BASE_URL)]
    upstream_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch daily rates for one currency pair
    Range {
        /// Base currency code
        #[arg(long, default_value = "USD")]
        base: String,
        /// Quote currency code
        #[arg(long)]
        symbol: String,
        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
    /// Check upstream health
    Health,
}

/// Turns inclusive calendar days into the open instant range queries use.
///
/// `from` must start before the first day's midnight to keep that sample, so
/// after the dispatcher widens it by a day the upstream window starts two
/// days before `from`. The extra day is fetched and filtered out.
fn inclusive_range(from: NaiveDate, to: NaiveDate) -> TimeRange {
    let second = TimeDelta::seconds(1);
    TimeRange::new(utc_midnight(from) - second, utc_midnight(to) + second)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ExchangeRateClient::new(&cli.upstream_url);

    match cli.command {
        Commands::Health => match client.check_health().await {
            Ok(()) => println!("✓ Upstream is healthy"),
            Err(e) => {
                println!("✗ Upstream is not healthy: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Range {
            base,
            symbol,
            from,
            to,
            timeout_secs,
        } => {
            if from > to {
                anyhow::bail!("--from {} is after --to {}", from, to);
            }

            let service = RateService::new(client, Arc::new(SeriesCache::default()));
            let dispatcher = Dispatcher::new(Arc::new(service))
                .with_timeout(Duration::from_secs(timeout_secs));

            let query = DataQuery::for_pair("cli", &base, &symbol, inclusive_range(from, to));
            let mut batch = dispatcher
                .dispatch(vec![query], &CancellationToken::new())
                .await
                .into_inner();

            match batch.remove("cli") {
                Some(Ok(frame)) => println!("{}", serde_json::to_string_pretty(&frame)?),
                Some(Err(e)) => anyhow::bail!("query failed: {}", e),
                None => anyhow::bail!("query timed out after {}s", timeout_secs),
            }
        }
    }

    Ok(())
}
