mod report;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use qldfuel_client::FuelPriceClient;
use qldfuel_core::AppConfig;
use qldfuel_engine::{Coordinator, Scope, Snapshot};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qldfuel-cli")]
#[command(about = "Queensland fuel price lookups from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch once and print the full snapshot as JSON
    Snapshot,
    /// Fetch once and print the cheapest station per configured fuel
    Cheapest {
        /// `global` for all of Queensland, `local` for the configured radius
        #[arg(long, default_value = "local")]
        scope: Scope,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = qldfuel_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let snapshot = fetch_snapshot(&config).await?;
    match cli.command {
        Commands::Snapshot => {
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        }
        Commands::Cheapest { scope } => {
            for line in report::cheapest_table(&snapshot, scope) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

async fn fetch_snapshot(config: &AppConfig) -> anyhow::Result<Arc<Snapshot>> {
    let client = FuelPriceClient::with_base_url(
        &config.subscriber_token,
        config.request_timeout_secs,
        &config.api_base_url,
    )?;
    let coordinator = Coordinator::new(client, config.home, config.settings.clone());
    let snapshot = coordinator.refresh().await?;
    tracing::info!(
        sites = snapshot.sites.len(),
        fuels = snapshot.global_cheapest.len(),
        radius_km = snapshot.settings.radius_km(),
        "fetched price snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests;
