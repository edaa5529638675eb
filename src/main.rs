//! Console entry point: bootstraps the database, seeds the configured
//! lots, and prints the dashboard and the trailing-30-days report.

use chrono::Utc;
use dotenvy::dotenv;
use meterbook::{config, core, errors::Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Non-fatal, env vars can be set externally

    // 3. Initialize database
    let db = config::database::create_connection().await?;
    config::database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 4. Seed lots and meters from config.toml, if one is present
    match config::lots::load_default_config() {
        Ok(lot_config) => {
            let outcome = config::lots::seed_lots(&db, &lot_config).await?;
            info!(
                lots_created = outcome.lots_created,
                meters_created = outcome.meters_created,
                "Seeded initial lots."
            );
        }
        Err(e) => warn!("No usable config.toml, skipping lot seeding: {e}"),
    }

    // 5. Print the dashboard and the condominium report
    let now = Utc::now();
    let summary = core::report::dashboard_summary(&db, now.date_naive()).await?;
    println!("{}", core::report::format_dashboard_summary(&summary));

    let report = core::report::condominium_report(&db, now, 30).await?;
    println!("{}", core::report::format_condominium_report(&report));

    Ok(())
}
