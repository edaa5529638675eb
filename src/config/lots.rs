//! Lot and meter configuration loading from config.toml.
//!
//! A condominium's physical layout changes rarely, so the initial set of
//! lots and their installed meters can be described in a TOML file and
//! seeded into the database on startup. Seeding is idempotent: lots and
//! meters that already exist (by code/serial) are left untouched.

use crate::entities::LotCategory;
use crate::errors::{Error, Result};
use crate::{core, entities};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// List of lot configurations to seed
    pub lots: Vec<LotConfig>,
}

/// Configuration for a single lot
#[derive(Debug, Deserialize, Clone)]
pub struct LotConfig {
    /// Unique lot code
    pub code: String,
    /// Billing category (`residential` or `common_area`)
    pub category: LotCategory,
    /// Street address
    pub address: Option<String>,
    /// Meters installed at this lot
    #[serde(default)]
    pub meters: Vec<MeterConfig>,
}

/// Configuration for a single meter
#[derive(Debug, Deserialize, Clone)]
pub struct MeterConfig {
    /// Unique meter serial
    pub serial: String,
    /// Physical location description
    pub location: Option<String>,
    /// Installation date (YYYY-MM-DD)
    pub installed_on: NaiveDate,
}

/// Summary of what a seeding pass created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Number of lots created by this pass
    pub lots_created: usize,
    /// Number of meters created by this pass
    pub meters_created: usize,
}

/// Loads lot configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads lot configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

/// Seeds the configured lots and meters into the database.
///
/// Existing lots (matched by code) and meters (matched by serial) are
/// skipped, so running this on every startup is safe.
pub async fn seed_lots(db: &DatabaseConnection, config: &Config) -> Result<SeedOutcome> {
    let mut outcome = SeedOutcome::default();

    for lot_config in &config.lots {
        let lot = match core::lot::get_lot_by_code(db, &lot_config.code).await? {
            Some(existing) => existing,
            None => {
                outcome.lots_created += 1;
                core::lot::create_lot(
                    db,
                    lot_config.code.clone(),
                    lot_config.category,
                    lot_config.address.clone(),
                )
                .await?
            }
        };

        for meter_config in &lot_config.meters {
            let existing: Option<entities::MeterModel> =
                core::meter::get_meter_by_serial(db, &meter_config.serial).await?;
            if existing.is_none() {
                core::meter::create_meter(
                    db,
                    meter_config.serial.clone(),
                    lot.id,
                    meter_config.installed_on,
                    meter_config.location.clone(),
                    None,
                )
                .await?;
                outcome.meters_created += 1;
            }
        }
    }

    info!(
        lots_created = outcome.lots_created,
        meters_created = outcome.meters_created,
        "lot seeding complete"
    );

    Ok(outcome)
}
