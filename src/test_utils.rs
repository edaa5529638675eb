//! Shared test utilities for meterbook.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{lot, meter, reading},
    entities::{self, LotCategory, ReadingPeriod},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a UTC timestamp from calendar parts. Panics on invalid input,
/// which is what a test wants.
#[must_use]
pub fn utc_at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

/// Creates a test lot with sensible defaults.
///
/// # Defaults
/// * `category`: residential
/// * `address`: None
pub async fn create_test_lot(db: &DatabaseConnection, code: &str) -> Result<entities::LotModel> {
    lot::create_lot(db, code.to_string(), LotCategory::Residential, None).await
}

/// Creates a test lot with custom parameters.
pub async fn create_custom_lot(
    db: &DatabaseConnection,
    code: &str,
    category: LotCategory,
    address: Option<String>,
) -> Result<entities::LotModel> {
    lot::create_lot(db, code.to_string(), category, address).await
}

/// Creates a test meter with sensible defaults.
///
/// # Defaults
/// * `installed_on`: 2024-01-01
/// * `location`, `notes`: None
pub async fn create_test_meter(
    db: &DatabaseConnection,
    lot_id: i64,
    serial: &str,
) -> Result<entities::MeterModel> {
    meter::create_meter(
        db,
        serial.to_string(),
        lot_id,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        None,
        None,
    )
    .await
}

/// Creates a test reading through the validated write path.
pub async fn create_test_reading(
    db: &DatabaseConnection,
    meter_id: i64,
    value_m3: f64,
    taken_at: DateTime<Utc>,
    period: ReadingPeriod,
) -> Result<entities::ReadingModel> {
    reading::create_reading(
        db,
        reading::NewReading {
            meter_id,
            value_m3,
            taken_at,
            period,
            recorded_by: None,
            notes: None,
            photo_path: None,
        },
    )
    .await
}

/// Inserts a reading directly, bypassing the write-path validator.
///
/// Used to stage the stale/decreasing data the aggregates must tolerate,
/// which `create_reading` would rightly reject.
pub async fn insert_reading_unchecked(
    db: &DatabaseConnection,
    meter_id: i64,
    value_m3: f64,
    taken_at: DateTime<Utc>,
    period: ReadingPeriod,
) -> Result<entities::ReadingModel> {
    let now = Utc::now();
    let model = entities::reading::ActiveModel {
        meter_id: Set(meter_id),
        value_m3: Set(value_m3),
        taken_at: Set(taken_at),
        period: Set(period),
        recorded_by: Set(None),
        notes: Set(None),
        photo_path: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Sets up a complete test environment with a lot and one meter.
/// Returns (db, lot, meter) for common test scenarios.
pub async fn setup_with_meter() -> Result<(
    DatabaseConnection,
    entities::LotModel,
    entities::MeterModel,
)> {
    let db = setup_test_db().await?;
    let lot = create_test_lot(&db, "A-01").await?;
    let meter = create_test_meter(&db, lot.id, "WM-0001").await?;
    Ok((db, lot, meter))
}
