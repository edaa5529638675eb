//! Meter business logic - Handles all meter-related operations.
//!
//! Provides functions for installing, retrieving, and decommissioning
//! meters, plus the per-meter convenience figures the listing screens show:
//! today's consumption and trailing-window statistics.

use crate::{
    entities::{Meter, Reading, meter, reading},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Creates a new meter at a lot.
///
/// The serial is trimmed and must be non-empty and unique; the owning lot
/// must exist. A meter belongs to exactly one lot for its lifetime.
pub async fn create_meter(
    db: &DatabaseConnection,
    serial: String,
    lot_id: i64,
    installed_on: NaiveDate,
    location: Option<String>,
    notes: Option<String>,
) -> Result<meter::Model> {
    let serial = serial.trim().to_string();
    if serial.is_empty() {
        return Err(Error::Config {
            message: "Meter serial cannot be empty".to_string(),
        });
    }

    if get_meter_by_serial(db, &serial).await?.is_some() {
        return Err(Error::DuplicateMeterSerial { serial });
    }

    crate::core::lot::get_lot_by_id(db, lot_id)
        .await?
        .ok_or_else(|| Error::LotNotFound {
            lot: lot_id.to_string(),
        })?;

    let now = Utc::now();
    let meter = meter::ActiveModel {
        serial: Set(serial),
        lot_id: Set(lot_id),
        location: Set(location),
        installed_on: Set(installed_on),
        active: Set(true),
        notes: Set(notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = meter.insert(db).await?;
    Ok(result)
}

/// Finds a meter by its unique serial, active or not.
pub async fn get_meter_by_serial(
    db: &DatabaseConnection,
    serial: &str,
) -> Result<Option<meter::Model>> {
    Meter::find()
        .filter(meter::Column::Serial.eq(serial))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a meter by its unique ID.
pub async fn get_meter_by_id(
    db: &DatabaseConnection,
    meter_id: i64,
) -> Result<Option<meter::Model>> {
    Meter::find_by_id(meter_id).one(db).await.map_err(Into::into)
}

/// Retrieves all active meters, ordered by serial.
pub async fn get_active_meters(db: &DatabaseConnection) -> Result<Vec<meter::Model>> {
    Meter::find()
        .filter(meter::Column::Active.eq(true))
        .order_by_asc(meter::Column::Serial)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the active meters installed at a lot, ordered by serial.
pub async fn get_meters_for_lot(
    db: &DatabaseConnection,
    lot_id: i64,
) -> Result<Vec<meter::Model>> {
    Meter::find()
        .filter(meter::Column::LotId.eq(lot_id))
        .filter(meter::Column::Active.eq(true))
        .order_by_asc(meter::Column::Serial)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-disables a meter. Its readings are preserved but the meter no
/// longer participates in listings or reports.
pub async fn deactivate_meter(db: &DatabaseConnection, meter_id: i64) -> Result<meter::Model> {
    let meter = get_meter_by_id(db, meter_id)
        .await?
        .ok_or_else(|| Error::MeterNotFound {
            meter: meter_id.to_string(),
        })?;

    let mut active_model: meter::ActiveModel = meter.into();
    active_model.active = Set(false);
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await.map_err(Into::into)
}

/// Returns the meter's consumption for a single calendar day in m³:
/// the difference between the day's last and first readings, or 0 when
/// the day holds fewer than two readings.
pub async fn consumption_on_day(
    db: &DatabaseConnection,
    meter_id: i64,
    day: NaiveDate,
) -> Result<f64> {
    let day_start = day.and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start + Duration::days(1);

    let readings = Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .filter(reading::Column::TakenAt.gte(day_start))
        .filter(reading::Column::TakenAt.lt(day_end))
        .order_by_asc(reading::Column::TakenAt)
        .all(db)
        .await?;

    match (readings.first(), readings.last()) {
        (Some(first), Some(last)) if readings.len() >= 2 => Ok(last.value_m3 - first.value_m3),
        _ => Ok(0.0),
    }
}

/// Liters variant of [`consumption_on_day`].
pub async fn consumption_on_day_liters(
    db: &DatabaseConnection,
    meter_id: i64,
    day: NaiveDate,
) -> Result<f64> {
    Ok(consumption_on_day(db, meter_id, day).await? * 1000.0)
}

/// Trailing-window consumption statistics for one meter.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterStatistics {
    /// Number of readings inside the window
    pub reading_count: u64,
    /// Last reading minus first reading, in m³
    pub total_m3: f64,
    /// Total spread evenly over the window length, in m³/day
    pub mean_m3_per_day: f64,
    /// First counter value in the window
    pub first_value_m3: f64,
    /// Last counter value in the window
    pub last_value_m3: f64,
}

/// Computes endpoint statistics over the trailing `days` before `now`.
///
/// Returns `None` when the window holds no readings. The total is the
/// coarse endpoint subtraction, not a pair-sum; see
/// [`crate::core::consumption`] for the difference between the two.
pub async fn meter_statistics(
    db: &DatabaseConnection,
    meter_id: i64,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Option<MeterStatistics>> {
    let window_start = now - Duration::days(days);

    let readings = Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .filter(reading::Column::TakenAt.gte(window_start))
        .order_by_asc(reading::Column::TakenAt)
        .all(db)
        .await?;

    let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
        return Ok(None);
    };

    let total_m3 = last.value_m3 - first.value_m3;
    // Cast safety: window lengths are small day counts, far below f64's
    // exact integer range.
    #[allow(clippy::cast_precision_loss)]
    let mean_m3_per_day = if days > 0 {
        total_m3 / days as f64
    } else {
        0.0
    };

    Ok(Some(MeterStatistics {
        reading_count: readings.len() as u64,
        total_m3,
        mean_m3_per_day,
        first_value_m3: first.value_m3,
        last_value_m3: last.value_m3,
    }))
}
