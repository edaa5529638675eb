//! Reading business logic - the data-entry write path and reading queries.
//!
//! `create_reading` is the write-path validator: it enforces the value
//! bounds, the cumulative-counter invariant (a new reading must not be
//! lower than the meter's latest recorded value), and the one-reading-per
//! period-slot rule, all inside a database transaction. Batch ingestion
//! validates each item independently; successes stand even when later
//! items fail.

use crate::{
    core::consumption::Window,
    entities::{Meter, Reading, ReadingPeriod, meter, reading},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Upper bound of a counter value: 5 integer digits plus 3 fractional.
pub const MAX_READING_M3: f64 = 99_999.999;

/// Input for creating one reading.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    /// Meter the reading belongs to
    pub meter_id: i64,
    /// Counter value in m³
    pub value_m3: f64,
    /// When the reading was taken
    pub taken_at: DateTime<Utc>,
    /// Period of day
    pub period: ReadingPeriod,
    /// Name of the person who took the reading
    pub recorded_by: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Reference to a photo of the meter display
    pub photo_path: Option<String>,
}

/// Creates a new reading after validating it against the meter's history.
///
/// Rejections:
/// - value not finite or outside [0, [`MAX_READING_M3`]] → `ReadingOutOfRange`
/// - value strictly below the meter's latest reading (by timestamp, across
///   both periods) → `DecreasingReading` quoting the conflicting value;
///   an equal value is accepted
/// - an existing reading in the same `(meter, taken_at, period)` slot →
///   `DuplicateReadingSlot`
pub async fn create_reading(db: &DatabaseConnection, new: NewReading) -> Result<reading::Model> {
    if !new.value_m3.is_finite() || new.value_m3 < 0.0 || new.value_m3 > MAX_READING_M3 {
        return Err(Error::ReadingOutOfRange {
            value: new.value_m3,
        });
    }

    // Use a transaction so the check-then-insert is consistent
    let txn = db.begin().await?;

    let meter = Meter::find_by_id(new.meter_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::MeterNotFound {
            meter: new.meter_id.to_string(),
        })?;

    let latest = Reading::find()
        .filter(reading::Column::MeterId.eq(new.meter_id))
        .order_by_desc(reading::Column::TakenAt)
        .one(&txn)
        .await?;

    if let Some(latest) = &latest {
        if new.value_m3 < latest.value_m3 {
            return Err(Error::DecreasingReading {
                attempted: new.value_m3,
                latest: latest.value_m3,
            });
        }
    }

    let slot_taken = Reading::find()
        .filter(reading::Column::MeterId.eq(new.meter_id))
        .filter(reading::Column::TakenAt.eq(new.taken_at))
        .filter(reading::Column::Period.eq(new.period))
        .one(&txn)
        .await?
        .is_some();
    if slot_taken {
        return Err(Error::DuplicateReadingSlot {
            serial: meter.serial,
            taken_at: new.taken_at,
            period: new.period.to_string(),
        });
    }

    let now = Utc::now();
    let model = reading::ActiveModel {
        meter_id: Set(new.meter_id),
        value_m3: Set(new.value_m3),
        taken_at: Set(new.taken_at),
        period: Set(new.period),
        recorded_by: Set(new.recorded_by),
        notes: Set(new.notes),
        photo_path: Set(new.photo_path),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = model.insert(&txn).await?;
    txn.commit().await?;

    Ok(result)
}

/// One rejected item of a batch, with the index it had in the submitted
/// list and the reason it was refused.
#[derive(Debug)]
pub struct BatchRejection {
    /// Position of the item in the submitted batch
    pub index: usize,
    /// Why the item was rejected
    pub error: Error,
}

/// Outcome of a batch ingestion: both sides are reported.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Readings that were created
    pub created: Vec<reading::Model>,
    /// Items that were rejected, in submission order
    pub rejected: Vec<BatchRejection>,
}

/// Creates multiple readings in one call.
///
/// Each item is validated and inserted independently: a rejected item does
/// not roll back earlier successes and does not block later items. The
/// outcome reports both sides so the caller can show a per-row result.
pub async fn create_readings_batch(
    db: &DatabaseConnection,
    items: Vec<NewReading>,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();

    for (index, item) in items.into_iter().enumerate() {
        match create_reading(db, item).await {
            Ok(model) => outcome.created.push(model),
            Err(error) => outcome.rejected.push(BatchRejection { index, error }),
        }
    }

    info!(
        created = outcome.created.len(),
        rejected = outcome.rejected.len(),
        "processed reading batch"
    );

    Ok(outcome)
}

/// Retrieves one meter's readings inside a window, ascending by timestamp.
///
/// This is the ordered projection the consumption deriver folds over.
pub async fn get_readings_in_window(
    db: &DatabaseConnection,
    meter_id: i64,
    window: &Window,
) -> Result<Vec<reading::Model>> {
    Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .filter(reading::Column::TakenAt.gte(window.start()))
        .filter(reading::Column::TakenAt.lte(window.end()))
        .order_by_asc(reading::Column::TakenAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the most recent reading of a meter across both periods, if any.
pub async fn get_latest_reading(
    db: &DatabaseConnection,
    meter_id: i64,
) -> Result<Option<reading::Model>> {
    Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .order_by_desc(reading::Column::TakenAt)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Latest reading of one meter, annotated for listing screens.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestReading {
    /// Serial of the meter
    pub meter_serial: String,
    /// Code of the lot the meter belongs to
    pub lot_code: String,
    /// Counter value in m³
    pub value_m3: f64,
    /// When the reading was taken
    pub taken_at: DateTime<Utc>,
    /// Period of day
    pub period: ReadingPeriod,
}

/// Returns the latest reading of every active meter, ordered by serial.
/// Meters with no readings yet are omitted.
pub async fn latest_readings(db: &DatabaseConnection) -> Result<Vec<LatestReading>> {
    let meters = Meter::find()
        .filter(meter::Column::Active.eq(true))
        .find_also_related(crate::entities::Lot)
        .order_by_asc(meter::Column::Serial)
        .all(db)
        .await?;

    let mut result = Vec::new();
    for (meter, lot) in meters {
        let Some(lot) = lot else { continue };
        if let Some(latest) = get_latest_reading(db, meter.id).await? {
            result.push(LatestReading {
                meter_serial: meter.serial,
                lot_code: lot.code,
                value_m3: latest.value_m3,
                taken_at: latest.taken_at,
                period: latest.period,
            });
        }
    }

    Ok(result)
}

/// Raw difference in m³ between a reading and the chronologically previous
/// reading of the same meter; 0 when no predecessor exists.
///
/// This is a per-row display figure, not an aggregate input, so it stays
/// signed: stale data shows up as a negative delta here even though the
/// aggregates discard it.
pub async fn consumption_since_previous(
    db: &DatabaseConnection,
    reading: &reading::Model,
) -> Result<f64> {
    let previous = Reading::find()
        .filter(reading::Column::MeterId.eq(reading.meter_id))
        .filter(reading::Column::TakenAt.lt(reading.taken_at))
        .order_by_desc(reading::Column::TakenAt)
        .one(db)
        .await?;

    Ok(previous.map_or(0.0, |prev| reading.value_m3 - prev.value_m3))
}

/// Administrative bulk delete: removes all readings of one meter and
/// returns how many rows went away.
pub async fn delete_readings_for_meter(db: &DatabaseConnection, meter_id: i64) -> Result<u64> {
    let result = Reading::delete_many()
        .filter(reading::Column::MeterId.eq(meter_id))
        .exec(db)
        .await?;

    info!(
        meter_id,
        deleted = result.rows_affected,
        "bulk-deleted readings"
    );

    Ok(result.rows_affected)
}
