//! Unified error types and result handling.
//!
//! Domain errors carry the figures callers need to display: the
//! decreasing-reading rejection quotes the conflicting prior value, the
//! out-of-range rejection quotes the offending value, and so on.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// All error conditions the crate can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or validation failed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong
        message: String,
    },

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A lot lookup by id or code found nothing
    #[error("Lot not found: {lot}")]
    LotNotFound {
        /// The id or code that was looked up
        lot: String,
    },

    /// Lot codes are unique; creation with an existing code is rejected
    #[error("A lot with code '{code}' already exists")]
    DuplicateLotCode {
        /// The conflicting code
        code: String,
    },

    /// A meter lookup by id or serial found nothing
    #[error("Meter not found: {meter}")]
    MeterNotFound {
        /// The id or serial that was looked up
        meter: String,
    },

    /// Meter serials are unique; creation with an existing serial is rejected
    #[error("A meter with serial '{serial}' already exists")]
    DuplicateMeterSerial {
        /// The conflicting serial
        serial: String,
    },

    /// Reading values are bounded to [0, 99999.999] m³
    #[error("Reading value {value} m³ is outside the accepted range [0, 99999.999]")]
    ReadingOutOfRange {
        /// The rejected value
        value: f64,
    },

    /// Meters are cumulative counters; a reading below the latest recorded
    /// value is rejected at the write path
    #[error("Reading {attempted} m³ is lower than the latest recorded reading ({latest} m³)")]
    DecreasingReading {
        /// The value the caller tried to record
        attempted: f64,
        /// The meter's most recent prior value
        latest: f64,
    },

    /// At most one reading per meter per period slot at a given instant
    #[error("A {period} reading for meter '{serial}' at {taken_at} already exists")]
    DuplicateReadingSlot {
        /// Serial of the meter
        serial: String,
        /// Timestamp of the conflicting slot
        taken_at: DateTime<Utc>,
        /// Period of the conflicting slot
        period: String,
    },

    /// Aggregation windows must not end before they start
    #[error("Invalid window: end {end} is before start {start}")]
    InvalidWindow {
        /// Window start
        start: DateTime<Utc>,
        /// Window end
        end: DateTime<Utc>,
    },
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
