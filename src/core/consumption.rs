//! Consumption derivation - turns ordered meter readings into bucketed
//! consumption figures for reporting.
//!
//! Two computation policies coexist here on purpose, because different
//! report views historically used different arithmetic:
//!
//! - The **pair-sum** policy walks adjacent reading pairs, silently
//!   discards negative deltas (stale or corrected data), and attributes
//!   each remaining delta to day/month/period/lot buckets. Every bucketed
//!   aggregate in this module uses it.
//! - The **endpoint** policy subtracts the first reading from the last and
//!   nothing else; [`total_consumption`] and [`lot_total_consumption_m3`]
//!   expose it. It applies no negative-discard and can go negative.
//!
//! The two disagree whenever a window contains a decreasing value, and
//! callers must pick one explicitly; merging them would silently change
//! report totals. Derivation is read-only and request-scoped: each call
//! fetches its own readings and folds them into a fresh ledger.

use crate::{
    core::{meter as meter_ops, reading as reading_ops},
    entities::{Lot, Meter, ReadingPeriod, meter, reading},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};
use std::collections::BTreeMap;

/// Reporting unit conversion: counter values are m³, charts show liters.
pub const LITERS_PER_M3: f64 = 1000.0;

/// A closed timestamp range `[start, end]` bounding which readings
/// participate in an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    /// Builds a window, rejecting one that ends before it starts.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The window covering the trailing `days` calendar days up to `now`:
    /// starts at midnight `days - 1` days back, ends at `now`. This is the
    /// dashboard's "last 30 days" shape.
    #[must_use]
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Self {
        let start_date = (now - Duration::days(i64::from(days.saturating_sub(1)))).date_naive();
        Self {
            start: start_date.and_time(NaiveTime::MIN).and_utc(),
            end: now,
        }
    }

    /// Inclusive start of the window.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Inclusive end of the window.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The calendar dates the window touches, in order.
    fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end_date = self.end.date_naive();
        self.start
            .date_naive()
            .iter_days()
            .take_while(move |d| *d <= end_date)
    }
}

/// Month bucket key: calendar year and month (1-12).
pub type MonthKey = (i32, u32);

/// Consumption of one calendar day, in liters.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyConsumption {
    /// The day
    pub date: NaiveDate,
    /// Liters attributed to the day (0 when nothing was consumed)
    pub liters: f64,
}

/// Consumption of one month of a sparse series, in liters.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeriesPoint {
    /// Calendar year
    pub year: i32,
    /// Calendar month (1-12)
    pub month: u32,
    /// Liters attributed to the month
    pub liters: f64,
}

/// Consumption of one month of a fixed January-December series, in liters.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyConsumption {
    /// Calendar month (1-12)
    pub month: u32,
    /// Liters attributed to the month
    pub liters: f64,
}

/// Morning/afternoon split of a window's consumption, in liters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    /// Liters attributed to morning readings
    pub morning_liters: f64,
    /// Liters attributed to afternoon readings
    pub afternoon_liters: f64,
}

/// One lot's total consumption over a window, in liters.
#[derive(Debug, Clone, PartialEq)]
pub struct LotConsumption {
    /// The lot's code
    pub lot_code: String,
    /// Liters consumed by the lot's meters
    pub liters: f64,
}

/// Request-scoped accumulator for the pair-sum policy.
///
/// A ledger is created per derivation, fed one meter's ordered readings at
/// a time, and read out through its accessors; nothing is shared between
/// requests. Buckets are ordered maps so every accessor iterates in sorted
/// key order regardless of absorption order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionLedger {
    window: Window,
    daily_liters: BTreeMap<NaiveDate, f64>,
    monthly_liters: BTreeMap<MonthKey, f64>,
    period_liters: PeriodTotals,
    lot_liters: BTreeMap<String, f64>,
    total_liters: f64,
}

impl ConsumptionLedger {
    /// Creates an empty ledger with one zero day bucket per calendar day of
    /// the window, so sparse data still renders a continuous day axis.
    #[must_use]
    pub fn new(window: &Window) -> Self {
        let daily_liters = window.dates().map(|d| (d, 0.0)).collect();
        Self {
            window: *window,
            daily_liters,
            monthly_liters: BTreeMap::new(),
            period_liters: PeriodTotals::default(),
            lot_liters: BTreeMap::new(),
            total_liters: 0.0,
        }
    }

    /// Folds one meter's readings into the ledger.
    ///
    /// `readings` must be ascending by timestamp and already restricted to
    /// the window. For each adjacent pair the delta is attributed to the
    /// later reading's day, month, and period, and to the given lot. A
    /// negative delta is presumed stale or corrected data and is discarded
    /// without error - the write path is the real guard against decreasing
    /// counters. Empty and singleton sequences contribute nothing.
    pub fn absorb(&mut self, lot_code: &str, readings: &[reading::Model]) {
        for pair in readings.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let delta_m3 = curr.value_m3 - prev.value_m3;
            if delta_m3 < 0.0 {
                continue;
            }

            let liters = delta_m3 * LITERS_PER_M3;

            let day = curr.taken_at.date_naive();
            if let Some(bucket) = self.daily_liters.get_mut(&day) {
                *bucket += liters;
            }

            let month = (curr.taken_at.year(), curr.taken_at.month());
            *self.monthly_liters.entry(month).or_insert(0.0) += liters;

            match curr.period {
                ReadingPeriod::Morning => self.period_liters.morning_liters += liters,
                ReadingPeriod::Afternoon => self.period_liters.afternoon_liters += liters,
            }

            *self.lot_liters.entry(lot_code.to_string()).or_insert(0.0) += liters;
            self.total_liters += liters;
        }
    }

    /// Dense day series: one entry per calendar day of the window, in date
    /// order, zero-filled.
    #[must_use]
    pub fn daily_series(&self) -> Vec<DailyConsumption> {
        self.daily_liters
            .iter()
            .map(|(date, liters)| DailyConsumption {
                date: *date,
                liters: *liters,
            })
            .collect()
    }

    /// Sparse month series: only months that received consumption, sorted
    /// by year then month.
    #[must_use]
    pub fn monthly_series(&self) -> Vec<MonthlySeriesPoint> {
        self.monthly_liters
            .iter()
            .map(|((year, month), liters)| MonthlySeriesPoint {
                year: *year,
                month: *month,
                liters: *liters,
            })
            .collect()
    }

    /// Liters attributed to one month bucket; 0 when the bucket is empty.
    #[must_use]
    pub fn month_liters(&self, year: i32, month: u32) -> f64 {
        self.monthly_liters.get(&(year, month)).copied().unwrap_or(0.0)
    }

    /// The window this ledger was built for.
    #[must_use]
    pub const fn window(&self) -> Window {
        self.window
    }

    /// Morning/afternoon split across the whole window.
    #[must_use]
    pub const fn period_totals(&self) -> PeriodTotals {
        self.period_liters
    }

    /// Lots ranked descending by consumption, at most `n` entries, lots
    /// with zero or negative totals excluded. Ties keep lot-code order.
    #[must_use]
    pub fn lot_ranking(&self, n: usize) -> Vec<LotConsumption> {
        let mut ranking: Vec<LotConsumption> = self
            .lot_liters
            .iter()
            .filter(|(_, liters)| **liters > 0.0)
            .map(|(lot_code, liters)| LotConsumption {
                lot_code: lot_code.clone(),
                liters: *liters,
            })
            .collect();

        ranking.sort_by(|a, b| {
            b.liters
                .partial_cmp(&a.liters)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranking.truncate(n);
        ranking
    }

    /// Grand total across all absorbed meters, in liters.
    #[must_use]
    pub const fn total_liters(&self) -> f64 {
        self.total_liters
    }
}

/// Which meters a derivation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One meter, looked up by id (active or not - the caller named it)
    Meter(i64),
    /// The active meters of one lot
    Lot(i64),
    /// Every active meter of the condominium
    Condominium,
}

/// Resolves a scope to `(lot_code, meter)` pairs.
async fn scope_meters(
    db: &DatabaseConnection,
    scope: Scope,
) -> Result<Vec<(String, meter::Model)>> {
    match scope {
        Scope::Meter(meter_id) => {
            let meter = meter_ops::get_meter_by_id(db, meter_id)
                .await?
                .ok_or_else(|| Error::MeterNotFound {
                    meter: meter_id.to_string(),
                })?;
            let lot = crate::core::lot::get_lot_by_id(db, meter.lot_id)
                .await?
                .ok_or_else(|| Error::LotNotFound {
                    lot: meter.lot_id.to_string(),
                })?;
            Ok(vec![(lot.code, meter)])
        }
        Scope::Lot(lot_id) => {
            let lot = crate::core::lot::get_lot_by_id(db, lot_id)
                .await?
                .ok_or_else(|| Error::LotNotFound {
                    lot: lot_id.to_string(),
                })?;
            let meters = meter_ops::get_meters_for_lot(db, lot_id).await?;
            Ok(meters.into_iter().map(|m| (lot.code.clone(), m)).collect())
        }
        Scope::Condominium => {
            let meters = Meter::find()
                .filter(meter::Column::Active.eq(true))
                .find_also_related(Lot)
                .order_by_asc(meter::Column::Serial)
                .all(db)
                .await?;
            Ok(meters
                .into_iter()
                .filter_map(|(m, lot)| lot.map(|l| (l.code, m)))
                .collect())
        }
    }
}

/// Derives a full [`ConsumptionLedger`] for a scope over a window: fetches
/// each meter's ordered readings and folds them with the pair-sum policy.
/// Runs in time linear in the total number of readings.
pub async fn derive_consumption(
    db: &DatabaseConnection,
    scope: Scope,
    window: &Window,
) -> Result<ConsumptionLedger> {
    let meters = scope_meters(db, scope).await?;
    let mut ledger = ConsumptionLedger::new(window);

    for (lot_code, meter) in &meters {
        let readings = reading_ops::get_readings_in_window(db, meter.id, window).await?;
        ledger.absorb(lot_code, &readings);
    }

    Ok(ledger)
}

/// Dense per-day consumption over a window: one entry per calendar day,
/// zero-filled, in date order.
pub async fn daily_consumption(
    db: &DatabaseConnection,
    scope: Scope,
    window: &Window,
) -> Result<Vec<DailyConsumption>> {
    Ok(derive_consumption(db, scope, window).await?.daily_series())
}

/// Morning/afternoon consumption split over a window.
pub async fn period_totals(
    db: &DatabaseConnection,
    scope: Scope,
    window: &Window,
) -> Result<PeriodTotals> {
    Ok(derive_consumption(db, scope, window).await?.period_totals())
}

/// Per-month consumption for one calendar year: exactly 12 entries.
///
/// Months that have not started relative to `now` are always zero - their
/// readings are never even fetched, so future-dated rows cannot leak in.
/// The current month is truncated to `now`, not projected to month end.
pub async fn monthly_consumption(
    db: &DatabaseConnection,
    scope: Scope,
    year: i32,
    now: DateTime<Utc>,
) -> Result<Vec<MonthlyConsumption>> {
    let year_start = first_instant_of(year, 1)?;
    let next_year_start = first_instant_of(year + 1, 1)?;

    let zeros = || {
        (1..=12)
            .map(|month| MonthlyConsumption { month, liters: 0.0 })
            .collect()
    };

    if now < year_start {
        return Ok(zeros());
    }

    let effective_end = now.min(next_year_start);
    let window = Window::new(year_start, effective_end)?;
    let ledger = derive_consumption(db, scope, &window).await?;

    Ok((1..=12)
        .map(|month| MonthlyConsumption {
            month,
            liters: ledger.month_liters(year, month),
        })
        .collect())
}

/// Lots ranked descending by consumption over a window; at most `n`
/// entries, zero-total lots excluded.
pub async fn top_lots(
    db: &DatabaseConnection,
    window: &Window,
    n: usize,
) -> Result<Vec<LotConsumption>> {
    Ok(derive_consumption(db, Scope::Condominium, window)
        .await?
        .lot_ranking(n))
}

/// Coarse endpoint-subtraction consumption of one meter over a window, in
/// liters: `last - first` when at least two readings exist, else 0.
///
/// No negative-discard applies; on a window containing a decreasing value
/// this deliberately disagrees with the pair-sum aggregates and can be
/// negative.
pub async fn total_consumption(
    db: &DatabaseConnection,
    meter_id: i64,
    window: &Window,
) -> Result<f64> {
    let readings = reading_ops::get_readings_in_window(db, meter_id, window).await?;

    match (readings.first(), readings.last()) {
        (Some(first), Some(last)) if readings.len() >= 2 => {
            Ok((last.value_m3 - first.value_m3) * LITERS_PER_M3)
        }
        _ => Ok(0.0),
    }
}

/// Endpoint-subtraction consumption of one lot over a window, in m³:
/// the sum of [`total_consumption`]'s figure across the lot's active
/// meters. Mirrors the lot-total API payload, which reports m³.
pub async fn lot_total_consumption_m3(
    db: &DatabaseConnection,
    lot_id: i64,
    window: &Window,
) -> Result<f64> {
    let meters = scope_meters(db, Scope::Lot(lot_id)).await?;

    let mut total = 0.0;
    for (_, meter) in &meters {
        total += total_consumption(db, meter.id, window).await? / LITERS_PER_M3;
    }

    Ok(total)
}

/// First instant (midnight UTC) of a calendar month.
fn first_instant_of(year: i32, month: u32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| Error::Config {
            message: format!("invalid calendar month {year}-{month:02}"),
        })
}

/// First and last calendar day of a month, for month-shaped report windows.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = first_instant_of(year, month)?.date_naive();
    let next = if month == 12 {
        first_instant_of(year + 1, 1)?
    } else {
        first_instant_of(year, month + 1)?
    };
    Ok((start, next.date_naive() - Duration::days(1)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    async fn reading_at(
        db: &DatabaseConnection,
        meter_id: i64,
        value_m3: f64,
        y: i32,
        mo: u32,
        d: u32,
        h: u32,
        period: ReadingPeriod,
    ) -> Result<()> {
        create_test_reading(db, meter_id, value_m3, utc_at(y, mo, d, h, 0), period).await?;
        Ok(())
    }

    #[test]
    fn test_window_rejects_end_before_start() {
        let start = utc_at(2025, 6, 10, 0, 0);
        let end = utc_at(2025, 6, 1, 0, 0);

        let result = Window::new(start, end);
        assert!(matches!(result, Err(Error::InvalidWindow { .. })));

        // A zero-length window is fine
        assert!(Window::new(start, start).is_ok());
    }

    #[test]
    fn test_trailing_days_starts_at_midnight() {
        let now = utc_at(2025, 6, 30, 15, 30);
        let window = Window::trailing_days(now, 30);

        assert_eq!(window.start(), utc_at(2025, 6, 1, 0, 0));
        assert_eq!(window.end(), now);
    }

    #[tokio::test]
    async fn test_single_reading_contributes_nothing() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;
        reading_at(&db, meter.id, 100.0, 2025, 6, 10, 8, ReadingPeriod::Morning).await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;

        let daily = daily_consumption(&db, Scope::Meter(meter.id), &window).await?;
        assert!(daily.iter().all(|d| d.liters == 0.0));

        assert_eq!(total_consumption(&db, meter.id, &window).await?, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_same_day_morning_afternoon_pair() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;
        reading_at(&db, meter.id, 100.0, 2025, 6, 10, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, meter.id, 105.5, 2025, 6, 10, 16, ReadingPeriod::Afternoon).await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;

        // Endpoint subtraction: 5.5 m³ = 5500 L
        assert_eq!(total_consumption(&db, meter.id, &window).await?, 5500.0);

        // The delta is attributed to the later reading's period
        let totals = period_totals(&db, Scope::Meter(meter.id), &window).await?;
        assert_eq!(totals.morning_liters, 0.0);
        assert_eq!(totals.afternoon_liters, 5500.0);

        // And to the later reading's day
        let daily = daily_consumption(&db, Scope::Meter(meter.id), &window).await?;
        let day = daily
            .iter()
            .find(|d| d.date == NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
            .unwrap();
        assert_eq!(day.liters, 5500.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_policies_diverge_on_decreasing_sequence() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;

        // 100 -> 105 -> 95: decreasing data that slipped past the write
        // guard (inserted directly, bypassing create_reading)
        insert_reading_unchecked(
            &db,
            meter.id,
            100.0,
            utc_at(2025, 6, 1, 8, 0),
            ReadingPeriod::Morning,
        )
        .await?;
        insert_reading_unchecked(
            &db,
            meter.id,
            105.0,
            utc_at(2025, 6, 2, 8, 0),
            ReadingPeriod::Morning,
        )
        .await?;
        insert_reading_unchecked(
            &db,
            meter.id,
            95.0,
            utc_at(2025, 6, 3, 8, 0),
            ReadingPeriod::Morning,
        )
        .await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;

        // Pair-sum policy: the 105 -> 95 delta is discarded, leaving 5 m³
        let ledger = derive_consumption(&db, Scope::Meter(meter.id), &window).await?;
        assert_eq!(ledger.total_liters(), 5000.0);

        // Endpoint policy: 95 - 100 = -5 m³. The two variants are NOT
        // required to agree; this divergence is a pinned property.
        assert_eq!(total_consumption(&db, meter.id, &window).await?, -5000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_daily_series_is_dense_and_zero_filled() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;

        let now = utc_at(2025, 6, 30, 12, 0);
        let window = Window::trailing_days(now, 30);

        // No readings at all: exactly 30 zero entries, none omitted
        let daily = daily_consumption(&db, Scope::Meter(meter.id), &window).await?;
        assert_eq!(daily.len(), 30);
        assert!(daily.iter().all(|d| d.liters == 0.0));
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(
            daily[29].date,
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_daily_series_accumulates_sparse_pairs() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;
        reading_at(&db, meter.id, 100.0, 2025, 6, 5, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, meter.id, 102.0, 2025, 6, 5, 16, ReadingPeriod::Afternoon).await?;
        reading_at(&db, meter.id, 110.0, 2025, 6, 12, 8, ReadingPeriod::Morning).await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 59))?;
        let daily = daily_consumption(&db, Scope::Meter(meter.id), &window).await?;

        let by_date: std::collections::HashMap<NaiveDate, f64> =
            daily.iter().map(|d| (d.date, d.liters)).collect();

        // Same-day pair lands on June 5; the multi-day gap lands on June 12
        assert_eq!(
            by_date[&NaiveDate::from_ymd_opt(2025, 6, 5).unwrap()],
            2000.0
        );
        assert_eq!(
            by_date[&NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()],
            8000.0
        );
        assert_eq!(daily.len(), 30);

        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_consumption_truncates_at_now() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;

        // Consumption in March and June
        reading_at(&db, meter.id, 100.0, 2025, 3, 10, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, meter.id, 104.0, 2025, 3, 20, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, meter.id, 110.0, 2025, 6, 10, 8, ReadingPeriod::Morning).await?;

        // Future-dated rows must never populate later months
        insert_reading_unchecked(
            &db,
            meter.id,
            200.0,
            utc_at(2025, 9, 1, 8, 0),
            ReadingPeriod::Morning,
        )
        .await?;

        let now = utc_at(2025, 6, 15, 12, 0);
        let months = monthly_consumption(&db, Scope::Meter(meter.id), 2025, now).await?;

        assert_eq!(months.len(), 12);
        assert_eq!(months[2].month, 3);
        assert_eq!(months[2].liters, 4000.0);
        // June gets the March -> June gap attributed to the later reading
        assert_eq!(months[5].month, 6);
        assert_eq!(months[5].liters, 6000.0);
        // July through December are forced to zero
        for m in &months[6..] {
            assert_eq!(m.liters, 0.0);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_consumption_year_not_started() -> Result<()> {
        let (db, _lot, meter) = setup_with_meter().await?;
        let now = utc_at(2025, 6, 15, 12, 0);

        let months = monthly_consumption(&db, Scope::Meter(meter.id), 2026, now).await?;
        assert_eq!(months.len(), 12);
        assert!(months.iter().all(|m| m.liters == 0.0));

        Ok(())
    }

    #[tokio::test]
    async fn test_top_lots_ranks_and_caps() -> Result<()> {
        let db = setup_test_db().await?;

        // Three lots with consumption, one without, one with stale data only
        for (code, start, end) in [
            ("A-01", 100.0, 103.0),
            ("B-02", 50.0, 58.0),
            ("C-03", 10.0, 11.0),
        ] {
            let lot = create_test_lot(&db, code).await?;
            let m = create_test_meter(&db, lot.id, &format!("WM-{code}")).await?;
            reading_at(&db, m.id, start, 2025, 6, 10, 8, ReadingPeriod::Morning).await?;
            reading_at(&db, m.id, end, 2025, 6, 10, 16, ReadingPeriod::Afternoon).await?;
        }

        let idle_lot = create_test_lot(&db, "D-04").await?;
        create_test_meter(&db, idle_lot.id, "WM-D-04").await?;

        let stale_lot = create_test_lot(&db, "E-05").await?;
        let stale_meter = create_test_meter(&db, stale_lot.id, "WM-E-05").await?;
        insert_reading_unchecked(
            &db,
            stale_meter.id,
            100.0,
            utc_at(2025, 6, 10, 8, 0),
            ReadingPeriod::Morning,
        )
        .await?;
        insert_reading_unchecked(
            &db,
            stale_meter.id,
            90.0,
            utc_at(2025, 6, 10, 16, 0),
            ReadingPeriod::Afternoon,
        )
        .await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;
        let ranking = top_lots(&db, &window, 10).await?;

        // Descending, no zero-total or stale-only lots, capped at n
        let codes: Vec<&str> = ranking.iter().map(|l| l.lot_code.as_str()).collect();
        assert_eq!(codes, vec!["B-02", "A-01", "C-03"]);
        assert_eq!(ranking[0].liters, 8000.0);
        assert!(ranking.iter().all(|l| l.liters > 0.0));

        let top_two = top_lots(&db, &window, 2).await?;
        assert_eq!(top_two.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_lot_total_sums_meters_endpoint_wise() -> Result<()> {
        let db = setup_test_db().await?;
        let lot = create_test_lot(&db, "A-01").await?;
        let m1 = create_test_meter(&db, lot.id, "WM-0001").await?;
        let m2 = create_test_meter(&db, lot.id, "WM-0002").await?;

        reading_at(&db, m1.id, 100.0, 2025, 6, 1, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, m1.id, 104.0, 2025, 6, 20, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, m2.id, 50.0, 2025, 6, 1, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, m2.id, 51.5, 2025, 6, 20, 8, ReadingPeriod::Morning).await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;
        assert_eq!(lot_total_consumption_m3(&db, lot.id, &window).await?, 5.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_scope_lot_ignores_other_lots() -> Result<()> {
        let db = setup_test_db().await?;
        let lot_a = create_test_lot(&db, "A-01").await?;
        let lot_b = create_test_lot(&db, "B-02").await?;
        let m_a = create_test_meter(&db, lot_a.id, "WM-A").await?;
        let m_b = create_test_meter(&db, lot_b.id, "WM-B").await?;

        reading_at(&db, m_a.id, 100.0, 2025, 6, 1, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, m_a.id, 101.0, 2025, 6, 2, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, m_b.id, 50.0, 2025, 6, 1, 8, ReadingPeriod::Morning).await?;
        reading_at(&db, m_b.id, 57.0, 2025, 6, 2, 8, ReadingPeriod::Morning).await?;

        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;

        let ledger = derive_consumption(&db, Scope::Lot(lot_a.id), &window).await?;
        assert_eq!(ledger.total_liters(), 1000.0);

        let all = derive_consumption(&db, Scope::Condominium, &window).await?;
        assert_eq!(all.total_liters(), 8000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_scope_targets() -> Result<()> {
        let db = setup_test_db().await?;
        let window = Window::new(utc_at(2025, 6, 1, 0, 0), utc_at(2025, 6, 30, 23, 0))?;

        let result = derive_consumption(&db, Scope::Meter(9999), &window).await;
        assert!(matches!(result, Err(Error::MeterNotFound { .. })));

        let result = derive_consumption(&db, Scope::Lot(9999), &window).await;
        assert!(matches!(result, Err(Error::LotNotFound { .. })));

        Ok(())
    }

    #[test]
    fn test_month_bounds() -> Result<()> {
        let (start, end) = month_bounds(2025, 6)?;
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());

        let (start, end) = month_bounds(2024, 2)?;
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (start, end) = month_bounds(2025, 12)?;
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        Ok(())
    }
}
