//! Report assembly - structured data for dashboards and chart pages.
//!
//! These functions collect the Consumption Deriver's output into the
//! shapes the presentation layer renders: the landing-page dashboard
//! counters, the condominium-wide trailing-30-days charts, and the
//! per-lot current-month/current-year charts. Each report also has a
//! plain-text formatter for logs and console output.

use crate::{
    core::consumption::{
        self, DailyConsumption, LotConsumption, MonthlyConsumption, MonthlySeriesPoint,
        PeriodTotals, Scope, Window,
    },
    entities::{Lot, LotCategory, Meter, Reading, lot, meter, reading},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{PaginatorTrait, prelude::*};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Number of lots in the condominium-wide consumption ranking.
pub const TOP_LOTS: usize = 10;

/// Landing-page counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Active lots
    pub active_lots: u64,
    /// Active meters
    pub active_meters: u64,
    /// Readings taken on the given day
    pub readings_today: u64,
}

/// Counts active lots, active meters, and readings taken on `today`.
pub async fn dashboard_summary(db: &DatabaseConnection, today: NaiveDate) -> Result<DashboardSummary> {
    let active_lots = Lot::find()
        .filter(lot::Column::Active.eq(true))
        .count(db)
        .await?;

    let active_meters = Meter::find()
        .filter(meter::Column::Active.eq(true))
        .count(db)
        .await?;

    let day_start = today.and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start + Duration::days(1);
    let readings_today = Reading::find()
        .filter(reading::Column::TakenAt.gte(day_start))
        .filter(reading::Column::TakenAt.lt(day_end))
        .count(db)
        .await?;

    Ok(DashboardSummary {
        active_lots,
        active_meters,
        readings_today,
    })
}

/// Condominium-wide consumption charts over a trailing-days window.
#[derive(Debug, Clone, PartialEq)]
pub struct CondominiumReport {
    /// The window the report covers
    pub window: Window,
    /// Dense per-day series, zero-filled
    pub daily: Vec<DailyConsumption>,
    /// Months that received consumption, sorted by year then month
    pub monthly: Vec<MonthlySeriesPoint>,
    /// Morning/afternoon split across the window
    pub periods: PeriodTotals,
    /// Highest-consuming lots, descending
    pub top_lots: Vec<LotConsumption>,
    /// Grand total across the window, in liters
    pub total_liters: f64,
}

/// Builds the condominium report over the trailing `days` up to `now`,
/// covering every active meter.
pub async fn condominium_report(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    days: u32,
) -> Result<CondominiumReport> {
    let window = Window::trailing_days(now, days);
    let ledger = consumption::derive_consumption(db, Scope::Condominium, &window).await?;

    Ok(CondominiumReport {
        window,
        daily: ledger.daily_series(),
        monthly: ledger.monthly_series(),
        periods: ledger.period_totals(),
        top_lots: ledger.lot_ranking(TOP_LOTS),
        total_liters: ledger.total_liters(),
    })
}

/// One lot's consumption charts: current month by day, current year by
/// month, plus the year-to-date period split.
#[derive(Debug, Clone, PartialEq)]
pub struct LotReport {
    /// Code of the lot
    pub lot_code: String,
    /// Billing category of the lot
    pub category: LotCategory,
    /// Year the report covers
    pub year: i32,
    /// Month of `daily` (1-12)
    pub month: u32,
    /// Dense per-day series over the whole current month
    pub daily: Vec<DailyConsumption>,
    /// Twelve-month series for the current year
    pub monthly: Vec<MonthlyConsumption>,
    /// Morning/afternoon split for the year to date
    pub periods: PeriodTotals,
    /// Sum of the monthly series, in liters
    pub year_total_liters: f64,
}

/// Builds one lot's report as of `now`.
///
/// The daily chart spans the entire current calendar month (days not yet
/// reached show zero) so its axis is stable across the month; the monthly
/// chart and period split cover the current year up to `now`.
pub async fn lot_report(
    db: &DatabaseConnection,
    lot_id: i64,
    now: DateTime<Utc>,
) -> Result<LotReport> {
    let lot = crate::core::lot::get_lot_by_id(db, lot_id)
        .await?
        .ok_or_else(|| Error::LotNotFound {
            lot: lot_id.to_string(),
        })?;

    let year = now.year();
    let month = now.month();

    let (month_start, month_end) = consumption::month_bounds(year, month)?;
    let month_window = Window::new(
        month_start.and_time(NaiveTime::MIN).and_utc(),
        month_end
            .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
            .and_utc(),
    )?;
    let month_ledger = consumption::derive_consumption(db, Scope::Lot(lot_id), &month_window).await?;

    let monthly = consumption::monthly_consumption(db, Scope::Lot(lot_id), year, now).await?;
    let year_total_liters = monthly.iter().map(|m| m.liters).sum();

    let year_window = Window::new(
        consumption::month_bounds(year, 1)?
            .0
            .and_time(NaiveTime::MIN)
            .and_utc(),
        now,
    )?;
    let periods = consumption::period_totals(db, Scope::Lot(lot_id), &year_window).await?;

    Ok(LotReport {
        lot_code: lot.code,
        category: lot.category,
        year,
        month,
        daily: month_ledger.daily_series(),
        monthly,
        periods,
        year_total_liters,
    })
}

/// Formats the dashboard counters as a one-line summary.
#[must_use]
pub fn format_dashboard_summary(summary: &DashboardSummary) -> String {
    format!(
        "Lots: {} active | Meters: {} active | Readings today: {}",
        summary.active_lots, summary.active_meters, summary.readings_today
    )
}

fn month_label(year: i32, month: u32) -> String {
    let abbr = MONTH_ABBR
        .get(month.saturating_sub(1) as usize)
        .unwrap_or(&"?");
    format!("{}/{:02}", abbr, year.rem_euclid(100))
}

/// Formats the condominium report as a human-readable multi-line summary.
#[must_use]
pub fn format_condominium_report(report: &CondominiumReport) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Condominium consumption {} to {} - {:.2} L total\n",
        report.window.start().format("%Y-%m-%d"),
        report.window.end().format("%Y-%m-%d"),
        report.total_liters
    );

    // write! is infallible when writing to String, so unwrap is safe
    write!(
        summary,
        "  Morning: {:.2} L | Afternoon: {:.2} L\n\n",
        report.periods.morning_liters, report.periods.afternoon_liters
    )
    .unwrap();

    for point in &report.monthly {
        writeln!(
            summary,
            "  {} - {:.2} L",
            month_label(point.year, point.month),
            point.liters
        )
        .unwrap();
    }

    if !report.top_lots.is_empty() {
        summary.push_str("  Top lots:\n");
        for (position, entry) in report.top_lots.iter().enumerate() {
            writeln!(
                summary,
                "    {}. {} - {:.2} L",
                position + 1,
                entry.lot_code,
                entry.liters
            )
            .unwrap();
        }
    }

    summary
}

/// Formats a lot report as a human-readable multi-line summary.
#[must_use]
pub fn format_lot_report(report: &LotReport) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Lot {} ({}) - {} {} - {:.2} L so far this year\n",
        report.lot_code,
        report.category,
        month_label(report.year, report.month),
        report.year,
        report.year_total_liters
    );

    write!(
        summary,
        "  Morning: {:.2} L | Afternoon: {:.2} L\n\n",
        report.periods.morning_liters, report.periods.afternoon_liters
    )
    .unwrap();

    for point in &report.monthly {
        writeln!(
            summary,
            "  {} - {:.2} L",
            month_label(report.year, point.month),
            point.liters
        )
        .unwrap();
    }

    summary
}
