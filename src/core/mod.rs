//! Core business logic - framework-agnostic operations over lots, meters,
//! and readings, plus the consumption derivation and report assembly that
//! the presentation layer consumes.

/// Consumption derivation - windows, ledgers, and the two consumption policies
pub mod consumption;

/// Lot operations - creation, lookup, deactivation
pub mod lot;

/// Meter operations - installation, lookup, per-meter figures
pub mod meter;

/// Reading operations - the validated write path and reading queries
pub mod reading;

/// Report assembly - dashboard, condominium, and lot reports
pub mod report;
