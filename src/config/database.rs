//! Database configuration module.
//!
//! Handles `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions via `Schema::create_table_from_entity`
//! so the database schema always matches the Rust struct definitions without
//! manual SQL. The one piece of schema the entities cannot express - the
//! composite `(meter_id, taken_at, period)` uniqueness of readings - is
//! created here as a unique index.

use crate::entities::{Lot, Meter, Reading, reading};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns the default
/// local `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/meterbook.sqlite".to_string())
}

/// Establishes a connection to the database using the `DATABASE_URL`
/// environment variable, falling back to a default local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation
/// from the entity definitions, plus the unique reading-slot index.
///
/// Safe to call on an existing database: every statement carries
/// IF NOT EXISTS.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut lot_table = schema.create_table_from_entity(Lot);
    let mut meter_table = schema.create_table_from_entity(Meter);
    let mut reading_table = schema.create_table_from_entity(Reading);

    db.execute(builder.build(lot_table.if_not_exists())).await?;
    db.execute(builder.build(meter_table.if_not_exists())).await?;
    db.execute(builder.build(reading_table.if_not_exists())).await?;

    // At most one reading per meter per period slot at a given instant
    let mut reading_slot_index = Index::create()
        .name("idx_readings_meter_taken_at_period")
        .table(Reading)
        .col(reading::Column::MeterId)
        .col(reading::Column::TakenAt)
        .col(reading::Column::Period)
        .unique()
        .to_owned();
    db.execute(builder.build(reading_slot_index.if_not_exists()))
        .await?;

    Ok(())
}
