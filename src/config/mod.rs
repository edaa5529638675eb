/// Database configuration and connection management
pub mod database;

/// Lot and meter seeding configuration from config.toml
pub mod lots;
