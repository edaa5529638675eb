//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod lot;
pub mod meter;
pub mod reading;

// Re-export specific types to avoid conflicts
pub use lot::{Column as LotColumn, Entity as Lot, LotCategory, Model as LotModel};
pub use meter::{Column as MeterColumn, Entity as Meter, Model as MeterModel};
pub use reading::{Column as ReadingColumn, Entity as Reading, Model as ReadingModel, ReadingPeriod};
