//! Meter entity - Represents a physical water meter installed at a lot.
//!
//! A meter carries a monotonically increasing cumulative volume counter and
//! belongs to exactly one lot for its lifetime. Decommissioned meters are
//! deactivated, not deleted, so their reading history stays available.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meter database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meters")]
pub struct Model {
    /// Unique identifier for the meter
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique serial code printed on the device
    #[sea_orm(unique)]
    pub serial: String,
    /// ID of the lot this meter belongs to
    pub lot_id: i64,
    /// Free-text description of the physical location
    pub location: Option<String>,
    /// Date the meter was installed
    pub installed_on: Date,
    /// Soft-disable flag - decommissioned meters keep their history
    pub active: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the meter was created
    pub created_at: DateTimeUtc,
    /// When the meter was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Meter and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each meter belongs to one lot
    #[sea_orm(
        belongs_to = "super::lot::Entity",
        from = "Column::LotId",
        to = "super::lot::Column::Id"
    )]
    Lot,
    /// One meter has many readings
    #[sea_orm(has_many = "super::reading::Entity")]
    Readings,
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl Related<super::reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
