//! Reading entity - One observation of a meter's cumulative volume counter.
//!
//! Each reading records the counter value in m³ at a timestamp, tagged with
//! a coarse period of day (morning/afternoon). At most one reading exists
//! per meter per period slot at a given instant; the composite unique index
//! is created during table bootstrap. Readings are never updated by the
//! consumption logic.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reading database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "readings")]
pub struct Model {
    /// Unique identifier for the reading
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the meter this reading belongs to
    pub meter_id: i64,
    /// Counter value in cubic meters, bounded to [0, 99999.999]
    pub value_m3: f64,
    /// When the reading was taken
    pub taken_at: DateTimeUtc,
    /// Period of day the reading belongs to
    pub period: ReadingPeriod,
    /// Name of the person who took the reading
    pub recorded_by: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Reference to a photo of the meter display, if one was taken
    pub photo_path: Option<String>,
    /// When the reading was created
    pub created_at: DateTimeUtc,
    /// When the reading was last modified
    pub updated_at: DateTimeUtc,
}

/// Coarse time-of-day tag attached to a reading
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum ReadingPeriod {
    /// Reading taken during the morning round
    #[sea_orm(string_value = "morning")]
    Morning,
    /// Reading taken during the afternoon round
    #[sea_orm(string_value = "afternoon")]
    Afternoon,
}

impl std::fmt::Display for ReadingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Afternoon => write!(f, "afternoon"),
        }
    }
}

/// Defines relationships between Reading and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reading belongs to one meter
    #[sea_orm(
        belongs_to = "super::meter::Entity",
        from = "Column::MeterId",
        to = "super::meter::Column::Id"
    )]
    Meter,
}

impl Related<super::meter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
