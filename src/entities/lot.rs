//! Lot entity - Represents a billed condominium unit.
//!
//! Each lot owns one or more water meters and is either a residential unit
//! or a common area. Lots are soft-disabled via the `active` flag rather
//! than deleted; deleting a lot cascades to its meters.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lots")]
pub struct Model {
    /// Unique identifier for the lot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short unique lot code (e.g., "A-12"); never reassigned once created
    #[sea_orm(unique)]
    pub code: String,
    /// Whether the lot is a residential unit or a common area
    pub category: LotCategory,
    /// Free-text street address
    pub address: Option<String>,
    /// Soft-disable flag - inactive lots are excluded from reports
    pub active: bool,
    /// When the lot was created
    pub created_at: DateTimeUtc,
    /// When the lot was last modified
    pub updated_at: DateTimeUtc,
}

/// Billing category of a lot
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LotCategory {
    /// A privately billed residential unit
    #[sea_orm(string_value = "residential")]
    Residential,
    /// Shared condominium infrastructure (garden taps, pool, clubhouse)
    #[sea_orm(string_value = "common_area")]
    CommonArea,
}

impl std::fmt::Display for LotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Residential => write!(f, "residential"),
            Self::CommonArea => write!(f, "common area"),
        }
    }
}

/// Defines relationships between Lot and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One lot has many meters
    #[sea_orm(has_many = "super::meter::Entity")]
    Meters,
}

impl Related<super::meter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
