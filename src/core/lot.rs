//! Lot business logic - Handles all lot-related operations.
//!
//! Provides functions for creating, retrieving, and deactivating lots.
//! All functions are async and return Result types for error handling.

use crate::{
    entities::{Lot, LotCategory, lot},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all active lots, ordered by code.
///
/// This is the listing used by lot selection interfaces and by reports that
/// enumerate the condominium.
pub async fn get_all_active_lots(db: &DatabaseConnection) -> Result<Vec<lot::Model>> {
    Lot::find()
        .filter(lot::Column::Active.eq(true))
        .order_by_asc(lot::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a lot by its unique code, active or not.
pub async fn get_lot_by_code(db: &DatabaseConnection, code: &str) -> Result<Option<lot::Model>> {
    Lot::find()
        .filter(lot::Column::Code.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a lot by its unique ID.
pub async fn get_lot_by_id(db: &DatabaseConnection, lot_id: i64) -> Result<Option<lot::Model>> {
    Lot::find_by_id(lot_id).one(db).await.map_err(Into::into)
}

/// Creates a new lot.
///
/// The code is trimmed and must be non-empty and unique; lot codes are
/// never reassigned once created.
pub async fn create_lot(
    db: &DatabaseConnection,
    code: String,
    category: LotCategory,
    address: Option<String>,
) -> Result<lot::Model> {
    let code = code.trim().to_string();
    if code.is_empty() {
        return Err(Error::Config {
            message: "Lot code cannot be empty".to_string(),
        });
    }

    if get_lot_by_code(db, &code).await?.is_some() {
        return Err(Error::DuplicateLotCode { code });
    }

    let now = Utc::now();
    let lot = lot::ActiveModel {
        code: Set(code),
        category: Set(category),
        address: Set(address),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = lot.insert(db).await?;
    Ok(result)
}

/// Soft-disables a lot. Its meters and readings are preserved but the lot
/// no longer appears in active listings or reports.
pub async fn deactivate_lot(db: &DatabaseConnection, lot_id: i64) -> Result<lot::Model> {
    let lot = get_lot_by_id(db, lot_id)
        .await?
        .ok_or_else(|| Error::LotNotFound {
            lot: lot_id.to_string(),
        })?;

    let mut active_model: lot::ActiveModel = lot.into();
    active_model.active = Set(false);
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await.map_err(Into::into)
}
