use uuid::Uuid;

use crate::db::error::{DbError, DbResult};

/// Parse a UUID column, mapping corruption to `DbError::Internal`.
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {}", e)))
}

/// Parse a JSON text column.
pub fn parse_json(s: &str) -> DbResult<serde_json::Value> {
    Ok(serde_json::from_str(s)?)
}
