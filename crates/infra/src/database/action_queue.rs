//! SQLite-backed implementation of the offline clock action queue port.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Row};
use shiftfence_core::ClockActionQueue;
use shiftfence_domain::{
    ClockActionKind, ClockPayload, PendingClockAction, Result, ShiftFenceError,
};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use crate::errors::InfraError;

const INSERT_SQL: &str = "INSERT OR IGNORE INTO pending_clock_actions (
        id, idempotency_key, kind, payload_json, created_at, attempts, last_error
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const PENDING_SQL: &str = "SELECT
        id, idempotency_key, kind, payload_json, created_at, attempts, last_error
    FROM pending_clock_actions
    ORDER BY created_at ASC, id ASC
    LIMIT ?1";

/// Durable FIFO queue of clock actions attempted while offline. The UNIQUE
/// idempotency key collapses a rapid double-submit into one entry.
pub struct SqliteClockActionQueue {
    db: Arc<DbManager>,
}

impl SqliteClockActionQueue {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClockActionQueue for SqliteClockActionQueue {
    async fn enqueue(&self, action: &PendingClockAction) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let action = action.clone();

        task::spawn_blocking(move || -> Result<bool> {
            let payload_json = serde_json::to_string(&action.payload)
                .map_err(|e| ShiftFenceError::Internal(format!("payload serialization: {e}")))?;
            let conn = db.get_connection()?;
            let inserted = conn
                .execute(
                    INSERT_SQL,
                    params![
                        action.id,
                        action.idempotency_key,
                        action.kind.to_string(),
                        payload_json,
                        action.created_at.timestamp_millis(),
                        action.attempts,
                        action.last_error,
                    ],
                )
                .map_err(map_sql_error)?;
            Ok(inserted > 0)
        })
        .await
        .map_err(|e| ShiftFenceError::from(InfraError::from(e)))?
    }

    async fn pending(&self, limit: usize) -> Result<Vec<PendingClockAction>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<PendingClockAction>> {
            if limit == 0 {
                return Ok(Vec::new());
            }
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(PENDING_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![limit as i64], map_action_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(|e| ShiftFenceError::from(InfraError::from(e)))?
    }

    async fn mark_done(&self, id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM pending_clock_actions WHERE id = ?1", params![id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|e| ShiftFenceError::from(InfraError::from(e)))?
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let error = truncate_reason(error);

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE pending_clock_actions
                 SET attempts = attempts + 1, last_error = ?2
                 WHERE id = ?1",
                params![id, error],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|e| ShiftFenceError::from(InfraError::from(e)))?
    }
}

fn map_action_row(row: &Row<'_>) -> rusqlite::Result<PendingClockAction> {
    let kind_raw: String = row.get(2)?;
    let payload_json: String = row.get(3)?;
    let created_ms: i64 = row.get(4)?;

    let kind = ClockActionKind::from_str(&kind_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            e.to_string().into(),
        )
    })?;
    let payload: ClockPayload = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = chrono::DateTime::from_timestamp_millis(created_ms)
        .unwrap_or_else(chrono::Utc::now);

    Ok(PendingClockAction {
        id: row.get(0)?,
        idempotency_key: row.get(1)?,
        kind,
        payload,
        created_at,
        attempts: row.get(5)?,
        last_error: row.get(6)?,
    })
}

fn truncate_reason(reason: &str) -> String {
    const MAX_LEN: usize = 256;
    if reason.len() <= MAX_LEN {
        return reason.to_string();
    }

    let mut truncated = reason.chars().take(MAX_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}
