//! SQLite-backed implementation of the membership state store port.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use shiftfence_core::MembershipStateStore;
use shiftfence_domain::{MembershipState, Result, ShiftFenceError};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use crate::errors::InfraError;

/// Durable single-row membership state. Survives process restarts so a
/// reopened app does not re-fire a notification for a state that was already
/// true before closing.
pub struct SqliteMembershipStateStore {
    db: Arc<DbManager>,
}

impl SqliteMembershipStateStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipStateStore for SqliteMembershipStateStore {
    async fn get(&self) -> Result<MembershipState> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<MembershipState> {
            let conn = db.get_connection()?;
            let stored: Option<String> = conn
                .query_row("SELECT state FROM membership_state WHERE id = 1", params![], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(map_sql_error)?;

            match stored {
                Some(raw) => MembershipState::from_str(&raw),
                None => Ok(MembershipState::Unknown),
            }
        })
        .await
        .map_err(|e| ShiftFenceError::from(InfraError::from(e)))?
    }

    async fn set(&self, state: MembershipState) -> Result<()> {
        let db = Arc::clone(&self.db);
        let now = Utc::now().timestamp();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO membership_state (id, state, updated_at) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
                params![state.to_string(), now],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|e| ShiftFenceError::from(InfraError::from(e)))?
    }
}
