//! Activity repository: append-only logs plus the asset column each log
//! entry updates.
//!
//! # Responsibility
//! - Persist moves, shipments, status changes, comments and Teflon updates.
//! - Keep the asset row and its log entry consistent in one transaction.
//! - Read back a merged per-asset timeline.
//!
//! # Invariants
//! - A log row is written only if the asset row update touched exactly the
//!   target asset; otherwise `NotFound` is returned and nothing is written.
//! - Timelines are ordered by `occurred_at DESC`. Ties fall back to reverse
//!   read order (status, location, ship, comment, teflon; rowid within each).

use super::table_repo::parse_status_log_row;
use super::{RepoError, RepoResult};
use crate::model::activity::{
    ActivityRecord, Comment, LocationLog, ShipLog, StatusLog, TeflonLog,
};
use crate::model::asset::{AssetKey, AssetKind, TeflonStatus};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Repository interface for activity logs.
pub trait ActivityRepository {
    fn record_status(&self, log: &StatusLog) -> RepoResult<()>;
    fn record_move(&self, log: &LocationLog) -> RepoResult<()>;
    /// Writes the shipment, the new storage company and the status entry.
    fn record_shipment(&self, log: &ShipLog, status: &StatusLog) -> RepoResult<()>;
    fn add_comment(&self, comment: &Comment) -> RepoResult<()>;
    fn record_teflon(&self, log: &TeflonLog) -> RepoResult<()>;
    fn list_activity(&self, asset: &AssetKey) -> RepoResult<Vec<ActivityRecord>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn record_status(&self, log: &StatusLog) -> RepoResult<()> {
        log.validate()?;
        insert_status_log(self.conn, log)
    }

    fn record_move(&self, log: &LocationLog) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        update_asset_column(
            &tx,
            &log.asset,
            "rack_layer_id",
            Some(log.to_layer_id.as_str()),
        )?;
        tx.execute(
            "INSERT INTO location_logs (
                log_id, asset_kind, asset_id, from_layer_id, to_layer_id,
                employee_id, note, occurred_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                log.log_id.to_string(),
                log.asset.kind.as_str(),
                log.asset.id.as_str(),
                log.from_layer_id.as_deref(),
                log.to_layer_id.as_str(),
                log.employee_id.as_str(),
                log.note.as_deref(),
                log.occurred_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn record_shipment(&self, log: &ShipLog, status: &StatusLog) -> RepoResult<()> {
        status.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        update_asset_column(
            &tx,
            &log.asset,
            "storage_company_id",
            Some(log.to_company_id.as_str()),
        )?;
        tx.execute(
            "INSERT INTO ship_logs (
                log_id, asset_kind, asset_id, from_company_id, to_company_id,
                employee_id, note, occurred_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                log.log_id.to_string(),
                log.asset.kind.as_str(),
                log.asset.id.as_str(),
                log.from_company_id.as_deref(),
                log.to_company_id.as_str(),
                log.employee_id.as_str(),
                log.note.as_deref(),
                log.occurred_at,
            ],
        )?;
        insert_status_log(&tx, status)?;
        tx.commit()?;
        Ok(())
    }

    fn add_comment(&self, comment: &Comment) -> RepoResult<()> {
        comment.validate()?;
        self.conn.execute(
            "INSERT INTO comments (
                comment_id, asset_kind, asset_id, employee_id, body, occurred_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                comment.comment_id.to_string(),
                comment.asset.kind.as_str(),
                comment.asset.id.as_str(),
                comment.employee_id.as_str(),
                comment.body.trim(),
                comment.occurred_at,
            ],
        )?;
        Ok(())
    }

    fn record_teflon(&self, log: &TeflonLog) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        update_asset_column(
            &tx,
            &AssetKey::mold(&log.mold_id),
            "teflon_status",
            Some(log.status.as_str()),
        )?;
        tx.execute(
            "INSERT INTO teflon_logs (log_id, mold_id, status, employee_id, note, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                log.log_id.to_string(),
                log.mold_id.as_str(),
                log.status.as_str(),
                log.employee_id.as_str(),
                log.note.as_deref(),
                log.occurred_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_activity(&self, asset: &AssetKey) -> RepoResult<Vec<ActivityRecord>> {
        // (occurred_at, read rank) decides the merged order.
        let mut entries: Vec<(i64, usize, ActivityRecord)> = Vec::new();

        let status_column = match asset.kind {
            AssetKind::Mold => "mold_id",
            AssetKind::Cutter => "cutter_id",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT log_id, mold_id, cutter_id, status, occurred_at, employee_id, note
             FROM status_logs
             WHERE trim({status_column}) = ?1
             ORDER BY row_order ASC;"
        ))?;
        let mut rows = stmt.query([asset.id.as_str()])?;
        while let Some(row) = rows.next()? {
            let log = parse_status_log_row(row)?;
            entries.push((log.occurred_at, entries.len(), ActivityRecord::Status(log)));
        }

        let mut stmt = self.conn.prepare(
            "SELECT log_id, asset_kind, asset_id, from_layer_id, to_layer_id,
                    employee_id, note, occurred_at
             FROM location_logs
             WHERE asset_kind = ?1 AND asset_id = ?2
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query(params![asset.kind.as_str(), asset.id.as_str()])?;
        while let Some(row) = rows.next()? {
            let log = LocationLog {
                log_id: parse_uuid(row, "log_id")?,
                asset: parse_asset(row)?,
                from_layer_id: row.get("from_layer_id")?,
                to_layer_id: row.get("to_layer_id")?,
                employee_id: row.get("employee_id")?,
                note: row.get("note")?,
                occurred_at: row.get("occurred_at")?,
            };
            entries.push((log.occurred_at, entries.len(), ActivityRecord::Location(log)));
        }

        let mut stmt = self.conn.prepare(
            "SELECT log_id, asset_kind, asset_id, from_company_id, to_company_id,
                    employee_id, note, occurred_at
             FROM ship_logs
             WHERE asset_kind = ?1 AND asset_id = ?2
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query(params![asset.kind.as_str(), asset.id.as_str()])?;
        while let Some(row) = rows.next()? {
            let log = ShipLog {
                log_id: parse_uuid(row, "log_id")?,
                asset: parse_asset(row)?,
                from_company_id: row.get("from_company_id")?,
                to_company_id: row.get("to_company_id")?,
                employee_id: row.get("employee_id")?,
                note: row.get("note")?,
                occurred_at: row.get("occurred_at")?,
            };
            entries.push((log.occurred_at, entries.len(), ActivityRecord::Ship(log)));
        }

        let mut stmt = self.conn.prepare(
            "SELECT comment_id, asset_kind, asset_id, employee_id, body, occurred_at
             FROM comments
             WHERE asset_kind = ?1 AND asset_id = ?2
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query(params![asset.kind.as_str(), asset.id.as_str()])?;
        while let Some(row) = rows.next()? {
            let comment = Comment {
                comment_id: parse_uuid(row, "comment_id")?,
                asset: parse_asset(row)?,
                employee_id: row.get("employee_id")?,
                body: row.get("body")?,
                occurred_at: row.get("occurred_at")?,
            };
            entries.push((
                comment.occurred_at,
                entries.len(),
                ActivityRecord::Comment(comment),
            ));
        }

        if asset.kind == AssetKind::Mold {
            let mut stmt = self.conn.prepare(
                "SELECT log_id, mold_id, status, employee_id, note, occurred_at
                 FROM teflon_logs
                 WHERE mold_id = ?1
                 ORDER BY rowid ASC;",
            )?;
            let mut rows = stmt.query([asset.id.as_str()])?;
            while let Some(row) = rows.next()? {
                let status_text: String = row.get("status")?;
                let status = TeflonStatus::parse(&status_text).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid teflon status `{status_text}` in teflon_logs.status"
                    ))
                })?;
                let log = TeflonLog {
                    log_id: parse_uuid(row, "log_id")?,
                    mold_id: row.get("mold_id")?,
                    status,
                    employee_id: row.get("employee_id")?,
                    note: row.get("note")?,
                    occurred_at: row.get("occurred_at")?,
                };
                entries.push((log.occurred_at, entries.len(), ActivityRecord::Teflon(log)));
            }
        }

        entries.sort_by(|left, right| right.0.cmp(&left.0).then(right.1.cmp(&left.1)));
        Ok(entries.into_iter().map(|(_, _, record)| record).collect())
    }
}

fn insert_status_log(conn: &Connection, log: &StatusLog) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO status_logs (
            log_id, mold_id, cutter_id, status, occurred_at, employee_id, note
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            log.log_id.as_str(),
            log.mold_id.as_deref(),
            log.cutter_id.as_deref(),
            log.status.as_str(),
            log.occurred_at,
            log.employee_id.as_deref(),
            log.note.as_deref(),
        ],
    )?;
    Ok(())
}

fn update_asset_column(
    tx: &Transaction<'_>,
    asset: &AssetKey,
    column: &'static str,
    value: Option<&str>,
) -> RepoResult<()> {
    let (table, id_column) = match asset.kind {
        AssetKind::Mold => ("molds", "mold_id"),
        AssetKind::Cutter => ("cutters", "cutter_id"),
    };
    let changed = tx.execute(
        &format!("UPDATE {table} SET {column} = ?1 WHERE {id_column} = ?2;"),
        params![value, asset.id.as_str()],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(asset.clone()));
    }
    Ok(())
}

fn parse_uuid(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn parse_asset(row: &Row<'_>) -> RepoResult<AssetKey> {
    let kind_text: String = row.get("asset_kind")?;
    let kind = AssetKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid asset kind `{kind_text}` in asset_kind"))
    })?;
    let id: String = row.get("asset_id")?;
    Ok(AssetKey::new(kind, id))
}
