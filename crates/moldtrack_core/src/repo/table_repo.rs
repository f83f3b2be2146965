//! Table repository: bulk load/replace of reference and asset tables.
//!
//! # Responsibility
//! - Load every table the join engine needs in one snapshot.
//! - Replace reference and asset tables wholesale on import.
//! - Provide point lookups used by action validation.
//!
//! # Invariants
//! - Mold/cutter rows are returned in original import order (`row_order`).
//! - Primary keys are stored trimmed; on duplicate keys the first row wins.
//! - Status logs are merged by `log_id`, never deleted by an import.
//! - After a replace, each asset's location, storage company and Teflon
//!   columns equal its latest recorded move, shipment and Teflon entry.

use super::{RepoError, RepoResult};
use crate::model::activity::StatusLog;
use crate::model::asset::{Cutter, Mold, MoldCutterLink};
use crate::model::reference::{Company, Employee, MoldDesign, Rack, RackLayer};
use crate::model::normalize_key;
use crate::model::tables::RawTables;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const MOLD_SELECT_SQL: &str = "SELECT
    mold_id,
    mold_code,
    mold_name,
    design_id,
    rack_layer_id,
    storage_company_id,
    teflon_status,
    notes
FROM molds";

/// Replays the newest activity entry onto the freshly imported asset rows.
/// Ties on `occurred_at` go to the later-written entry.
const REAPPLY_ACTIVITY_SQL: [&str; 5] = [
    "UPDATE molds SET rack_layer_id = (
        SELECT to_layer_id FROM location_logs
        WHERE asset_kind = 'mold' AND asset_id = molds.mold_id
        ORDER BY occurred_at DESC, rowid DESC LIMIT 1
    ) WHERE mold_id IN (SELECT asset_id FROM location_logs WHERE asset_kind = 'mold');",
    "UPDATE cutters SET rack_layer_id = (
        SELECT to_layer_id FROM location_logs
        WHERE asset_kind = 'cutter' AND asset_id = cutters.cutter_id
        ORDER BY occurred_at DESC, rowid DESC LIMIT 1
    ) WHERE cutter_id IN (SELECT asset_id FROM location_logs WHERE asset_kind = 'cutter');",
    "UPDATE molds SET storage_company_id = (
        SELECT to_company_id FROM ship_logs
        WHERE asset_kind = 'mold' AND asset_id = molds.mold_id
        ORDER BY occurred_at DESC, rowid DESC LIMIT 1
    ) WHERE mold_id IN (SELECT asset_id FROM ship_logs WHERE asset_kind = 'mold');",
    "UPDATE cutters SET storage_company_id = (
        SELECT to_company_id FROM ship_logs
        WHERE asset_kind = 'cutter' AND asset_id = cutters.cutter_id
        ORDER BY occurred_at DESC, rowid DESC LIMIT 1
    ) WHERE cutter_id IN (SELECT asset_id FROM ship_logs WHERE asset_kind = 'cutter');",
    "UPDATE molds SET teflon_status = (
        SELECT status FROM teflon_logs
        WHERE mold_id = molds.mold_id
        ORDER BY occurred_at DESC, rowid DESC LIMIT 1
    ) WHERE mold_id IN (SELECT mold_id FROM teflon_logs);",
];

const CUTTER_SELECT_SQL: &str = "SELECT
    cutter_id,
    cutter_no,
    cutter_name,
    cutline_length,
    cutline_width,
    rack_layer_id,
    storage_company_id,
    notes
FROM cutters";

/// Repository interface for table snapshots and point lookups.
pub trait TableRepository {
    /// Loads a full snapshot of every joined table.
    fn load_tables(&self) -> RepoResult<RawTables>;
    /// Replaces reference/asset tables, merges status logs and re-applies
    /// recorded moves, shipments and Teflon updates.
    fn replace_tables(&self, tables: &RawTables) -> RepoResult<()>;
    fn get_mold(&self, mold_id: &str) -> RepoResult<Option<Mold>>;
    fn get_cutter(&self, cutter_id: &str) -> RepoResult<Option<Cutter>>;
    fn get_rack_layer(&self, rack_layer_id: &str) -> RepoResult<Option<RackLayer>>;
    fn get_company(&self, company_id: &str) -> RepoResult<Option<Company>>;
    fn get_employee(&self, employee_id: &str) -> RepoResult<Option<Employee>>;
}

/// SQLite-backed table repository.
pub struct SqliteTableRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTableRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TableRepository for SqliteTableRepository<'_> {
    fn load_tables(&self) -> RepoResult<RawTables> {
        Ok(RawTables {
            molds: query_all(
                self.conn,
                &format!("{MOLD_SELECT_SQL} ORDER BY row_order ASC"),
                parse_mold_row,
            )?,
            cutters: query_all(
                self.conn,
                &format!("{CUTTER_SELECT_SQL} ORDER BY row_order ASC"),
                parse_cutter_row,
            )?,
            designs: query_all(
                self.conn,
                "SELECT design_id, design_code, length, width, height, piece_count,
                        drawing_number, tray_info
                 FROM mold_designs ORDER BY rowid ASC",
                parse_design_row,
            )?,
            racks: query_all(
                self.conn,
                "SELECT rack_id, symbol, name, location FROM racks ORDER BY rowid ASC",
                parse_rack_row,
            )?,
            rack_layers: query_all(
                self.conn,
                "SELECT rack_layer_id, rack_id, layer_number, notes
                 FROM rack_layers ORDER BY rowid ASC",
                parse_rack_layer_row,
            )?,
            companies: query_all(
                self.conn,
                "SELECT company_id, short_name, name FROM companies ORDER BY rowid ASC",
                parse_company_row,
            )?,
            employees: query_all(
                self.conn,
                "SELECT employee_id, name FROM employees ORDER BY rowid ASC",
                parse_employee_row,
            )?,
            mold_cutters: query_all(
                self.conn,
                "SELECT mold_id, cutter_id FROM mold_cutters ORDER BY rowid ASC",
                |row| {
                    Ok(MoldCutterLink {
                        mold_id: row.get("mold_id")?,
                        cutter_id: row.get("cutter_id")?,
                    })
                },
            )?,
            status_logs: query_all(
                self.conn,
                "SELECT log_id, mold_id, cutter_id, status, occurred_at, employee_id, note
                 FROM status_logs ORDER BY row_order ASC",
                parse_status_log_row,
            )?,
        })
    }

    fn replace_tables(&self, tables: &RawTables) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for table in [
            "molds",
            "cutters",
            "mold_designs",
            "racks",
            "rack_layers",
            "companies",
            "employees",
            "mold_cutters",
        ] {
            tx.execute(&format!("DELETE FROM {table};"), [])?;
        }

        insert_molds(&tx, &tables.molds)?;
        insert_cutters(&tx, &tables.cutters)?;
        insert_references(&tx, tables)?;

        for log in &tables.status_logs {
            log.validate()?;
            tx.execute(
                "INSERT OR IGNORE INTO status_logs (
                    log_id, mold_id, cutter_id, status, occurred_at, employee_id, note
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    log.log_id.trim(),
                    log.mold_id.as_deref(),
                    log.cutter_id.as_deref(),
                    log.status.as_str(),
                    log.occurred_at,
                    log.employee_id.as_deref(),
                    log.note.as_deref(),
                ],
            )?;
        }

        for sql in REAPPLY_ACTIVITY_SQL {
            tx.execute(sql, [])?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_mold(&self, mold_id: &str) -> RepoResult<Option<Mold>> {
        let Some(id) = normalize_key(mold_id) else {
            return Ok(None);
        };
        let mold = self
            .conn
            .query_row(
                &format!("{MOLD_SELECT_SQL} WHERE mold_id = ?1;"),
                [id],
                parse_mold_row,
            )
            .optional()?;
        Ok(mold)
    }

    fn get_cutter(&self, cutter_id: &str) -> RepoResult<Option<Cutter>> {
        let Some(id) = normalize_key(cutter_id) else {
            return Ok(None);
        };
        let cutter = self
            .conn
            .query_row(
                &format!("{CUTTER_SELECT_SQL} WHERE cutter_id = ?1;"),
                [id],
                parse_cutter_row,
            )
            .optional()?;
        Ok(cutter)
    }

    fn get_rack_layer(&self, rack_layer_id: &str) -> RepoResult<Option<RackLayer>> {
        let Some(id) = normalize_key(rack_layer_id) else {
            return Ok(None);
        };
        let layer = self
            .conn
            .query_row(
                "SELECT rack_layer_id, rack_id, layer_number, notes
                 FROM rack_layers WHERE rack_layer_id = ?1;",
                [id],
                parse_rack_layer_row,
            )
            .optional()?;
        Ok(layer)
    }

    fn get_company(&self, company_id: &str) -> RepoResult<Option<Company>> {
        let Some(id) = normalize_key(company_id) else {
            return Ok(None);
        };
        let company = self
            .conn
            .query_row(
                "SELECT company_id, short_name, name FROM companies WHERE company_id = ?1;",
                [id],
                parse_company_row,
            )
            .optional()?;
        Ok(company)
    }

    fn get_employee(&self, employee_id: &str) -> RepoResult<Option<Employee>> {
        let Some(id) = normalize_key(employee_id) else {
            return Ok(None);
        };
        let employee = self
            .conn
            .query_row(
                "SELECT employee_id, name FROM employees WHERE employee_id = ?1;",
                [id],
                parse_employee_row,
            )
            .optional()?;
        Ok(employee)
    }
}

fn insert_molds(tx: &Transaction<'_>, molds: &[Mold]) -> RepoResult<()> {
    for (index, mold) in molds.iter().enumerate() {
        mold.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO molds (
                row_order, mold_id, mold_code, mold_name, design_id,
                rack_layer_id, storage_company_id, teflon_status, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                index as i64,
                mold.mold_id.trim(),
                mold.mold_code.as_deref(),
                mold.mold_name.as_deref(),
                mold.design_id.as_deref(),
                mold.rack_layer_id.as_deref(),
                mold.storage_company_id.as_deref(),
                mold.teflon_status.as_deref(),
                mold.notes.as_deref(),
            ],
        )?;
    }
    Ok(())
}

fn insert_cutters(tx: &Transaction<'_>, cutters: &[Cutter]) -> RepoResult<()> {
    for (index, cutter) in cutters.iter().enumerate() {
        cutter.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO cutters (
                row_order, cutter_id, cutter_no, cutter_name, cutline_length,
                cutline_width, rack_layer_id, storage_company_id, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                index as i64,
                cutter.cutter_id.trim(),
                cutter.cutter_no.as_deref(),
                cutter.cutter_name.as_deref(),
                cutter.cutline_length,
                cutter.cutline_width,
                cutter.rack_layer_id.as_deref(),
                cutter.storage_company_id.as_deref(),
                cutter.notes.as_deref(),
            ],
        )?;
    }
    Ok(())
}

fn insert_references(tx: &Transaction<'_>, tables: &RawTables) -> RepoResult<()> {
    for design in &tables.designs {
        design.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO mold_designs (
                design_id, design_code, length, width, height, piece_count,
                drawing_number, tray_info
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                design.design_id.trim(),
                design.design_code.as_deref(),
                design.length,
                design.width,
                design.height,
                design.piece_count,
                design.drawing_number.as_deref(),
                design.tray_info.as_deref(),
            ],
        )?;
    }

    for rack in &tables.racks {
        rack.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO racks (rack_id, symbol, name, location)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                rack.rack_id.trim(),
                rack.symbol.as_deref(),
                rack.name.as_deref(),
                rack.location.as_deref(),
            ],
        )?;
    }

    for layer in &tables.rack_layers {
        layer.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO rack_layers (rack_layer_id, rack_id, layer_number, notes)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                layer.rack_layer_id.trim(),
                layer.rack_id.as_deref(),
                layer.layer_number.as_deref(),
                layer.notes.as_deref(),
            ],
        )?;
    }

    for company in &tables.companies {
        company.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO companies (company_id, short_name, name)
             VALUES (?1, ?2, ?3);",
            params![
                company.company_id.trim(),
                company.short_name.as_deref(),
                company.name.as_deref(),
            ],
        )?;
    }

    for employee in &tables.employees {
        employee.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO employees (employee_id, name) VALUES (?1, ?2);",
            params![employee.employee_id.trim(), employee.name.as_deref()],
        )?;
    }

    for link in &tables.mold_cutters {
        link.validate()?;
        tx.execute(
            "INSERT OR IGNORE INTO mold_cutters (mold_id, cutter_id) VALUES (?1, ?2);",
            params![link.mold_id.trim(), link.cutter_id.trim()],
        )?;
    }

    Ok(())
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    parse: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row).map_err(|err| {
            RepoError::InvalidData(format!("failed to decode row for `{sql}`: {err}"))
        })?);
    }
    Ok(items)
}

fn parse_mold_row(row: &Row<'_>) -> rusqlite::Result<Mold> {
    Ok(Mold {
        mold_id: row.get("mold_id")?,
        mold_code: row.get("mold_code")?,
        mold_name: row.get("mold_name")?,
        design_id: row.get("design_id")?,
        rack_layer_id: row.get("rack_layer_id")?,
        storage_company_id: row.get("storage_company_id")?,
        teflon_status: row.get("teflon_status")?,
        notes: row.get("notes")?,
    })
}

fn parse_cutter_row(row: &Row<'_>) -> rusqlite::Result<Cutter> {
    Ok(Cutter {
        cutter_id: row.get("cutter_id")?,
        cutter_no: row.get("cutter_no")?,
        cutter_name: row.get("cutter_name")?,
        cutline_length: row.get("cutline_length")?,
        cutline_width: row.get("cutline_width")?,
        rack_layer_id: row.get("rack_layer_id")?,
        storage_company_id: row.get("storage_company_id")?,
        notes: row.get("notes")?,
    })
}

fn parse_design_row(row: &Row<'_>) -> rusqlite::Result<MoldDesign> {
    Ok(MoldDesign {
        design_id: row.get("design_id")?,
        design_code: row.get("design_code")?,
        length: row.get("length")?,
        width: row.get("width")?,
        height: row.get("height")?,
        piece_count: row.get("piece_count")?,
        drawing_number: row.get("drawing_number")?,
        tray_info: row.get("tray_info")?,
    })
}

fn parse_rack_row(row: &Row<'_>) -> rusqlite::Result<Rack> {
    Ok(Rack {
        rack_id: row.get("rack_id")?,
        symbol: row.get("symbol")?,
        name: row.get("name")?,
        location: row.get("location")?,
    })
}

fn parse_rack_layer_row(row: &Row<'_>) -> rusqlite::Result<RackLayer> {
    Ok(RackLayer {
        rack_layer_id: row.get("rack_layer_id")?,
        rack_id: row.get("rack_id")?,
        layer_number: row.get("layer_number")?,
        notes: row.get("notes")?,
    })
}

fn parse_company_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        company_id: row.get("company_id")?,
        short_name: row.get("short_name")?,
        name: row.get("name")?,
    })
}

fn parse_employee_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        employee_id: row.get("employee_id")?,
        name: row.get("name")?,
    })
}

pub(crate) fn parse_status_log_row(row: &Row<'_>) -> rusqlite::Result<StatusLog> {
    Ok(StatusLog {
        log_id: row.get("log_id")?,
        mold_id: row.get("mold_id")?,
        cutter_id: row.get("cutter_id")?,
        status: row.get("status")?,
        occurred_at: row.get("occurred_at")?,
        employee_id: row.get("employee_id")?,
        note: row.get("note")?,
    })
}
