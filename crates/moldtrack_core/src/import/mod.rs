//! CSV reference-data import.
//!
//! # Responsibility
//! - Read the inventory sheets exported as CSV into [`RawTables`].
//! - Replace the stored tables through a [`TableRepository`].
//!
//! # Invariants
//! - A missing file yields an empty table, not an error.
//! - Rows that fail to decode or validate are skipped and counted.
//! - Storage is replaced inside one transaction; a failed import leaves the
//!   previous data untouched.

mod csv_source;

pub use csv_source::{read_tables_from_dir, TableFile, TABLE_FILES};

use crate::model::tables::RawTables;
use crate::repo::table_repo::TableRepository;
use crate::repo::RepoError;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type ImportResult<T> = Result<T, ImportError>;

/// Import failure for unreadable files or storage errors.
#[derive(Debug)]
pub enum ImportError {
    /// Data directory does not exist or is not a directory.
    MissingDirectory(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Header row cannot be read.
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDirectory(path) => {
                write!(f, "data directory not found: {}", path.display())
            }
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Csv { path, source } => {
                write!(f, "invalid csv header in {}: {source}", path.display())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingDirectory(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Per-file outcome of reading one CSV sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: &'static str,
    /// `false` when the file was absent and treated as empty.
    pub present: bool,
    pub rows: usize,
    pub skipped: usize,
}

/// Summary of one directory import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub files: Vec<FileReport>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|file| file.rows).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.files.iter().map(|file| file.skipped).sum()
    }

    pub fn file(&self, name: &str) -> Option<&FileReport> {
        self.files.iter().find(|file| file.file == name)
    }
}

/// Reads every sheet in `dir` and replaces stored tables with the result.
///
/// Returns the tables as imported together with the read report.
pub fn import_dir<R: TableRepository>(
    repo: &R,
    dir: impl AsRef<Path>,
) -> ImportResult<(RawTables, ImportReport)> {
    let dir = dir.as_ref();
    let started_at = Instant::now();
    info!(
        "event=import module=import status=start dir={}",
        dir.display()
    );

    let (tables, report) = read_tables_from_dir(dir)?;
    if tables.is_empty() {
        warn!(
            "event=import module=import status=empty dir={}",
            dir.display()
        );
    }
    for (table, rows) in tables.row_counts() {
        debug!("event=import_table module=import table={table} rows={rows}");
    }
    if let Err(err) = repo.replace_tables(&tables) {
        error!(
            "event=import module=import status=error duration_ms={} error_code=replace_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=import module=import status=ok rows={} skipped={} duration_ms={}",
        report.total_rows(),
        report.total_skipped(),
        started_at.elapsed().as_millis()
    );
    Ok((tables, report))
}
