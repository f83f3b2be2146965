//! CSV sheet reader.

use super::{FileReport, ImportError, ImportReport, ImportResult};
use crate::model::activity::StatusLog;
use crate::model::asset::{Cutter, Mold, MoldCutterLink};
use crate::model::reference::{Company, Employee, MoldDesign, Rack, RackLayer};
use crate::model::tables::RawTables;
use crate::model::ModelValidationError;
use csv::{ReaderBuilder, Trim};
use log::warn;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Known sheet file names, one per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFile {
    Molds,
    Cutters,
    Designs,
    Racks,
    RackLayers,
    Companies,
    Employees,
    MoldCutters,
    StatusLogs,
}

/// Every sheet in read order.
pub const TABLE_FILES: [TableFile; 9] = [
    TableFile::Molds,
    TableFile::Cutters,
    TableFile::Designs,
    TableFile::Racks,
    TableFile::RackLayers,
    TableFile::Companies,
    TableFile::Employees,
    TableFile::MoldCutters,
    TableFile::StatusLogs,
];

impl TableFile {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Molds => "molds.csv",
            Self::Cutters => "cutters.csv",
            Self::Designs => "molddesign.csv",
            Self::Racks => "racks.csv",
            Self::RackLayers => "racklayers.csv",
            Self::Companies => "companies.csv",
            Self::Employees => "employees.csv",
            Self::MoldCutters => "moldcutter.csv",
            Self::StatusLogs => "statuslogs.csv",
        }
    }
}

/// Reads all known sheets from `dir`.
pub fn read_tables_from_dir(dir: &Path) -> ImportResult<(RawTables, ImportReport)> {
    if !dir.is_dir() {
        return Err(ImportError::MissingDirectory(dir.to_path_buf()));
    }

    let mut tables = RawTables::default();
    let mut report = ImportReport::default();

    for file in TABLE_FILES {
        let path = dir.join(file.file_name());
        let file_report = match file {
            TableFile::Molds => read_sheet(&path, file, &mut tables.molds, Mold::validate),
            TableFile::Cutters => read_sheet(&path, file, &mut tables.cutters, Cutter::validate),
            TableFile::Designs => {
                read_sheet(&path, file, &mut tables.designs, MoldDesign::validate)
            }
            TableFile::Racks => read_sheet(&path, file, &mut tables.racks, Rack::validate),
            TableFile::RackLayers => {
                read_sheet(&path, file, &mut tables.rack_layers, RackLayer::validate)
            }
            TableFile::Companies => {
                read_sheet(&path, file, &mut tables.companies, Company::validate)
            }
            TableFile::Employees => {
                read_sheet(&path, file, &mut tables.employees, Employee::validate)
            }
            TableFile::MoldCutters => read_sheet(
                &path,
                file,
                &mut tables.mold_cutters,
                MoldCutterLink::validate,
            ),
            TableFile::StatusLogs => {
                read_sheet(&path, file, &mut tables.status_logs, StatusLog::validate)
            }
        }?;
        report.files.push(file_report);
    }

    Ok((tables, report))
}

fn read_sheet<T: DeserializeOwned>(
    path: &Path,
    file: TableFile,
    out: &mut Vec<T>,
    validate: impl Fn(&T) -> Result<(), ModelValidationError>,
) -> ImportResult<FileReport> {
    let mut report = FileReport {
        file: file.file_name(),
        present: true,
        rows: 0,
        skipped: 0,
    };

    let handle = match File::open(path) {
        Ok(handle) => handle,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            report.present = false;
            return Ok(report);
        }
        Err(err) => {
            return Err(ImportError::Io {
                path: path.to_path_buf(),
                source: err,
            })
        }
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(handle);
    reader.headers().map_err(|err| ImportError::Csv {
        path: path.to_path_buf(),
        source: err,
    })?;

    for (line, record) in reader.deserialize::<T>().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(err) => {
                report.skipped += 1;
                warn!(
                    "event=import_row module=import status=skipped file={} record={} error={}",
                    report.file,
                    line + 1,
                    err
                );
                continue;
            }
        };
        if let Err(err) = validate(&row) {
            report.skipped += 1;
            warn!(
                "event=import_row module=import status=skipped file={} record={} error={}",
                report.file,
                line + 1,
                err
            );
            continue;
        }
        out.push(row);
        report.rows += 1;
    }

    Ok(report)
}
