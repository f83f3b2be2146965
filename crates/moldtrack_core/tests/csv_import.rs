use moldtrack_core::db::open_db_in_memory;
use moldtrack_core::import::{import_dir, read_tables_from_dir, ImportError};
use moldtrack_core::repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
use moldtrack_core::repo::table_repo::{SqliteTableRepository, TableRepository};
use moldtrack_core::model::activity::{AssetStatus, StatusLog};
use moldtrack_core::{ActionService, Actor, AssetKey, Catalog, JoinOptions, TeflonStatus};
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn write_sample_sheets(dir: &Path) {
    write(
        dir,
        "molds.csv",
        "MoldID,MoldCode,MoldName,MoldDesignID,RackLayerID,storage_company,TeflonCoating,MoldNotes\n\
         M1, MC-001 ,Bento tray,D1,L1,1,pending,fragile\n\
         ,MC-000,Nameless,,,,,\n\
         M2,MC-002,Soup cup,,L1,2,,\n\
         M1,MC-dup,Duplicate,,,,,\n",
    );
    write(
        dir,
        "cutters.csv",
        "CutterID,CutterNo,CutterName,CutlineLength,CutlineWidth,RackLayerID,storage_company,CutterNote\n\
         C1,CT-10,Lid cutter,120,80,L1,1,\n\
         C2,CT-11,Broken,wide,80,L1,1,\n",
    );
    write(
        dir,
        "molddesign.csv",
        "MoldDesignID,MoldDesignCode,MoldDesignLength,MoldDesignWidth,MoldDesignHeight,PieceCount,DrawingNumber,TrayInfoForMoldDesign\n\
         D1,TRAY-200,200,150,40,4,DWG-1,\n",
    );
    write(
        dir,
        "racks.csv",
        "RackID,RackSymbol,RackName,RackLocation\n1,A,Front rack,Hall 1\n",
    );
    write(
        dir,
        "racklayers.csv",
        "RackLayerID,RackID,RackLayerNumber,RackLayerNotes\nL1,1,2,\nL2,1,3,\n",
    );
    write(
        dir,
        "companies.csv",
        "CompanyID,CompanyShortName,CompanyName\n1,YSD,YSD Works\n2,PTN,Partner Ltd\n",
    );
    write(
        dir,
        "employees.csv",
        "EmployeeID,EmployeeName\nE1,Operator One\n",
    );
    write(dir, "moldcutter.csv", "MoldID,CutterID\nM1,C1\n");
    write(
        dir,
        "statuslogs.csv",
        "StatusLogID,MoldID,CutterID,Status,Timestamp,EmployeeID,Notes\n\
         S1,M1,,IN,1000,E1,\n\
         S2,M1,,OUT,2000,E1,\n\
         S3,,C1,IN,yesterday,E1,\n",
    );
}

#[test]
fn import_reads_sheets_and_skips_malformed_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_sheets(dir.path());

    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTableRepository::new(&conn);
    let (tables, report) = import_dir(&repo, dir.path()).unwrap();

    let molds = report.file("molds.csv").unwrap();
    assert!(molds.present);
    assert_eq!(molds.rows, 3);
    assert_eq!(molds.skipped, 1);
    assert_eq!(report.file("cutters.csv").unwrap().skipped, 1);
    assert_eq!(report.file("statuslogs.csv").unwrap().rows, 2);
    assert_eq!(report.total_skipped(), 3);
    assert_eq!(tables.molds[0].mold_code.as_deref(), Some("MC-001"));

    let stored = repo.load_tables().unwrap();
    // duplicate MoldID keeps the first row
    let ids: Vec<_> = stored.molds.iter().map(|mold| mold.mold_id.as_str()).collect();
    assert_eq!(ids, vec!["M1", "M2"]);
    assert_eq!(stored.molds[0].mold_name.as_deref(), Some("Bento tray"));
    assert_eq!(stored.cutters.len(), 1);
    assert_eq!(stored.status_logs.len(), 2);
}

#[test]
fn imported_tables_join_into_catalog() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_sheets(dir.path());

    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTableRepository::new(&conn);
    import_dir(&repo, dir.path()).unwrap();

    let catalog = Catalog::build(&repo.load_tables().unwrap(), JoinOptions::default());
    let view = catalog.get(&AssetKey::mold("M1")).unwrap();
    assert_eq!(view.location, "A-2 (Hall 1)");
    assert_eq!(view.company, "YSD");
    assert_eq!(view.status, "check_out");
    assert_eq!(view.dimensions, "200 x 150 x 40");
    assert_eq!(view.teflon, "pending");
    assert_eq!(view.notes(), "fragile");
}

#[test]
fn missing_files_yield_empty_tables() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "molds.csv", "MoldID,MoldName\nM1,Only mold\n");

    let (tables, report) = read_tables_from_dir(dir.path()).unwrap();
    assert_eq!(tables.molds.len(), 1);
    assert!(tables.cutters.is_empty());
    assert!(!report.file("cutters.csv").unwrap().present);
    assert!(!report.file("statuslogs.csv").unwrap().present);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_tables_from_dir(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, ImportError::MissingDirectory(_)));
}

#[test]
fn reimport_replaces_reference_tables_but_keeps_recorded_activity() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_sheets(dir.path());

    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTableRepository::new(&conn);
    import_dir(&repo, dir.path()).unwrap();

    let activity = SqliteActivityRepository::new(&conn);
    let mut log = StatusLog::new(&AssetKey::mold("M1"), AssetStatus::CheckIn, 5000);
    log.employee_id = Some("E1".to_string());
    activity.record_status(&log).unwrap();

    write(
        dir.path(),
        "molds.csv",
        "MoldID,MoldName\nM7,Replacement\n",
    );
    import_dir(&repo, dir.path()).unwrap();

    let stored = repo.load_tables().unwrap();
    assert_eq!(stored.molds.len(), 1);
    assert_eq!(stored.molds[0].mold_id, "M7");
    assert!(stored
        .status_logs
        .iter()
        .any(|stored_log| stored_log.log_id == log.log_id));
    assert_eq!(stored.status_logs.len(), 3);
}

#[test]
fn reimport_keeps_recorded_moves_shipments_and_teflon() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_sheets(dir.path());

    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTableRepository::new(&conn);
    import_dir(&repo, dir.path()).unwrap();

    let actions = ActionService::new(
        SqliteTableRepository::new(&conn),
        SqliteActivityRepository::new(&conn),
    );
    let mold = AssetKey::mold("M1");
    let cutter = AssetKey::cutter("C1");
    actions.update_location(&mold, "L2", &Actor::new("E1").at(10)).unwrap();
    actions.update_location(&mold, "L1", &Actor::new("E1").at(5)).unwrap();
    actions.ship(&cutter, "2", &Actor::new("E1").at(20)).unwrap();
    actions
        .set_teflon(&mold, TeflonStatus::Coated, &Actor::new("E1").at(30))
        .unwrap();

    import_dir(&repo, dir.path()).unwrap();

    // newest entry by time wins, not the last one written
    let stored = repo.get_mold("M1").unwrap().unwrap();
    assert_eq!(stored.rack_layer_id.as_deref(), Some("L2"));
    assert_eq!(stored.teflon_status.as_deref(), Some("coated"));
    assert_eq!(stored.mold_name.as_deref(), Some("Bento tray"));
    let stored = repo.get_cutter("C1").unwrap().unwrap();
    assert_eq!(stored.storage_company_id.as_deref(), Some("2"));
    // untouched assets keep the sheet values
    let untouched = repo.get_mold("M2").unwrap().unwrap();
    assert_eq!(untouched.rack_layer_id.as_deref(), Some("L1"));
    assert_eq!(untouched.storage_company_id.as_deref(), Some("2"));

    let catalog = Catalog::build(&repo.load_tables().unwrap(), JoinOptions::default());
    assert_eq!(catalog.get(&mold).unwrap().location, "A-3 (Hall 1)");
    assert_eq!(catalog.get(&cutter).unwrap().company, "PTN");
}

#[test]
fn blank_status_rows_are_skipped_on_import() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "molds.csv", "MoldID,MoldName\nM1,Tray\n");
    write(
        dir.path(),
        "statuslogs.csv",
        "StatusLogID,MoldID,CutterID,Status,Timestamp,EmployeeID,Notes\n\
         S1,M1,,IN,100,E1,\n\
         S2,M1,,   ,200,E1,\n",
    );

    let (tables, report) = read_tables_from_dir(dir.path()).unwrap();
    let statuses = report.file("statuslogs.csv").unwrap();
    assert_eq!(statuses.rows, 1);
    assert_eq!(statuses.skipped, 1);

    let catalog = Catalog::build(&tables, JoinOptions::default());
    assert_eq!(catalog.get(&AssetKey::mold("M1")).unwrap().status, "check_in");
}
