use moldtrack_core::db::open_db_in_memory;
use moldtrack_core::events::ChangeKind;
use moldtrack_core::model::activity::COMMENT_MAX_CHARS;
use moldtrack_core::model::asset::{Cutter, Mold};
use moldtrack_core::model::reference::{Company, Employee, RackLayer};
use moldtrack_core::{
    ActionError, ActionService, ActivityRecord, Actor, AssetKey, Catalog, JoinOptions, RawTables,
    SqliteActivityRepository, SqliteTableRepository, TableRepository, TeflonStatus,
};
use rusqlite::Connection;

type Service<'conn> = ActionService<SqliteTableRepository<'conn>, SqliteActivityRepository<'conn>>;

fn seed(conn: &Connection) {
    let mut mold = Mold::new("M1");
    mold.rack_layer_id = Some("L1".to_string());
    mold.storage_company_id = Some("1".to_string());
    let mut cutter = Cutter::new("C1");
    cutter.rack_layer_id = Some("L1".to_string());

    let tables = RawTables {
        molds: vec![mold],
        cutters: vec![cutter],
        rack_layers: vec![RackLayer::new("L1", "R1"), RackLayer::new("L2", "R1")],
        companies: vec![Company::new("1", "Home"), Company::new("2", "Partner")],
        employees: vec![Employee::new("E1", "Operator")],
        ..RawTables::default()
    };
    SqliteTableRepository::new(conn)
        .replace_tables(&tables)
        .unwrap();
}

fn service(conn: &Connection) -> Service<'_> {
    ActionService::new(
        SqliteTableRepository::new(conn),
        SqliteActivityRepository::new(conn),
    )
    .with_home_company(Some(" 1 ".to_string()))
}

fn actor(at: i64) -> Actor {
    Actor::new("E1").at(at)
}

#[test]
fn update_location_moves_asset_and_logs_previous_layer() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let actions = service(&conn);
    let mold = AssetKey::mold("M1");

    let receipt = actions
        .update_location(&mold, " L2 ", &actor(10).with_note(Some("restock".to_string())))
        .unwrap();
    assert_eq!(receipt.change, ChangeKind::Location);
    assert_eq!(receipt.occurred_at, 10);

    let stored = SqliteTableRepository::new(&conn).get_mold("M1").unwrap().unwrap();
    assert_eq!(stored.rack_layer_id.as_deref(), Some("L2"));

    let history = actions.history(&mold).unwrap();
    match history.as_slice() {
        [ActivityRecord::Location(log)] => {
            assert_eq!(log.from_layer_id.as_deref(), Some("L1"));
            assert_eq!(log.to_layer_id, "L2");
            assert_eq!(log.employee_id, "E1");
            assert_eq!(log.note.as_deref(), Some("restock"));
        }
        other => panic!("unexpected history: {other:?}"),
    }
}

#[test]
fn rejected_requests_leave_data_unchanged() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let actions = service(&conn);
    let mold = AssetKey::mold("M1");

    let err = actions.update_location(&mold, "L9", &actor(1)).unwrap_err();
    assert!(matches!(err, ActionError::RackLayerNotFound(ref id) if id == "L9"));

    let err = actions
        .update_location(&mold, "L2", &Actor::new("   "))
        .unwrap_err();
    assert!(matches!(err, ActionError::BlankEmployee));

    let err = actions.check_in(&mold, &Actor::new("E404")).unwrap_err();
    assert!(matches!(err, ActionError::EmployeeNotFound(ref id) if id == "E404"));

    let err = actions
        .check_in(&AssetKey::mold("M404"), &actor(1))
        .unwrap_err();
    assert!(matches!(err, ActionError::AssetNotFound(_)));

    let err = actions.ship(&mold, "77", &actor(1)).unwrap_err();
    assert!(matches!(err, ActionError::CompanyNotFound(_)));

    let stored = SqliteTableRepository::new(&conn).get_mold("M1").unwrap().unwrap();
    assert_eq!(stored.rack_layer_id.as_deref(), Some("L1"));
    assert_eq!(stored.storage_company_id.as_deref(), Some("1"));
    assert!(actions.history(&mold).unwrap().is_empty());
}

#[test]
fn check_in_and_out_drive_catalog_status() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let actions = service(&conn);
    let cutter = AssetKey::cutter("C1");

    actions.check_out(&cutter, &actor(100)).unwrap();
    actions.check_in(&cutter, &actor(200)).unwrap();

    let tables = SqliteTableRepository::new(&conn).load_tables().unwrap();
    let catalog = Catalog::build(&tables, JoinOptions::default());
    assert_eq!(catalog.get(&cutter).unwrap().status, "check_in");

    let history = actions.history(&cutter).unwrap();
    let times: Vec<_> = history.iter().map(ActivityRecord::occurred_at).collect();
    assert_eq!(times, vec![200, 100]);
}

#[test]
fn ship_records_shipped_then_returned_for_home_company() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let actions = service(&conn);
    let mold = AssetKey::mold("M1");

    actions.ship(&mold, "2", &actor(100)).unwrap();
    let stored = SqliteTableRepository::new(&conn).get_mold("M1").unwrap().unwrap();
    assert_eq!(stored.storage_company_id.as_deref(), Some("2"));

    actions.ship(&mold, "1", &actor(200)).unwrap();

    let tables = SqliteTableRepository::new(&conn).load_tables().unwrap();
    let options = JoinOptions {
        home_company_id: Some("1".to_string()),
    };
    let view = Catalog::build(&tables, options).get(&mold).cloned().unwrap();
    assert_eq!(view.status, "returned");
    assert_eq!(view.company, "Home");
    assert!(!view.is_external);

    let statuses: Vec<_> = tables
        .status_logs
        .iter()
        .map(|log| log.status.as_str())
        .collect();
    assert_eq!(statuses, vec!["shipped", "returned"]);

    let history = actions.history(&mold).unwrap();
    assert_eq!(history.len(), 4);
    assert!(history
        .iter()
        .all(|record| record.occurred_at() == 200 || record.occurred_at() == 100));
    assert_eq!(history[0].occurred_at(), 200);
}

#[test]
fn comments_are_trimmed_and_bounded() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let actions = service(&conn);
    let mold = AssetKey::mold("M1");

    let err = actions.add_comment(&mold, "   ", &actor(1)).unwrap_err();
    assert!(matches!(err, ActionError::BlankField(_)));

    let long = "x".repeat(COMMENT_MAX_CHARS + 1);
    let err = actions.add_comment(&mold, &long, &actor(1)).unwrap_err();
    assert!(matches!(err, ActionError::CommentTooLong { .. }));

    let exact = format!("  {}  ", "y".repeat(COMMENT_MAX_CHARS));
    actions.add_comment(&mold, &exact, &actor(2)).unwrap();
    actions.add_comment(&mold, " needs polish ", &actor(3)).unwrap();

    let history = actions.history(&mold).unwrap();
    match history.first() {
        Some(ActivityRecord::Comment(comment)) => assert_eq!(comment.body, "needs polish"),
        other => panic!("unexpected history head: {other:?}"),
    }
    assert_eq!(history.len(), 2);
}

#[test]
fn teflon_updates_apply_to_molds_only() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let actions = service(&conn);

    let err = actions
        .set_teflon(&AssetKey::cutter("C1"), TeflonStatus::Sent, &actor(1))
        .unwrap_err();
    assert!(matches!(err, ActionError::TeflonNotApplicable(_)));

    let receipt = actions
        .set_teflon(&AssetKey::mold("M1"), TeflonStatus::Coated, &actor(5))
        .unwrap();
    assert_eq!(receipt.change, ChangeKind::Teflon);

    let stored = SqliteTableRepository::new(&conn).get_mold("M1").unwrap().unwrap();
    assert_eq!(stored.teflon_status.as_deref(), Some("coated"));

    let history = actions.history(&AssetKey::mold("M1")).unwrap();
    assert!(matches!(
        history.as_slice(),
        [ActivityRecord::Teflon(log)] if log.status == TeflonStatus::Coated
    ));
}

#[test]
fn history_of_unknown_asset_is_an_error() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let err = service(&conn)
        .history(&AssetKey::cutter("C404"))
        .unwrap_err();
    assert!(matches!(err, ActionError::AssetNotFound(_)));
}
