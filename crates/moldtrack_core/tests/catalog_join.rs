use moldtrack_core::catalog::{Catalog, JoinOptions, PLACEHOLDER, STATUS_PLACEHOLDER};
use moldtrack_core::model::activity::{AssetStatus, StatusLog};
use moldtrack_core::model::asset::{Cutter, Mold, MoldCutterLink};
use moldtrack_core::model::reference::{Company, MoldDesign, Rack, RackLayer};
use moldtrack_core::{AssetKey, AssetKind, RawTables};

fn sample_tables() -> RawTables {
    let mut design = MoldDesign::new("D1");
    design.design_code = Some("TRAY-200".to_string());
    design.length = Some(200.0);
    design.width = Some(150.5);
    design.height = Some(40.0);
    design.drawing_number = Some("DWG-7781".to_string());

    let mut rack = Rack::new("R1");
    rack.symbol = Some("A".to_string());
    rack.location = Some("Warehouse 2".to_string());

    let mut layer = RackLayer::new("L1", "R1");
    layer.layer_number = Some("3".to_string());

    let mut mold = Mold::new("M1");
    mold.mold_code = Some("MC-001".to_string());
    mold.mold_name = Some("Bento tray".to_string());
    // padded foreign keys must still resolve
    mold.design_id = Some(" D1 ".to_string());
    mold.rack_layer_id = Some("L1  ".to_string());
    mold.storage_company_id = Some(" 1".to_string());
    mold.teflon_status = Some("Done".to_string());

    let mut orphan = Mold::new("M2");
    orphan.design_id = Some("missing".to_string());
    orphan.rack_layer_id = Some("nowhere".to_string());
    orphan.storage_company_id = Some("99".to_string());

    let mut cutter = Cutter::new("C1");
    cutter.cutter_no = Some("CT-10".to_string());
    cutter.cutline_length = Some(120.0);
    cutter.cutline_width = Some(80.0);
    cutter.rack_layer_id = Some("L1".to_string());
    cutter.storage_company_id = Some("2".to_string());

    let mut first = StatusLog::new(&AssetKey::mold("M1"), AssetStatus::CheckIn, 100);
    first.log_id = "S1".to_string();
    let mut second = StatusLog::new(&AssetKey::mold("M1"), AssetStatus::CheckOut, 200);
    second.log_id = "S2".to_string();
    let mut stale = StatusLog::new(&AssetKey::mold("M1"), AssetStatus::Shipped, 50);
    stale.log_id = "S3".to_string();

    RawTables {
        molds: vec![mold, orphan, Mold::new("   ")],
        cutters: vec![cutter],
        designs: vec![design],
        racks: vec![rack],
        rack_layers: vec![layer],
        companies: vec![Company::new("1", "YSD"), Company::new("2", "Partner")],
        employees: Vec::new(),
        mold_cutters: vec![
            MoldCutterLink::new("M1", "C1"),
            MoldCutterLink::new(" M1", "C1 "),
        ],
        status_logs: vec![first, second, stale],
    }
}

#[test]
fn join_resolves_every_reference_of_a_complete_mold() {
    let catalog = Catalog::build(&sample_tables(), JoinOptions::default());
    let view = catalog.get(&AssetKey::mold("M1")).unwrap();

    assert_eq!(view.code, "MC-001");
    assert_eq!(view.name, "Bento tray");
    assert_eq!(view.dimensions, "200 x 150.5 x 40");
    assert_eq!(view.location, "A-3 (Warehouse 2)");
    assert_eq!(view.company, "YSD");
    assert_eq!(view.status, "check_out");
    assert_eq!(view.teflon, "coated");
    assert_eq!(view.design, "TRAY-200");
    assert_eq!(view.drawing_number(), "DWG-7781");
    assert_eq!(view.related, vec![AssetKey::cutter("C1")]);
    assert!(!view.is_external);
}

#[test]
fn unresolved_references_produce_placeholders() {
    let catalog = Catalog::build(&sample_tables(), JoinOptions::default());
    let view = catalog.get(&AssetKey::mold("M2")).unwrap();

    assert_eq!(view.code, "M2");
    assert_eq!(view.name, PLACEHOLDER);
    assert_eq!(view.dimensions, PLACEHOLDER);
    assert_eq!(view.location, PLACEHOLDER);
    assert_eq!(view.company, PLACEHOLDER);
    assert_eq!(view.status, STATUS_PLACEHOLDER);
    assert_eq!(view.teflon, PLACEHOLDER);
    assert_eq!(view.design, PLACEHOLDER);
    assert!(view.related.is_empty());
    assert!(view.refs.design.is_none());
}

#[test]
fn molds_come_before_cutters_and_blank_keys_are_skipped() {
    let tables = sample_tables();
    let catalog = Catalog::build(&tables, JoinOptions::default());

    let keys: Vec<_> = catalog.views().iter().map(|view| view.key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            AssetKey::mold("M1"),
            AssetKey::mold("M2"),
            AssetKey::cutter("C1")
        ]
    );
    assert_eq!(catalog.count(AssetKind::Mold), 2);
    assert_eq!(catalog.count(AssetKind::Cutter), 1);
}

#[test]
fn cutter_view_uses_cutline_dimensions_and_links_back_to_molds() {
    let catalog = Catalog::build(&sample_tables(), JoinOptions::default());
    let view = catalog.get(&AssetKey::cutter("C1")).unwrap();

    assert_eq!(view.code, "CT-10");
    assert_eq!(view.dimensions, "120 x 80");
    assert_eq!(view.location, "A-3 (Warehouse 2)");
    assert_eq!(view.teflon, PLACEHOLDER);
    assert_eq!(view.related, vec![AssetKey::mold("M1")]);
}

#[test]
fn home_company_marks_other_companies_as_external() {
    let options = JoinOptions {
        home_company_id: Some("1".to_string()),
    };
    let catalog = Catalog::build(&sample_tables(), options);

    assert!(!catalog.get(&AssetKey::mold("M1")).unwrap().is_external);
    assert!(catalog.get(&AssetKey::cutter("C1")).unwrap().is_external);
    // unresolved company is never external
    assert!(!catalog.get(&AssetKey::mold("M2")).unwrap().is_external);
}

#[test]
fn equal_timestamps_resolve_to_the_later_status_row() {
    let mut tables = sample_tables();
    let mut tie = StatusLog::new(&AssetKey::mold("M1"), AssetStatus::Returned, 200);
    tie.log_id = "S4".to_string();
    tables.status_logs.push(tie);

    let catalog = Catalog::build(&tables, JoinOptions::default());
    assert_eq!(catalog.get(&AssetKey::mold("M1")).unwrap().status, "returned");
}

#[test]
fn rebuild_replaces_all_views() {
    let mut catalog = Catalog::build(&sample_tables(), JoinOptions::default());
    assert_eq!(catalog.len(), 3);

    let tables = RawTables {
        molds: vec![Mold::new("M9")],
        ..RawTables::default()
    };
    catalog.rebuild(&tables);

    assert_eq!(catalog.len(), 1);
    assert!(catalog.contains(&AssetKey::mold("M9")));
    assert!(!catalog.contains(&AssetKey::mold("M1")));
    assert!(!catalog.contains(&AssetKey::cutter("C1")));
}

#[test]
fn empty_tables_build_an_empty_catalog() {
    let catalog = Catalog::build(&RawTables::default(), JoinOptions::default());
    assert!(catalog.is_empty());
}

#[test]
fn blank_status_row_does_not_hide_earlier_status() {
    let mut tables = sample_tables();
    let mut blank = StatusLog::new(&AssetKey::mold("M1"), AssetStatus::CheckIn, 900);
    blank.log_id = "S5".to_string();
    blank.status = "   ".to_string();
    tables.status_logs.push(blank);

    let catalog = Catalog::build(&tables, JoinOptions::default());
    let view = catalog.get(&AssetKey::mold("M1")).unwrap();
    assert_eq!(view.status, "check_out");
    assert_eq!(view.refs.latest_status.as_ref().unwrap().log_id, "S2");
}

#[test]
fn repeated_reference_keys_resolve_to_the_first_row() {
    let mut tables = sample_tables();
    tables.companies = vec![
        Company::new("1", "YSD"),
        Company::new(" 1 ", "Impostor"),
        Company::new("1", "Later"),
    ];
    let mut shadow = MoldDesign::new("D1  ");
    shadow.design_code = Some("SHADOW".to_string());
    shadow.drawing_number = Some("DWG-0000".to_string());
    tables.designs.push(shadow);

    let catalog = Catalog::build(&tables, JoinOptions::default());
    let view = catalog.get(&AssetKey::mold("M1")).unwrap();
    assert_eq!(view.company, "YSD");
    assert_eq!(view.design, "TRAY-200");
    assert_eq!(view.drawing_number(), "DWG-7781");
    assert_eq!(view.dimensions, "200 x 150.5 x 40");
}

#[test]
fn repeated_padded_key_does_not_replace_first_row() {
    let mut tables = sample_tables();
    tables.companies.insert(0, Company::new("  2 ", "First partner"));

    let catalog = Catalog::build(&tables, JoinOptions::default());
    assert_eq!(
        catalog.get(&AssetKey::cutter("C1")).unwrap().company,
        "First partner"
    );
}
