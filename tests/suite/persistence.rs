use std::fs;

use detscan_engine::{
    App, CellLabel, DetscanConfig, InputSnapshot, MatrixOrder, SnapshotStore, Status,
};
use insta::assert_snapshot;

use crate::common::{app_in, cell_text, run_to_end};

#[test]
fn starting_a_scan_saves_the_form() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = app_in(dir.path());
    app.set_coefficient(CellLabel::R11, "v - 1");
    assert!(app.calculate());

    let saved = fs::read_to_string(dir.path().join("appMechanics3.json")).expect("snapshot file");
    assert_snapshot!(saved, @r#"{"coefficients":{"11":"v - 1"},"size":1,"approximation":2,"fullgraph":true}"#);
}

#[test]
fn invalid_form_is_not_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = app_in(dir.path());
    app.set_coefficient(CellLabel::R11, "v +");
    assert!(!app.calculate());
    assert!(!dir.path().join("appMechanics3.json").exists());
}

#[test]
fn saved_form_is_restored_on_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = app_in(dir.path());
    app.set_order(MatrixOrder::Three);
    app.set_coefficient(CellLabel::R13, "phi2(v)");
    app.set_coefficient(CellLabel::R33, "eta1(v) - 1");
    app.toggle_full_graph();
    assert!(app.calculate());
    run_to_end(&mut app);

    let restored = app_in(dir.path());
    assert_eq!(restored.form().order(), MatrixOrder::Three);
    assert!(!restored.form().full_graph());
    assert_eq!(cell_text(&restored, CellLabel::R13), "phi2(v)");
    assert_eq!(cell_text(&restored, CellLabel::R33), "eta1(v) - 1");
    assert_eq!(cell_text(&restored, CellLabel::R11), "");
    // Results are not persisted.
    assert_eq!(restored.report().root, None);
    assert_eq!(restored.status(), &Status::Ready);
}

#[test]
fn malformed_snapshot_starts_blank() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("appMechanics3.json"), "{\"coefficients\": [1, 2").expect("write");

    let app = app_in(dir.path());
    assert_eq!(app.form().order(), MatrixOrder::One);
    assert_eq!(cell_text(&app, CellLabel::R11), "");
    assert!(app.form().is_valid());
}

#[test]
fn partial_snapshot_restores_what_it_can() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("appMechanics3.json"),
        r#"{"coefficients": {"11": "2", "12": null, "44": "9"}, "size": 7, "approximation": 4}"#,
    )
    .expect("write");

    let app = app_in(dir.path());
    assert_eq!(cell_text(&app, CellLabel::R11), "2");
    assert_eq!(cell_text(&app, CellLabel::R12), "");
    assert_eq!(app.form().order(), MatrixOrder::One);
    assert_eq!(app.form().precision().digits(), 4);
    assert!(app.form().full_graph());
}

#[test]
fn legacy_json_shape_round_trips() {
    let json = r#"{"coefficients":{"11":"phi1(v)","22":"1"},"size":2,"approximation":3,"fullgraph":false}"#;
    let snapshot: InputSnapshot = serde_json::from_str(json).expect("parses");
    assert_eq!(serde_json::to_string(&snapshot).expect("encodes"), json);
}

#[test]
fn config_points_the_store_at_a_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[storage]\nsnapshot_dir = {:?}\n\n[scan]\nprecision = 1\nfull_graph = false\n",
            dir.path().join("data")
        ),
    )
    .expect("write config");

    let config = DetscanConfig::load_from(&config_path)
        .expect("valid config")
        .expect("config present");
    let store = SnapshotStore::from_config(&config).expect("store");
    assert_eq!(store.path(), dir.path().join("data").join("appMechanics3.json"));

    let mut app = App::new(&config, Some(store)).expect("app");
    assert_eq!(app.form().precision().digits(), 1);
    assert!(!app.form().full_graph());
    app.set_coefficient(CellLabel::R11, "1");
    assert!(app.calculate());
    assert!(dir.path().join("data").join("appMechanics3.json").exists());
}
