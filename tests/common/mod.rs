//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use detscan_engine::{App, CellLabel, Evaluator, FormDefaults, SnapshotStore};

pub fn evaluator() -> Arc<Evaluator> {
    Arc::new(Evaluator::with_domain_functions().expect("domain functions register"))
}

/// App with default settings and no persistence.
pub fn app() -> App {
    App::with_evaluator(evaluator(), FormDefaults::default(), None)
}

/// App whose snapshot lives in `dir`.
pub fn app_in(dir: &Path) -> App {
    App::with_evaluator(
        evaluator(),
        FormDefaults::default(),
        Some(SnapshotStore::in_dir(dir)),
    )
}

/// Tick until the scan stops. Returns the number of frames it took.
pub fn run_to_end(app: &mut App) -> usize {
    let mut frames = 0;
    while app.is_calculating() {
        app.tick();
        frames += 1;
        assert!(frames < 1000, "scan did not terminate");
    }
    frames
}

pub fn cell_text(app: &App, cell: CellLabel) -> String {
    app.form()
        .field(cell)
        .map(|field| field.input().text().to_string())
        .unwrap_or_default()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
