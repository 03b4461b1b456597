use detscan_engine::detscan_eval::{EvalError, ExprError};
use detscan_engine::{
    CellLabel, CoefficientSet, DOMAIN_END, Determinant, MatrixOrder, PlotBuffer, PlotSink,
    Precision, SampleBatch, ScanSession, ScanState, Status,
};

use crate::common::{app, assert_close, evaluator, run_to_end};

#[test]
fn cosine_root_is_reported_at_step_precision() {
    let mut app = app();
    app.set_coefficient(CellLabel::R11, "cos(v)");
    app.toggle_full_graph();
    assert!(app.calculate());

    run_to_end(&mut app);

    assert_eq!(app.status(), &Status::Finished(ScanState::StoppedByRoot));
    // |cos(1.57)| < |cos(1.58)|, so the earlier sample wins.
    assert_eq!(app.report().root_text().as_deref(), Some("1.57"));
    assert_eq!(app.report().last_determinant_text().as_deref(), Some("-0.0092"));
    let last = app.plot().last().expect("samples");
    assert!(last.v < 1.8, "stopped at the end of the root tick, got {}", last.v);
}

#[test]
fn full_graph_keeps_sampling_after_the_root() {
    let mut app = app();
    app.set_coefficient(CellLabel::R11, "cos(v)");
    assert!(app.form().full_graph());
    assert!(app.calculate());

    let frames = run_to_end(&mut app);

    assert_eq!(app.status(), &Status::Finished(ScanState::StoppedByDomain));
    // Bounded by 2π / 0.1 frames.
    assert!((55..=63).contains(&frames), "{frames}");
    assert_eq!(app.report().root_text().as_deref(), Some("1.57"));
    // Frozen at the sample that revealed the sign change.
    assert_eq!(app.report().last_determinant_text().as_deref(), Some("-0.0092"));
    let last = app.plot().last().expect("samples");
    assert!(last.v > DOMAIN_END - 0.02 && last.v < DOMAIN_END, "{}", last.v);
}

#[test]
fn no_sign_change_exhausts_domain() {
    let mut app = app();
    app.set_order(MatrixOrder::Two);
    app.set_coefficient(CellLabel::R11, "2 + sin(v)");
    app.set_coefficient(CellLabel::R12, "1");
    app.set_coefficient(CellLabel::R22, "2");
    app.set_precision(Precision::new(1).expect("precision"));
    assert!(app.calculate());

    run_to_end(&mut app);

    assert_eq!(app.status(), &Status::Finished(ScanState::StoppedByDomain));
    assert_eq!(app.report().root, None);
    assert_eq!(app.report().root_text(), None);
    assert!((62..=63).contains(&app.plot().len()), "{}", app.plot().len());
}

#[test]
fn cancel_keeps_earlier_samples() {
    let mut app = app();
    app.set_coefficient(CellLabel::R11, "1");
    assert!(app.calculate());
    app.tick();
    app.tick();
    let before = app.plot().points().to_vec();
    assert!(!before.is_empty());

    app.stop_calculation();
    app.tick();

    assert!(app.inputs_enabled());
    assert_eq!(app.status(), &Status::Finished(ScanState::Cancelled));
    assert_eq!(app.plot().points(), before.as_slice());
}

#[test]
fn evaluation_error_mid_scan_unlocks_inputs() {
    let mut app = app();
    app.set_coefficient(CellLabel::R11, "sqrt(2 - v)");
    assert!(app.calculate());

    run_to_end(&mut app);

    assert!(app.inputs_enabled());
    let Status::Failed(err) = app.status() else {
        panic!("expected failure, got {:?}", app.status());
    };
    assert_eq!(err.cell, CellLabel::R11);
    assert!(err.at.is_some_and(|v| v > 2.0 && v < 2.02), "{err}");
    assert!(matches!(err.source, ExprError::Eval(EvalError::NonFinite(_))));
    // The failing tick's samples never reach the plot.
    let last = app.plot().last().expect("earlier ticks plotted");
    assert!(last.v <= 2.0, "{}", last.v);

    // The form is usable again.
    app.set_coefficient(CellLabel::R11, "v - 3");
    assert!(app.calculate());
}

#[test]
fn session_drives_any_plot_sink() {
    #[derive(Default)]
    struct Counting {
        resets: usize,
        batches: Vec<usize>,
    }

    impl PlotSink for Counting {
        fn reset(&mut self) {
            self.resets += 1;
            self.batches.clear();
        }

        fn append(&mut self, batch: SampleBatch) {
            self.batches.push(batch.len());
        }
    }

    let coefficients = CoefficientSet::new().with(CellLabel::R11, "v - 0.55");
    let determinant = Determinant::compile(&evaluator(), 1, &coefficients).expect("compiles");
    let mut session = ScanSession::new(determinant, Precision::new(2).expect("precision"), false);
    let mut sink = Counting::default();

    assert_eq!(session.run(&mut sink).expect("scan"), ScanState::StoppedByRoot);
    assert_eq!(sink.batches.len(), session.ticks() as usize);
    assert!(sink.batches.iter().all(|&n| n > 0));
    let root = session.root().expect("root");
    assert!(root > 0.545 && root < 0.565, "{root}");

    sink.reset();
    assert!(sink.batches.is_empty());
    assert_eq!(sink.resets, 1);
}

#[test]
fn reset_without_appends_leaves_plot_empty() {
    let mut plot = PlotBuffer::new();
    plot.reset();
    plot.reset();
    assert!(plot.is_empty());
    assert_eq!(plot.last(), None);
}

#[test]
fn restart_replaces_running_scan() {
    let mut app = app();
    app.set_coefficient(CellLabel::R11, "1");
    assert!(app.calculate());
    app.tick();
    assert!(!app.plot().is_empty());

    assert!(app.calculate());
    assert!(app.plot().is_empty());
    assert_close(app.report().progress, 0.0);
    run_to_end(&mut app);
    assert_eq!(app.status(), &Status::Finished(ScanState::StoppedByDomain));
}
