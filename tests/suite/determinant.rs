use detscan_engine::detscan_eval::{EvalError, ExprError};
use detscan_engine::{
    CellLabel, CoefficientSet, Determinant, MatrixOrder, evaluate_determinant,
};

use crate::common::{assert_close, evaluator};

fn det(order: u8, coefficients: &CoefficientSet, v: f64) -> f64 {
    evaluate_determinant(&evaluator(), order, coefficients, v).expect("determinant evaluates")
}

#[test]
fn order_one_constant() {
    let coefficients = CoefficientSet::new().with(CellLabel::R11, "2");
    for v in [0.0, 0.5, 3.0, 6.2] {
        assert_close(det(1, &coefficients, v), 2.0);
    }
}

#[test]
fn order_two_identity() {
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "1")
        .with(CellLabel::R12, "0")
        .with(CellLabel::R22, "1");
    for v in [0.1, 1.0, 5.0] {
        assert_close(det(2, &coefficients, v), 1.0);
    }
}

#[test]
fn order_three_uses_mirrored_entries() {
    // [[2, 1, 0], [1, 3, 1], [0, 1, 4]]
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "2")
        .with(CellLabel::R12, "1")
        .with(CellLabel::R13, "0")
        .with(CellLabel::R22, "3")
        .with(CellLabel::R23, "1")
        .with(CellLabel::R33, "4");
    assert_close(det(3, &coefficients, 0.7), 18.0);
}

#[test]
fn order_two_tracks_v() {
    // (v)(v) - 1
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "v")
        .with(CellLabel::R12, "1")
        .with(CellLabel::R22, "v");
    assert_close(det(2, &coefficients, 2.0), 3.0);
    assert_close(det(2, &coefficients, 0.5), -0.75);
}

#[test]
fn unsupported_orders_are_zero() {
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "5")
        .with(CellLabel::R22, "7")
        .with(CellLabel::R33, "not an expression (");
    assert_close(det(0, &coefficients, 1.0), 0.0);
    assert_close(det(4, &coefficients, 1.0), 0.0);
}

#[test]
fn unread_cells_are_ignored() {
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "3")
        .with(CellLabel::R33, "undefined_thing(v)");
    assert_close(det(1, &coefficients, 1.0), 3.0);
}

#[test]
fn blank_cells_read_as_zero() {
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "4")
        .with(CellLabel::R12, "   ")
        .with(CellLabel::R22, "v");
    assert_close(det(2, &coefficients, 2.5), 10.0);
}

#[test]
fn domain_functions_are_available() {
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "phi1(v)")
        .with(CellLabel::R12, "eta2(v)")
        .with(CellLabel::R22, "eta2(v) * eta2(v) / phi1(v)");
    assert!(det(1, &coefficients, 1.0) > 0.9);
    assert_close(det(2, &coefficients, 1.0), 0.0);
}

#[test]
fn failures_name_the_cell_and_point() {
    let coefficients = CoefficientSet::new()
        .with(CellLabel::R11, "1")
        .with(CellLabel::R22, "sqrt(-v)");
    let determinant = Determinant::compile(
        &evaluator(),
        MatrixOrder::Two.as_u8(),
        &coefficients,
    )
    .expect("compiles");

    let err = determinant.evaluate(2.0).expect_err("sqrt of negative");
    assert_eq!(err.cell, CellLabel::R22);
    assert_eq!(err.at, Some(2.0));
    assert!(matches!(err.source, ExprError::Eval(EvalError::NonFinite(_))));
    assert!(err.to_string().starts_with("r22 at v = 2.0000"), "{err}");
}

#[test]
fn parse_errors_surface_at_compile_time() {
    let coefficients = CoefficientSet::new().with(CellLabel::R11, "v +");
    let err = Determinant::compile(&evaluator(), 1, &coefficients).expect_err("bad syntax");
    assert_eq!(err.cell, CellLabel::R11);
    assert_eq!(err.at, None);
    assert!(matches!(err.source, ExprError::Parse(_)));
}
