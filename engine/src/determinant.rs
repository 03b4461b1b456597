//! Determinant of the symmetric coefficient matrix as a function of `v`.

use detscan_eval::{Evaluator, Expr, ExprError, SCAN_VARIABLE, Scope};
use detscan_types::{CellLabel, CoefficientSet, MatrixOrder};
use thiserror::Error;

/// A coefficient cell failed to parse, or failed to evaluate at `at`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("r{cell}{}: {source}", at_suffix(.at.as_ref()))]
pub struct EvaluationError {
    pub cell: CellLabel,
    pub at: Option<f64>,
    #[source]
    pub source: ExprError,
}

fn at_suffix(at: Option<&f64>) -> String {
    at.map(|v| format!(" at v = {v:.4}")).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default)]
struct Cells {
    r11: f64,
    r12: f64,
    r13: f64,
    r22: f64,
    r23: f64,
    r33: f64,
}

impl Cells {
    fn set(&mut self, cell: CellLabel, value: f64) {
        let slot = match cell {
            CellLabel::R11 => &mut self.r11,
            CellLabel::R12 => &mut self.r12,
            CellLabel::R13 => &mut self.r13,
            CellLabel::R22 => &mut self.r22,
            CellLabel::R23 => &mut self.r23,
            CellLabel::R33 => &mut self.r33,
        };
        *slot = value;
    }
}

/// Closed-form determinant for `order`. Orders outside 1..=3 are 0.
fn combine(order: u8, c: &Cells) -> f64 {
    match order {
        1 => c.r11,
        2 => c.r11 * c.r22 - c.r12 * c.r12,
        // Sarrus expansion with r21 = r12, r31 = r13, r32 = r23.
        3 => {
            c.r11 * c.r22 * c.r33 + c.r12 * c.r23 * c.r13 + c.r13 * c.r12 * c.r23
                - c.r13 * c.r22 * c.r13
                - c.r12 * c.r12 * c.r33
                - c.r11 * c.r23 * c.r23
        }
        _ => 0.0,
    }
}

/// Cell expressions for one order, parsed once and evaluated per sample.
#[derive(Debug)]
pub struct Determinant {
    scope: Scope,
    order: u8,
    cells: Vec<(CellLabel, Expr)>,
}

impl Determinant {
    /// Parse every cell the order reads. Unset or blank cells read as `0`.
    /// An unsupported order compiles to a determinant that is always `0`.
    pub fn compile(
        evaluator: &Evaluator,
        order: u8,
        coefficients: &CoefficientSet,
    ) -> Result<Self, EvaluationError> {
        let relevant = MatrixOrder::from_raw(order).map_or(&[][..], MatrixOrder::cells);
        let cells = relevant
            .iter()
            .map(|&cell| {
                evaluator
                    .parse(coefficients.expression(cell))
                    .map(|expr| (cell, expr))
                    .map_err(|err| EvaluationError {
                        cell,
                        at: None,
                        source: err.into(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            scope: evaluator.scope(),
            order,
            cells,
        })
    }

    pub fn evaluate(&self, v: f64) -> Result<f64, EvaluationError> {
        let bindings = [(SCAN_VARIABLE, v)];
        let mut values = Cells::default();
        for (cell, expr) in &self.cells {
            let value = self
                .scope
                .evaluate(expr, &bindings)
                .map_err(|err| EvaluationError {
                    cell: *cell,
                    at: Some(v),
                    source: err.into(),
                })?;
            values.set(*cell, value);
        }
        Ok(combine(self.order, &values))
    }
}

/// One-shot evaluation. Scans should compile a [`Determinant`] once instead.
pub fn evaluate_determinant(
    evaluator: &Evaluator,
    order: u8,
    coefficients: &CoefficientSet,
    v: f64,
) -> Result<f64, EvaluationError> {
    Determinant::compile(evaluator, order, coefficients)?.evaluate(v)
}
