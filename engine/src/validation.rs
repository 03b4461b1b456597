//! Per-cell checks run while the user types.

use detscan_eval::{EvalError, Evaluator, Expr, ExprError, SCAN_VARIABLE};

/// `v` at which a coefficient is test-evaluated.
pub const VALIDATION_POINT: f64 = 0.1;

/// Outcome of checking one coefficient expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CellCheck {
    /// Parses and evaluates.
    Valid { expr: Expr },
    Invalid(ExprError),
}

impl CellCheck {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, CellCheck::Valid { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExprError> {
        match self {
            CellCheck::Valid { .. } => None,
            CellCheck::Invalid(err) => Some(err),
        }
    }
}

/// Parse `text` and evaluate it at [`VALIDATION_POINT`].
///
/// A non-finite value there is accepted: the expression is well formed and
/// may have a singular point exactly at that sample. The scan reports it if it
/// lands on one.
#[must_use]
pub fn check_expression(evaluator: &Evaluator, text: &str) -> CellCheck {
    let expr = match evaluator.parse(text) {
        Ok(expr) => expr,
        Err(err) => return CellCheck::Invalid(err.into()),
    };
    match evaluator.evaluate_expr(&expr, &[(SCAN_VARIABLE, VALIDATION_POINT)]) {
        Ok(_) | Err(EvalError::NonFinite(_)) => CellCheck::Valid { expr },
        Err(err) => CellCheck::Invalid(err.into()),
    }
}
