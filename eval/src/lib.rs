//! Real-valued expression language for determinant coefficients.
//!
//! Expressions are written over the variable `v` and parsed and evaluated
//! with `meval`. Built-in elementary functions are always available, along
//! with any functions registered on an [`Evaluator`].
//! [`Evaluator::with_domain_functions`] preloads the stability functions
//! `phi1`..`phi4`, `eta1`, `eta2`.

mod builtins;
mod domain;
mod evaluator;
mod expr;

pub use domain::{DOMAIN_FUNCTIONS, eta1, eta2, phi1, phi2, phi3, phi4};
pub use evaluator::{EvalError, Evaluator, ExprError, RegistryError, Scope};
pub use expr::{Expr, Fragment, ParseError};

/// Name of the scan variable bound during determinant evaluation.
pub const SCAN_VARIABLE: &str = "v";
