//! Names every expression can use without registration.
//!
//! `meval` provides the elementary functions (`sin`, `sqrt`, `ln`, `atan2`,
//! `min`, `max`, ...) and the constants `pi` and `e`. The additions here fill
//! in the spellings coefficient formulas are usually written with.

use std::f64::consts::{E, PI, TAU};

use meval::{Context, ContextProvider, FuncEvalError};

/// Constants added on top of `pi` and `e`.
const CONSTANTS: [(&str, f64); 3] = [("PI", PI), ("E", E), ("tau", TAU)];

const UNARY: [(&str, fn(f64) -> f64); 8] = [
    ("cot", cot),
    ("sec", sec),
    ("csc", csc),
    ("log", f64::ln),
    ("log10", f64::log10),
    ("log2", f64::log2),
    ("cbrt", f64::cbrt),
    ("sign", sign),
];

const BINARY: [(&str, fn(f64, f64) -> f64); 2] = [("pow", f64::powf), ("mod", modulo)];

fn cot(x: f64) -> f64 {
    x.tan().recip()
}

fn sec(x: f64) -> f64 {
    x.cos().recip()
}

fn csc(x: f64) -> f64 {
    x.sin().recip()
}

/// `-1`, `0` or `1`; unlike `signum`, zero maps to zero.
fn sign(x: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x.signum() }
}

/// Floored modulo: the result takes the sign of the divisor.
fn modulo(x: f64, y: f64) -> f64 {
    if y == 0.0 { x } else { x - y * (x / y).floor() }
}

/// Context holding every built-in function and constant.
pub(crate) fn context() -> Context<'static> {
    let mut context = Context::new();
    for (name, value) in CONSTANTS {
        context.var(name, value);
    }
    for (name, function) in UNARY {
        context.func(name, function);
    }
    for (name, function) in BINARY {
        context.func2(name, function);
    }
    context
}

/// Whether `name` already means something in every expression.
#[must_use]
pub(crate) fn is_builtin(name: &str) -> bool {
    let context = context();
    context.get_var(name).is_some()
        || !matches!(
            context.eval_func(name, &[]),
            Err(FuncEvalError::UnknownFunction)
        )
}
