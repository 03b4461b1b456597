//! Stability functions of the displacement method for compressed members.
//!
//! `v` is the member's stability parameter. Each function tends to 1 as
//! `v -> 0`; `phi1` and `eta1` have poles where `tan(v) = v`.

use crate::evaluator::{Evaluator, RegistryError};

#[must_use]
pub fn phi1(v: f64) -> f64 {
    v.powi(2) * v.tan() / 3.0 / (v.tan() - v)
}

#[must_use]
pub fn phi2(v: f64) -> f64 {
    v * (v.tan() - v) / 8.0 / v.tan() / (half_tan(v) - v / 2.0)
}

#[must_use]
pub fn phi3(v: f64) -> f64 {
    v * (v - v.sin()) / 4.0 / v.sin() / (half_tan(v) - v / 2.0)
}

#[must_use]
pub fn phi4(v: f64) -> f64 {
    v.powi(2) * half_tan(v) / 12.0 / (half_tan(v) - v / 2.0)
}

#[must_use]
pub fn eta1(v: f64) -> f64 {
    v.powi(3) / 3.0 / (v.tan() - v)
}

#[must_use]
pub fn eta2(v: f64) -> f64 {
    v.powi(3) / 24.0 / (half_tan(v) - v / 2.0)
}

fn half_tan(v: f64) -> f64 {
    (v / 2.0).tan()
}

/// Every stability function with the name expressions call it by.
pub const DOMAIN_FUNCTIONS: [(&str, fn(f64) -> f64); 6] = [
    ("phi1", phi1),
    ("phi2", phi2),
    ("phi3", phi3),
    ("phi4", phi4),
    ("eta1", eta1),
    ("eta2", eta2),
];

impl Evaluator {
    /// Evaluator with the built-ins plus every stability function.
    pub fn with_domain_functions() -> Result<Self, RegistryError> {
        let mut evaluator = Self::new();
        for (name, function) in DOMAIN_FUNCTIONS {
            evaluator.register(name, function)?;
        }
        Ok(evaluator)
    }
}
