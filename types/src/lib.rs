//! Core domain types for detscan.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod snapshot;
pub use snapshot::{InputSnapshot, SNAPSHOT_STORAGE_KEY};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::{slice, vec};
use thiserror::Error;

// ============================================================================
// Coefficient cells
// ============================================================================

/// One entry of the upper triangle of the symmetric coefficient matrix.
///
/// The lower triangle is never stored: `r21 = r12`, `r31 = r13`, `r32 = r23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CellLabel {
    R11,
    R12,
    R13,
    R22,
    R23,
    R33,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown coefficient cell `{0}` (expected one of 11, 12, 13, 22, 23, 33)")]
pub struct CellLabelError(String);

impl CellLabel {
    pub const ALL: [Self; 6] = [
        Self::R11,
        Self::R12,
        Self::R13,
        Self::R22,
        Self::R23,
        Self::R33,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::R11 => "11",
            Self::R12 => "12",
            Self::R13 => "13",
            Self::R22 => "22",
            Self::R23 => "23",
            Self::R33 => "33",
        }
    }
}

impl fmt::Display for CellLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellLabel {
    type Err = CellLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s.trim())
            .ok_or_else(|| CellLabelError(s.to_string()))
    }
}

impl TryFrom<String> for CellLabel {
    type Error = CellLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellLabel> for String {
    fn from(value: CellLabel) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Matrix order
// ============================================================================

/// Order of the symmetric coefficient matrix.
///
/// Raw orders outside `1..=3` are not representable here; the determinant
/// assembler handles them separately as an all-zero determinant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MatrixOrder {
    #[default]
    One,
    Two,
    Three,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("unsupported matrix order {0} (expected 1, 2 or 3)")]
pub struct MatrixOrderError(pub u8);

impl MatrixOrder {
    pub const ALL: [Self; 3] = [Self::One, Self::Two, Self::Three];

    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Cells read by the determinant formula of this order, in row-major order.
    #[must_use]
    pub const fn cells(self) -> &'static [CellLabel] {
        match self {
            Self::One => &[CellLabel::R11],
            Self::Two => &[CellLabel::R11, CellLabel::R12, CellLabel::R22],
            Self::Three => &CellLabel::ALL,
        }
    }

    #[must_use]
    pub fn contains(self, cell: CellLabel) -> bool {
        self.cells().contains(&cell)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::Three,
            Self::Three => Self::One,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::One => Self::Three,
            Self::Two => Self::One,
            Self::Three => Self::Two,
        }
    }
}

impl fmt::Display for MatrixOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.as_u8();
        write!(f, "{n}×{n}")
    }
}

impl TryFrom<u8> for MatrixOrder {
    type Error = MatrixOrderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or(MatrixOrderError(value))
    }
}

impl From<MatrixOrder> for u8 {
    fn from(value: MatrixOrder) -> Self {
        value.as_u8()
    }
}

// ============================================================================
// Coefficient set
// ============================================================================

/// Expression used for cells that were never set or are blank.
pub const DEFAULT_EXPRESSION: &str = "0";

/// Per-cell coefficient expressions in the variable `v`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoefficientSet {
    cells: BTreeMap<CellLabel, String>,
}

impl CoefficientSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text as typed, empty when the cell was never set.
    #[must_use]
    pub fn raw(&self, cell: CellLabel) -> &str {
        self.cells.get(&cell).map_or("", String::as_str)
    }

    /// Expression to evaluate for `cell`; blank cells read as `"0"`.
    #[must_use]
    pub fn expression(&self, cell: CellLabel) -> &str {
        match self.cells.get(&cell) {
            Some(text) if !text.trim().is_empty() => text,
            _ => DEFAULT_EXPRESSION,
        }
    }

    pub fn set(&mut self, cell: CellLabel, text: impl Into<String>) {
        self.cells.insert(cell, text.into());
    }

    #[must_use]
    pub fn with(mut self, cell: CellLabel, text: impl Into<String>) -> Self {
        self.set(cell, text);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellLabel, &str)> {
        self.cells.iter().map(|(cell, text)| (*cell, text.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(CellLabel, S)> for CoefficientSet {
    fn from_iter<I: IntoIterator<Item = (CellLabel, S)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(cell, text)| (cell, text.into()))
                .collect(),
        }
    }
}

// ============================================================================
// Precision
// ============================================================================

/// Number of decimal places of the scan step, `Δ = 10^(-precision)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Precision(u8);

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("precision {0} out of range (expected {min}..={max})", min = Precision::MIN, max = Precision::MAX)]
pub struct PrecisionError(pub u8);

impl Precision {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(digits: u8) -> Result<Self, PrecisionError> {
        if (Self::MIN..=Self::MAX).contains(&digits) {
            Ok(Self(digits))
        } else {
            Err(PrecisionError(digits))
        }
    }

    #[must_use]
    pub const fn digits(self) -> u8 {
        self.0
    }

    /// Scan step `10^(-digits)`.
    #[must_use]
    pub fn step(self) -> f64 {
        10f64.powi(-i32::from(self.0))
    }

    /// Format `value` with as many decimals as this precision.
    #[must_use]
    pub fn format(self, value: f64) -> String {
        format!("{value:.prec$}", prec = usize::from(self.0))
    }

    #[must_use]
    pub fn increment(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }

    #[must_use]
    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for Precision {
    type Error = PrecisionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Precision> for u8 {
    fn from(value: Precision) -> Self {
        value.0
    }
}

// ============================================================================
// Samples
// ============================================================================

/// One point of the determinant curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub v: f64,
    pub determinant: f64,
}

impl Sample {
    #[must_use]
    pub const fn new(v: f64, determinant: f64) -> Self {
        Self { v, determinant }
    }
}

impl From<Sample> for (f64, f64) {
    fn from(sample: Sample) -> Self {
        (sample.v, sample.determinant)
    }
}

/// Samples produced by a single scan tick, in emission order.
///
/// Moved into the plot sink as a whole; the producer keeps no copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBatch(Vec<Sample>);

impl SampleBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, sample: Sample) {
        self.0.push(sample);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Sample> {
        self.0.iter()
    }
}

impl IntoIterator for SampleBatch {
    type Item = Sample;
    type IntoIter = vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Sample> for SampleBatch {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
