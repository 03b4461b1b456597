//! Persisted form input.
//!
//! The on-disk shape is fixed by earlier releases of the tool:
//!
//! ```json
//! {"coefficients":{"11":"phi1(v)","12":null},"size":2,"approximation":2,"fullgraph":true}
//! ```
//!
//! Every field is optional and unknown cells are ignored, so a partially
//! written or hand-edited snapshot still restores whatever it can.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CellLabel, CoefficientSet, MatrixOrder, Precision};

/// Storage key the snapshot is saved under.
pub const SNAPSHOT_STORAGE_KEY: &str = "appMechanics3";

#[derive(Debug, Default, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    coefficients: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    approximation: Option<f64>,
    #[serde(default)]
    fullgraph: Option<bool>,
}

/// Saved form state. `None` fields keep the form's current value on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSnapshot")]
pub struct InputSnapshot {
    pub coefficients: CoefficientSet,
    pub size: Option<MatrixOrder>,
    pub approximation: Option<Precision>,
    pub fullgraph: Option<bool>,
}

impl From<RawSnapshot> for InputSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        let coefficients = raw
            .coefficients
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(label, text)| {
                let cell = label.parse::<CellLabel>().ok()?;
                Some((cell, text?))
            })
            .collect();

        Self {
            coefficients,
            size: raw.size.and_then(small_integer).and_then(MatrixOrder::from_raw),
            approximation: raw
                .approximation
                .and_then(small_integer)
                .and_then(|digits| Precision::new(digits).ok()),
            fullgraph: raw.fullgraph,
        }
    }
}

// Numbers arrive as JSON numbers (possibly `2.0`); anything fractional or out of range is dropped.
fn small_integer(value: f64) -> Option<u8> {
    (value.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&value)).then_some(value as u8)
}
