//! Core engine for detscan - determinant scanning and application state.
//!
//! This crate contains the App state machine without TUI dependencies.

mod app;
mod config;
mod determinant;
mod form;
mod input;
mod persistence;
mod plot;
mod scanner;
mod validation;

pub use app::{App, Direction, INSERTABLE_FUNCTIONS, ScanReport, Status};
pub use config::{
    AppConfig, ConfigError, DetscanConfig, ScanConfig, StorageConfig, UiOptions,
};
pub use determinant::{Determinant, EvaluationError, evaluate_determinant};
pub use form::{CoefficientField, Focus, Form, FormDefaults};
pub use input::DraftInput;
pub use persistence::{SnapshotError, SnapshotStore};
pub use plot::{PLOT_X_BOUNDS, PLOT_Y_BOUNDS, PlotBuffer, PlotSink};
pub use scanner::{DOMAIN_END, Sampler, ScanSession, ScanState, TICK_SPAN};
pub use validation::{CellCheck, VALIDATION_POINT, check_expression};

// Re-export for callers that only depend on the engine
pub use detscan_eval::{self, Evaluator, ExprError};
pub use detscan_types::{
    self, CellLabel, CoefficientSet, InputSnapshot, MatrixOrder, Precision, Sample, SampleBatch,
};
