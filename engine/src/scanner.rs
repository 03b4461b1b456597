//! Tick-driven search for the first sign change of the determinant.
//!
//! A [`ScanSession`] walks `v` upward from `Δ` in steps of `Δ`. Each
//! [`tick`](ScanSession::tick) covers at most [`TICK_SPAN`] of the domain,
//! hands the samples it produced to a [`PlotSink`] and returns, so the frame
//! loop stays responsive and a cancel takes effect at the next boundary.

use std::f64::consts::TAU;

use detscan_types::{Precision, Sample, SampleBatch};
use tracing::{debug, info, warn};

use crate::determinant::{Determinant, EvaluationError};
use crate::plot::PlotSink;

/// Width of the domain slice one tick covers.
pub const TICK_SPAN: f64 = 0.1;
/// Upper bound of the scanned domain.
pub const DOMAIN_END: f64 = TAU;

/// Source of determinant values for a scan.
pub trait Sampler {
    fn sample(&mut self, v: f64) -> Result<f64, EvaluationError>;
}

impl Sampler for Determinant {
    fn sample(&mut self, v: f64) -> Result<f64, EvaluationError> {
        self.evaluate(v)
    }
}

impl<F> Sampler for F
where
    F: FnMut(f64) -> Result<f64, EvaluationError>,
{
    fn sample(&mut self, v: f64) -> Result<f64, EvaluationError> {
        self(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Running,
    StoppedByRoot,
    StoppedByDomain,
    Cancelled,
}

impl ScanState {
    #[must_use]
    pub fn is_running(self) -> bool {
        self == ScanState::Running
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScanState::Running => "running",
            ScanState::StoppedByRoot => "root found",
            ScanState::StoppedByDomain => "domain exhausted",
            ScanState::Cancelled => "cancelled",
        }
    }
}

/// One scan over `(0, 2π]`. Existence implies a scan was started; the owner
/// drops it once [`state`](Self::state) is terminal.
#[derive(Debug)]
pub struct ScanSession<S = Determinant> {
    sampler: S,
    v: f64,
    step: f64,
    domain_end: f64,
    last_determinant: f64,
    root: Option<f64>,
    full_graph: bool,
    state: ScanState,
    failure: Option<EvaluationError>,
    ticks: u32,
}

impl<S: Sampler> ScanSession<S> {
    #[must_use]
    pub fn new(sampler: S, precision: Precision, full_graph: bool) -> Self {
        let step = precision.step();
        info!(step, full_graph, "Determinant scan started");
        Self {
            sampler,
            v: step,
            step,
            domain_end: DOMAIN_END,
            last_determinant: 0.0,
            root: None,
            full_graph,
            state: ScanState::Running,
            failure: None,
            ticks: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// First crossing, once found. Never overwritten afterwards.
    #[must_use]
    pub fn root(&self) -> Option<f64> {
        self.root
    }

    /// Determinant at the most recent sample before the root was found;
    /// frozen at the crossing sample from then on.
    #[must_use]
    pub fn last_determinant(&self) -> f64 {
        self.last_determinant
    }

    /// Next `v` to be sampled.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.v
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn full_graph(&self) -> bool {
        self.full_graph
    }

    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Error that cancelled the scan, if it stopped on one.
    #[must_use]
    pub fn failure(&self) -> Option<&EvaluationError> {
        self.failure.as_ref()
    }

    /// Fraction of the domain covered so far, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        (self.v / self.domain_end).clamp(0.0, 1.0)
    }

    /// Stop a running scan. Returns false when it had already stopped.
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.state = ScanState::Cancelled;
        info!(v = self.v, "Determinant scan cancelled");
        true
    }

    /// Sample one slice of the domain and flush it to `sink`.
    ///
    /// A stopped session emits nothing. On an evaluation error the session
    /// becomes [`ScanState::Cancelled`], the samples of this tick are dropped
    /// and the error is returned.
    pub fn tick(&mut self, sink: &mut impl PlotSink) -> Result<ScanState, EvaluationError> {
        if !self.state.is_running() {
            return Ok(self.state);
        }

        let limit = (self.v + TICK_SPAN).min(self.domain_end);
        let mut batch = SampleBatch::with_capacity((TICK_SPAN / self.step).ceil() as usize + 1);
        let mut found_root = false;

        while self.v < limit {
            let determinant = match self.sampler.sample(self.v) {
                Ok(determinant) => determinant,
                Err(err) => return Err(self.fail(err)),
            };

            if self.root.is_none() {
                if self.last_determinant * determinant < 0.0 {
                    let root = if self.last_determinant.abs() < determinant.abs() {
                        self.v - self.step
                    } else {
                        self.v
                    };
                    self.root = Some(root);
                    found_root = true;
                    info!(root, "Determinant changed sign");
                }
                self.last_determinant = determinant;
            }

            batch.push(Sample::new(self.v, determinant));
            self.v += self.step;
        }

        self.ticks += 1;
        debug!(tick = self.ticks, v = self.v, samples = batch.len(), "Scan tick");
        sink.append(batch);

        if found_root && !self.full_graph {
            self.state = ScanState::StoppedByRoot;
        } else if self.v >= self.domain_end {
            self.state = ScanState::StoppedByDomain;
        }
        if !self.state.is_running() {
            info!(
                state = self.state.label(),
                root = self.root,
                ticks = self.ticks,
                "Determinant scan finished"
            );
        }
        Ok(self.state)
    }

    /// Tick until the session stops.
    pub fn run(&mut self, sink: &mut impl PlotSink) -> Result<ScanState, EvaluationError> {
        while self.state.is_running() {
            self.tick(sink)?;
        }
        Ok(self.state)
    }

    fn fail(&mut self, err: EvaluationError) -> EvaluationError {
        warn!(error = %err, "Determinant scan aborted");
        self.state = ScanState::Cancelled;
        self.failure = Some(err.clone());
        err
    }
}
