//! Destination for streamed determinant samples.

use std::f64::consts::TAU;

use detscan_types::{Sample, SampleBatch};

/// Horizontal extent of the determinant chart.
pub const PLOT_X_BOUNDS: [f64; 2] = [0.0, TAU];
/// Vertical extent of the determinant chart. Samples outside are clipped.
pub const PLOT_Y_BOUNDS: [f64; 2] = [-9.0, 9.0];

/// Receives sample batches in scan order.
pub trait PlotSink {
    /// Discard every point. Calling it twice is the same as once.
    fn reset(&mut self);

    /// Add a batch after the points already held, preserving its order.
    fn append(&mut self, batch: SampleBatch);
}

/// In-memory sink backing the chart.
#[derive(Debug, Clone, Default)]
pub struct PlotBuffer {
    points: Vec<(f64, f64)>,
    batches: usize,
}

impl PlotBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(v, determinant)` pairs in append order, the shape chart datasets take.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<Sample> {
        self.points.last().map(|&(v, determinant)| Sample::new(v, determinant))
    }

    /// Batches appended since the last reset.
    #[must_use]
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl PlotSink for PlotBuffer {
    fn reset(&mut self) {
        self.points.clear();
        self.batches = 0;
    }

    fn append(&mut self, batch: SampleBatch) {
        self.points.reserve(batch.len());
        self.points
            .extend(batch.into_iter().map(|sample| (sample.v, sample.determinant)));
        self.batches += 1;
    }
}
