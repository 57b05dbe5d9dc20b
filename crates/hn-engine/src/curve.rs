//! Objective value trace of a timed execution and its area under the curve.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use hn_types::ObjectiveDirection;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Which objective trace to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Best objective value seen so far, a monotone step function.
    BestObjective,
    /// Every reported objective value.
    CurrentObjective,
}

/// One point of a trace: elapsed time since the last reset and the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSample {
    pub elapsed_nanos: u64,
    pub value: f64,
}

/// Records objective values against elapsed wall clock time.
///
/// Disabled recorders ignore every sample, so algorithms can report
/// unconditionally.
#[derive(Debug, Clone)]
pub struct ObjectiveCurve {
    direction: ObjectiveDirection,
    enabled: bool,
    origin: Instant,
    best: Vec<ObjectiveSample>,
    current: Vec<ObjectiveSample>,
}

impl ObjectiveCurve {
    pub fn new(direction: ObjectiveDirection) -> Self {
        Self {
            direction,
            enabled: false,
            origin: Instant::now(),
            best: Vec::new(),
            current: Vec::new(),
        }
    }

    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drop every sample and restart the clock.
    pub fn reset(&mut self) {
        self.best.clear();
        self.current.clear();
        self.origin = Instant::now();
    }

    /// Record `value` at the current elapsed time.
    pub fn record(&mut self, value: f64) {
        let elapsed = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.record_at(elapsed, value);
    }

    /// Record `value` at an explicit elapsed time. Samples older than the
    /// latest one are moved forward to keep the trace ordered.
    pub fn record_at(&mut self, elapsed_nanos: u64, value: f64) {
        if !self.enabled || value.is_nan() {
            return;
        }
        let elapsed_nanos = self
            .current
            .last()
            .map(|last| last.elapsed_nanos.max(elapsed_nanos))
            .unwrap_or(elapsed_nanos);

        let sample = ObjectiveSample {
            elapsed_nanos,
            value,
        };
        self.current.push(sample);

        let improves = match self.best.last() {
            None => true,
            Some(incumbent) => self.direction.improves(value, incumbent.value),
        };
        if improves {
            self.best.push(sample);
        }
    }

    pub fn samples(&self, kind: MetricKind) -> &[ObjectiveSample] {
        match kind {
            MetricKind::BestObjective => &self.best,
            MetricKind::CurrentObjective => &self.current,
        }
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best.last().map(|sample| sample.value)
    }

    /// Integral of the step function of `kind` over `[from_nanos, to_nanos]`,
    /// scaled to value x milliseconds.
    ///
    /// Samples outside the window are clipped. The value in force at
    /// `from_nanos` is the last sample at or before it. A trace that has no
    /// sample yet at `from_nanos` is charged the worst value of its direction
    /// for the gap, so the area is infinite. Returns `None` when nothing was
    /// recorded.
    pub fn area_under_curve(&self, kind: MetricKind, from_nanos: u64, to_nanos: u64) -> Option<f64> {
        let samples = self.samples(kind);
        let first = samples.first()?;
        if to_nanos <= from_nanos {
            return Some(0.0);
        }
        if first.elapsed_nanos > from_nanos {
            return Some(self.direction.worst());
        }

        let mut value = samples
            .iter()
            .take_while(|s| s.elapsed_nanos <= from_nanos)
            .last()
            .unwrap_or(first)
            .value;
        let mut cursor = from_nanos;
        let mut area = 0.0;

        for sample in samples
            .iter()
            .skip_while(|s| s.elapsed_nanos <= from_nanos)
            .take_while(|s| s.elapsed_nanos < to_nanos)
        {
            area += value * (sample.elapsed_nanos - cursor) as f64;
            cursor = sample.elapsed_nanos;
            value = sample.value;
        }
        area += value * (to_nanos - cursor) as f64;

        Some(area / NANOS_PER_MILLI)
    }
}
