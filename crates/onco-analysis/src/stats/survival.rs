//! Kaplan-Meier step-curve semantics.
//!
//! A KM curve is right-continuous: the survival value observed at one time
//! holds until just before the next observed time, where it drops.

use crate::types::KmPoint;

/// Sort observations by time ascending. Stable for equal times.
pub fn sort_by_time(points: &mut [KmPoint]) {
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// A step-after survival function over time-sorted observations.
#[derive(Debug, Clone, Copy)]
pub struct StepCurve<'a> {
    points: &'a [KmPoint],
}

impl<'a> StepCurve<'a> {
    /// Wrap observations that are already sorted by time.
    pub fn new(points: &'a [KmPoint]) -> Self {
        Self { points }
    }

    /// Survival probability at `time`.
    ///
    /// Before the first observation the curve is at 1.0; afterwards it holds
    /// the value of the latest observation at or before `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.time <= time);
        if idx == 0 {
            1.0
        } else {
            self.points[idx - 1].survival
        }
    }

    /// Largest observed time, if any.
    pub fn max_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.time)
    }

    pub fn points(&self) -> &'a [KmPoint] {
        self.points
    }
}

/// Polyline vertices tracing a step-after curve through `(x, y)` points:
/// horizontal to the next x at the previous y, then vertical to the next y.
pub fn step_after_vertices(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(points.len() * 2);
    let mut iter = points.iter();
    let Some(&first) = iter.next() else {
        return out;
    };
    out.push(first);

    let mut prev_y = first.1;
    for &(x, y) in iter {
        out.push((x, prev_y));
        out.push((x, y));
        prev_y = y;
    }
    out
}
