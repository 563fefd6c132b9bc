//! Cross-run axis-scale calculator.
//!
//! Plots of the same (role, metric) pair must share y-axis limits across
//! scenarios so that low/medium/high degradation levels are visually
//! comparable. This module only computes bounds; it never touches samples
//! and rendering happens elsewhere.

use std::collections::HashMap;

use serde::Serialize;

use crate::run::Role;

/// Fixed inflation applied to the extremum of a shared range.
pub const AXIS_PADDING: f64 = 0.05;

/// Shared (min, max) bounds for one metric family, consumed only by
/// rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// How a metric's shared range is anchored, chosen per metric by domain
/// knowledge of whether it can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePolicy {
    /// `(-M, +M)` where `M` is the padded maximum absolute value. For
    /// signed metrics (offsets).
    Symmetric,
    /// `(0, M)` where `M` is the padded maximum value. For metrics that
    /// are non-negative in normal output (jitter, delay, std dev).
    PositiveOnly,
}

/// Compute one shared range over the union of contributing values.
///
/// Non-finite values are excluded first. Returns `None` when no finite
/// values exist; the caller then falls back to auto-scaling.
pub fn axis_range(values: impl IntoIterator<Item = f64>, policy: ScalePolicy) -> Option<AxisRange> {
    let mut extremum: Option<f64> = None;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        let candidate = match policy {
            ScalePolicy::Symmetric => v.abs(),
            ScalePolicy::PositiveOnly => v,
        };
        extremum = Some(match extremum {
            Some(m) if m >= candidate => m,
            _ => candidate,
        });
    }

    let m = extremum? * (1.0 + AXIS_PADDING);
    Some(match policy {
        ScalePolicy::Symmetric => AxisRange { min: -m, max: m },
        ScalePolicy::PositiveOnly => AxisRange { min: 0.0, max: m },
    })
}

/// Shared ranges for a batch, keyed by (role, metric name). Chrony runs
/// carry no role and use [`SharedScales::insert_unrolled`] keys.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SharedScales {
    ranges: HashMap<(Option<Role>, &'static str), AxisRange>,
}

impl SharedScales {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and store the range for `(role, metric)`; a collection with
    /// no finite values stores nothing.
    pub fn insert(
        &mut self,
        role: Role,
        metric: &'static str,
        values: impl IntoIterator<Item = f64>,
        policy: ScalePolicy,
    ) {
        if let Some(range) = axis_range(values, policy) {
            self.ranges.insert((Some(role), metric), range);
        }
    }

    /// Same as [`SharedScales::insert`] for the role-less chrony family.
    pub fn insert_unrolled(
        &mut self,
        metric: &'static str,
        values: impl IntoIterator<Item = f64>,
        policy: ScalePolicy,
    ) {
        if let Some(range) = axis_range(values, policy) {
            self.ranges.insert((None, metric), range);
        }
    }

    pub fn get(&self, role: Role, metric: &str) -> Option<AxisRange> {
        self.ranges.get(&(Some(role), metric)).copied()
    }

    pub fn get_unrolled(&self, metric: &str) -> Option<AxisRange> {
        self.ranges.get(&(None, metric)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
