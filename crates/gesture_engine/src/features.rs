//! Per-window feature extraction.
//!
//! Layout: for each axis in `Axis::ALL` order (accel XYZ, gyro XYZ, mag XYZ),
//! three values `[mean, variance, energy]`, 27 in total.

use contracts::{Axis, FeatureVector, FEATURE_COUNT};

use crate::buffer::Window;
use crate::stats;

/// Summarise a window. An empty window yields all zeros.
pub fn extract(window: &Window<'_>) -> FeatureVector {
    let mut out = [0.0; FEATURE_COUNT];
    if window.is_empty() {
        return FeatureVector(out);
    }

    for axis in Axis::ALL {
        let values = window.map(|s| s.axis(axis));
        let base = axis.index() * 3;
        out[base] = stats::mean(&values);
        out[base + 1] = stats::variance(&values);
        out[base + 2] = stats::energy(&values);
    }

    FeatureVector(out)
}
