//! Heuristic detector bank.
//!
//! Each detector is a pure function of a window and [`GestureThresholds`].
//! A detector looks only at the trailing `*_window` samples it is configured
//! for and never fires on a shorter window.

use contracts::{GestureEvent, GestureKind, GestureThresholds};

use crate::buffer::Window;
use crate::stats;

/// A fired detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub kind: GestureKind,
    pub intensity: f64,
}

impl From<Detection> for GestureEvent {
    fn from(d: Detection) -> Self {
        GestureEvent::new(d.kind).with_intensity(d.intensity)
    }
}

/// Heuristic detectors, in arbitration priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    Tap,
    Flutter,
    Stretch,
    Wave,
    Spin,
    Hold,
}

impl Detector {
    /// First match wins
    pub const PRIORITY: [Detector; 6] = [
        Detector::Tap,
        Detector::Flutter,
        Detector::Stretch,
        Detector::Wave,
        Detector::Spin,
        Detector::Hold,
    ];

    pub fn window_len(self, t: &GestureThresholds) -> usize {
        match self {
            Detector::Tap => t.tap_window,
            Detector::Flutter => t.flutter_window,
            Detector::Stretch => t.stretch_window,
            Detector::Wave => t.wave_window,
            Detector::Spin => t.spin_window,
            Detector::Hold => t.hold_window,
        }
    }

    pub fn detect(
        self,
        window: &Window<'_>,
        t: &GestureThresholds,
        last: Option<GestureKind>,
    ) -> Option<Detection> {
        match self {
            Detector::Tap => detect_tap(window, t),
            Detector::Flutter => detect_flutter(window, t),
            Detector::Stretch => detect_stretch(window, t),
            Detector::Wave => detect_wave(window, t),
            Detector::Spin => detect_spin(window, t),
            Detector::Hold => detect_hold(window, t, last),
        }
    }
}

/// Run every detector in priority order, returning the first that fires
pub fn evaluate(
    window: &Window<'_>,
    t: &GestureThresholds,
    last: Option<GestureKind>,
) -> Option<Detection> {
    Detector::PRIORITY
        .iter()
        .find_map(|d| d.detect(window, t, last))
}

fn tail<'a>(window: &Window<'a>, n: usize) -> Option<Window<'a>> {
    (window.len() >= n).then(|| window.trailing(n))
}

/// Sharp isolated spike in accel magnitude.
///
/// The peak must sit strictly inside the window so both neighbours exist.
pub fn detect_tap(window: &Window<'_>, t: &GestureThresholds) -> Option<Detection> {
    let w = tail(window, t.tap_window)?;
    let mags = w.map(|s| s.accel_magnitude());

    let (idx, peak) = mags
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, m)| if m > best.1 { (i, m) } else { best });

    if idx == 0 || idx + 1 >= mags.len() {
        return None;
    }
    if peak <= t.tap_threshold {
        return None;
    }
    let floor = t.tap_peak_ratio;
    if peak < floor * mags[idx - 1] || peak < floor * mags[idx + 1] {
        return None;
    }

    Some(Detection {
        kind: GestureKind::Tap,
        intensity: peak,
    })
}

/// Newest sample looks like the leading edge of a tap.
///
/// The tap itself can only be confirmed once the next sample arrives, so
/// arbitration holds every other detector back for this cycle.
pub fn tap_pending(window: &Window<'_>, t: &GestureThresholds) -> bool {
    let n = window.len();
    if n < 2 {
        return false;
    }
    let (Some(prev), Some(newest)) = (window.get(n - 2), window.get(n - 1)) else {
        return false;
    };
    let peak = newest.accel_magnitude();
    peak > t.tap_threshold && peak >= t.tap_peak_ratio * prev.accel_magnitude()
}

/// High accel magnitude variance without a large mean shift
pub fn detect_flutter(window: &Window<'_>, t: &GestureThresholds) -> Option<Detection> {
    let w = tail(window, t.flutter_window)?;
    let mags = w.map(|s| s.accel_magnitude());
    let var = stats::variance(&mags);

    (var > t.flutter_variance_min && stats::mean(&mags) < t.flutter_mean_max).then_some(
        Detection {
            kind: GestureKind::Flutter,
            intensity: var,
        },
    )
}

/// Steady change in accel magnitude with little rotation.
///
/// Intensity is the signed first-to-last delta.
pub fn detect_stretch(window: &Window<'_>, t: &GestureThresholds) -> Option<Detection> {
    let w = tail(window, t.stretch_window)?;
    let first = w.first()?.accel_magnitude();
    let last = w.last()?.accel_magnitude();
    let delta = last - first;

    if delta.abs() <= t.stretch_delta_min || delta.abs() >= t.stretch_delta_max {
        return None;
    }
    let gyro = stats::mean(&w.map(|s| s.gyro_magnitude()));
    if gyro >= t.stretch_gyro_max {
        return None;
    }

    Some(Detection {
        kind: GestureKind::Stretch,
        intensity: delta,
    })
}

/// Sum of |rate| and the number of sign reversals between consecutive
/// above-floor samples
fn oscillation(rates: &[f64], floor: f64) -> (f64, usize) {
    let sum = rates.iter().map(|r| r.abs()).sum();
    let mut reversals = 0;
    let mut prev_positive: Option<bool> = None;
    for r in rates.iter().filter(|r| r.abs() > floor) {
        let positive = *r > 0.0;
        if prev_positive.is_some_and(|p| p != positive) {
            reversals += 1;
        }
        prev_positive = Some(positive);
    }
    (sum, reversals)
}

/// Back-and-forth rotation about X (horizontal) or Y (vertical). X wins ties.
pub fn detect_wave(window: &Window<'_>, t: &GestureThresholds) -> Option<Detection> {
    let w = tail(window, t.wave_window)?;

    let axes = [
        (GestureKind::WaveHorizontal, w.map(|s| s.gyro.x)),
        (GestureKind::WaveVertical, w.map(|s| s.gyro.y)),
    ];

    axes.into_iter().find_map(|(kind, rates)| {
        let (sum, reversals) = oscillation(&rates, t.wave_gyro_floor);
        (reversals >= t.wave_min_reversals && sum > t.wave_sum_min).then_some(Detection {
            kind,
            intensity: sum,
        })
    })
}

/// Sustained one-directional rotation about Z.
///
/// Positive rate (counter-clockwise) is `SpinLeft`.
pub fn detect_spin(window: &Window<'_>, t: &GestureThresholds) -> Option<Detection> {
    let w = tail(window, t.spin_window)?;
    let rates = w.map(|s| s.gyro.z);
    let (min, max) = stats::min_max(&rates)?;
    let mean = stats::mean(&rates);

    let one_signed = min > 0.0 || max < 0.0;
    if !one_signed || mean.abs() <= t.spin_mean_min {
        return None;
    }

    let kind = if mean > 0.0 {
        GestureKind::SpinLeft
    } else {
        GestureKind::SpinRight
    };
    Some(Detection {
        kind,
        intensity: mean.abs(),
    })
}

/// Device held still. Suppressed while the previous gesture was a hold.
pub fn detect_hold(
    window: &Window<'_>,
    t: &GestureThresholds,
    last: Option<GestureKind>,
) -> Option<Detection> {
    if last == Some(GestureKind::Hold) {
        return None;
    }
    let w = tail(window, t.hold_window)?;

    let accel_var = stats::variance(&w.map(|s| s.accel.x))
        + stats::variance(&w.map(|s| s.accel.y))
        + stats::variance(&w.map(|s| s.accel.z));
    if accel_var >= t.hold_accel_variance_max {
        return None;
    }

    let gyro_var = stats::variance(&w.map(|s| s.gyro.x))
        + stats::variance(&w.map(|s| s.gyro.y))
        + stats::variance(&w.map(|s| s.gyro.z));
    if gyro_var >= t.hold_gyro_variance_max {
        return None;
    }

    Some(Detection {
        kind: GestureKind::Hold,
        intensity: accel_var,
    })
}
