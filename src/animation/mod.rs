pub mod clock;

use std::f64::consts::TAU;

pub use clock::{
    AnimationClock, ClockExit, ClockHandle, FrameSkip, IntervalTicker, ManualTicker, TickSource,
};

/// Clamp to `[0, 1]`, mapping NaN to 0 so it can never reach a colour channel.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// `sin(time_ms * rate + phase)` with the argument reduced to one turn first,
/// so very large timestamps keep full precision. Non-finite input yields NaN,
/// which callers push through [`clamp_unit`].
pub fn oscillate(time_ms: f64, rate: f64, phase: f64) -> f64 {
    (time_ms * rate + phase).rem_euclid(TAU).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit_bounds() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn test_oscillate_stays_in_sine_range() {
        for t in [0.0, 1.0, -1234.5, 1.0e12, -9.9e15] {
            let v = oscillate(t, 0.003, 1.2);
            assert!((-1.0..=1.0).contains(&v), "t={} v={}", t, v);
        }
    }

    #[test]
    fn test_oscillate_matches_plain_sine_for_small_arguments() {
        let v = oscillate(500.0, 0.001, 0.25);
        assert!((v - (0.75f64).sin()).abs() < 1e-12);
    }

    #[test]
    fn test_oscillate_non_finite_is_nan() {
        assert!(oscillate(f64::INFINITY, 1.0, 0.0).is_nan());
    }
}
