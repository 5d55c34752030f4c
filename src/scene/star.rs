use crate::animation::{clamp_unit, oscillate};
use crate::canvas::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    /// Core radius in pixels; the glow reaches four times further.
    pub size: f32,
    pub brightness: f32,
    /// Radians per second.
    pub twinkle_speed: f32,
    pub phase: f32,
}

impl Star {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.size,
            self.y - self.size,
            self.size * 2.0,
            self.size * 2.0,
        )
    }

    pub fn brightness_at(&self, time_ms: f64) -> f64 {
        let wave = oscillate(
            time_ms,
            self.twinkle_speed as f64 / 1000.0,
            self.phase as f64,
        );
        clamp_unit(self.brightness as f64 * (0.7 + 0.3 * wave))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> Star {
        Star {
            x: 10.0,
            y: 5.0,
            size: 1.5,
            brightness: 0.9,
            twinkle_speed: 2.0,
            phase: 0.5,
        }
    }

    #[test]
    fn test_twinkle_stays_between_seventy_and_hundred_percent() {
        let s = star();
        for i in 0..500 {
            let b = s.brightness_at(i as f64 * 13.0);
            assert!(b >= 0.9f32 as f64 * 0.4 - 1e-9);
            assert!(b <= 0.9f32 as f64 + 1e-9);
        }
    }

    #[test]
    fn test_twinkle_matches_formula() {
        let s = star();
        let t = 700.0;
        let expected = 0.9f32 as f64 * (0.7 + 0.3 * (t * 2.0 / 1000.0 + 0.5f64).sin());
        assert!((s.brightness_at(t) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_time_is_dark_not_nan() {
        let s = star();
        assert_eq!(s.brightness_at(f64::INFINITY), 0.0);
        assert_eq!(s.brightness_at(f64::NAN), 0.0);
    }

    #[test]
    fn test_bounds_centered_on_star() {
        assert_eq!(star().bounds(), Rect::new(8.5, 3.5, 3.0, 3.0));
    }
}
