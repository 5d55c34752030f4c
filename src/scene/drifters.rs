use crate::animation::oscillate;

const BOB_AMPLITUDE: f64 = 1.5;
const BOB_RATE: f64 = 0.0015;

/// A small decorative sprite gliding across the sky band.
#[derive(Debug, Clone, PartialEq)]
pub struct Drifter {
    pub x0: f32,
    pub y: f32,
    /// Pixels per second, always positive (left to right).
    pub speed: f32,
    pub scale: f32,
    pub bob_phase: f32,
}

impl Drifter {
    /// Top-left corner at `time_ms` for a sprite `sprite_width` pixels wide.
    ///
    /// The drifter wraps once it has fully left the right edge and re-enters
    /// from fully off-screen on the left.
    pub fn position_at(&self, time_ms: f64, viewport_width: f32, sprite_width: f32) -> (f32, f32) {
        let span = (viewport_width + sprite_width) as f64;
        if !time_ms.is_finite() || !(span > 0.0) {
            return (self.x0, self.y);
        }

        let travel = self.x0 as f64 + self.speed as f64 * time_ms / 1000.0;
        let x = travel.rem_euclid(span) - sprite_width as f64;
        let y = self.y as f64 + BOB_AMPLITUDE * oscillate(time_ms, BOB_RATE, self.bob_phase as f64);

        (x as f32, y as f32)
    }
}
