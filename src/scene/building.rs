use crate::animation::{clamp_unit, oscillate};
use crate::canvas::{Rect, Rgb};

/// Blinking windows complete `blink_phase / BLINK_PERIOD_MS` radians per ms.
pub const BLINK_PERIOD_MS: f64 = 5000.0;

/// Most windows a single grid may hold, however fine the pitch.
pub const MAX_WINDOWS: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub lit: bool,
    pub brightness: f32,
    pub blink_phase: f32,
    pub blinks: bool,
}

impl Window {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    /// Light level at `time_ms`, always within `[0, 1]`. Unlit windows are 0.
    pub fn brightness_at(&self, time_ms: f64) -> f64 {
        if !self.lit {
            return 0.0;
        }

        let base = self.brightness as f64;
        if !self.blinks {
            return clamp_unit(base);
        }

        let phase = self.blink_phase as f64;
        let wave = oscillate(time_ms, phase / BLINK_PERIOD_MS, phase);
        clamp_unit((0.5 + 0.5 * wave) * base)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub x: f32,
    /// Top edge; buildings always stand on the bottom of the viewport.
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
    /// 1 is the farthest layer; higher numbers are nearer.
    pub layer: u32,
    pub windows: Vec<Window>,
}

impl Building {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.top, self.width, self.height)
    }
}

/// Columns and floors of the window grid for a building of the given size.
///
/// Columns sit at `x + k * pitch` for `k >= 1` while they start before
/// `x + width - pitch`; floors fill `height - 2 * pitch`, one per pitch.
/// `columns * floors` never exceeds [`MAX_WINDOWS`]; extra floors are cut.
pub fn window_grid(width: f32, height: f32, pitch: f32) -> (usize, usize) {
    if !(pitch > 0.0) || !width.is_finite() || !height.is_finite() {
        return (0, 0);
    }

    let span = width / pitch - 1.0;
    let columns = if span > 1.0 {
        span.ceil() as usize - 1
    } else {
        0
    };
    let floors = ((height - 2.0 * pitch) / pitch).floor().max(0.0) as usize;

    if columns == 0 || floors == 0 {
        return (0, 0);
    }

    let columns = columns.min(MAX_WINDOWS);
    (columns, floors.min(MAX_WINDOWS / columns))
}
