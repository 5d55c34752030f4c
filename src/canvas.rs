//! Off-screen pixel buffer the frame renderer paints into.
//!
//! The canvas wraps a `tiny_skia::Pixmap` that is kept opaque, so a finished
//! frame can be handed to a surface as-is. Radial falloffs (star glows,
//! window halos, the nebula) are rendered once into their own pixmaps and
//! stamped with `draw_pixmap`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;
use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, GradientStop, LinearGradient, Paint, PathBuilder,
    Pixmap, PixmapPaint, Point, PremultipliedColorU8, SpreadMode, Transform,
};

/// Side length, in pixels, of the pixmap a [`Glow`] is rendered into.
const GLOW_RESOLUTION: u32 = 64;

/// More discs than this add nothing visible to a radial gradient.
const MAX_RINGS: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid colour {0:?}: expected #rrggbb")]
pub struct ColorParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn with_alpha(self, a: f32) -> Rgba {
        Rgba { rgb: self, a }
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }

        let channel = |range: Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(s.to_string()))
        };

        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl From<PremultipliedColorU8> for Rgb {
    fn from(pixel: PremultipliedColorU8) -> Self {
        let color = pixel.demultiply();
        Rgb::new(color.red(), color.green(), color.blue())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colour with a straight (non-premultiplied) alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        rgb: Rgb::BLACK,
        a: 0.0,
    };

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            rgb: Rgb::new(r, g, b),
            a,
        }
    }

    fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            rgb: Rgb::new(
                mix(self.rgb.r, other.rgb.r),
                mix(self.rgb.g, other.rgb.g),
                mix(self.rgb.b, other.rgb.b),
            ),
            a: self.a + (other.a - self.a) * t,
        }
    }

    fn to_color(self) -> Color {
        paint_color(self.rgb, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Open-interval overlap test; rectangles that only share an edge do not
    /// intersect. A zero-sized rect still intersects anything it lies inside.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    fn to_skia(self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Stops are sampled like a 2D canvas gradient: positions before the first
/// stop take its colour, positions past the last stop take the last colour.
fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Rgba::TRANSPARENT,
    };

    if t <= first.offset {
        return first.color;
    }

    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let f = if span > 0.0 {
                (t - a.offset) / span
            } else {
                1.0
            };
            return a.color.lerp(b.color, f);
        }
    }

    last.color
}

pub fn clamp_alpha(a: f32) -> f32 {
    if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) }
}

fn alpha_channel(alpha: f32) -> u8 {
    (clamp_alpha(alpha) * 255.0).round() as u8
}

fn paint_color(color: Rgb, alpha: f32) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, alpha_channel(alpha))
}

/// Render a radial gradient centred on `center` into a new pixmap.
///
/// The gradient is laid down as concentric discs, outermost first, each one
/// replacing what lies under it. Past `radius` the last stop fills the rest
/// of the pixmap.
pub fn radial_gradient(
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: f32,
    stops: &[ColorStop],
) -> Option<Pixmap> {
    let last = stops.last()?;
    if !radius.is_finite() || radius <= 0.0 {
        return None;
    }

    let mut pixmap = Pixmap::new(width, height)?;
    pixmap.fill(last.color.to_color());

    let mut paint = Paint::default();
    paint.blend_mode = BlendMode::Source;
    paint.anti_alias = true;

    let rings = (radius.ceil() as usize).clamp(1, MAX_RINGS);
    for ring in (1..=rings).rev() {
        let t = ring as f32 / rings as f32;
        let Some(disc) = PathBuilder::from_circle(center.0, center.1, radius * t) else {
            continue;
        };
        paint.set_color(sample_stops(stops, t).to_color());
        pixmap.fill_path(
            &disc,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    Some(pixmap)
}

/// A soft radial falloff rendered once and stamped at any size.
#[derive(Debug, Clone)]
pub struct Glow {
    stamp: Pixmap,
}

impl Glow {
    pub fn new(stops: &[ColorStop]) -> Option<Self> {
        let half = GLOW_RESOLUTION as f32 / 2.0;
        let stamp = radial_gradient(GLOW_RESOLUTION, GLOW_RESOLUTION, (half, half), half, stops)?;
        Some(Self { stamp })
    }
}

pub struct Canvas {
    width: u32,
    height: u32,
    /// `None` while either side is zero.
    pixmap: Option<Pixmap>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixmap: blank_pixmap(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixmap = blank_pixmap(width, height);
        }
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixmap.as_ref()?.pixel(x, y).map(Rgb::from)
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.pixmap
            .iter()
            .flat_map(|pixmap| pixmap.pixels().iter().copied().map(Rgb::from))
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let alpha = alpha_channel(alpha);
        let (Some(pixmap), Some(rect)) = (self.pixmap.as_mut(), rect.to_skia()) else {
            return;
        };
        if alpha == 0 {
            return;
        }

        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, alpha);
        paint.anti_alias = false;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Radii below half a pixel light only the containing pixel, weighted by
    /// the circle's area so that tiny stars fade instead of vanishing.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        if !radius.is_finite() || radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }

        if radius < 0.5 {
            let coverage = (std::f32::consts::PI * radius * radius).min(1.0);
            let pixel = Rect::new(cx.floor(), cy.floor(), 1.0, 1.0);
            self.fill_rect(pixel, color, clamp_alpha(alpha) * coverage);
            return;
        }

        let (Some(pixmap), Some(disc)) = (
            self.pixmap.as_mut(),
            PathBuilder::from_circle(cx, cy, radius),
        ) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(paint_color(color, alpha));
        paint.anti_alias = true;
        pixmap.fill_path(
            &disc,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Top-to-bottom gradient across the whole canvas.
    pub fn fill_vertical_gradient(&mut self, stops: &[ColorStop]) {
        let height = self.height as f32;
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };

        let stops = stops
            .iter()
            .map(|stop| GradientStop::new(stop.offset, stop.color.to_color()))
            .collect();
        let Some(shader) = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(0.0, height),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        let Some(area) = Rect::new(0.0, 0.0, self.width as f32, height).to_skia() else {
            return;
        };

        let mut paint = Paint::default();
        paint.shader = shader;
        pixmap.fill_rect(area, &paint, Transform::identity(), None);
    }

    /// Composite `source` scaled to cover `dest`, at `alpha` opacity.
    pub fn draw_pixmap(&mut self, source: &Pixmap, dest: Rect, alpha: f32, quality: FilterQuality) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let alpha = clamp_alpha(alpha);
        let sx = dest.width / source.width() as f32;
        let sy = dest.height / source.height() as f32;
        if alpha <= 0.0 || !(sx > 0.0 && sx.is_finite() && sy > 0.0 && sy.is_finite()) {
            return;
        }
        if !dest.x.is_finite() || !dest.y.is_finite() {
            return;
        }

        let paint = PixmapPaint {
            opacity: alpha,
            blend_mode: BlendMode::SourceOver,
            quality,
        };
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, dest.x, dest.y);
        pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    }

    /// Stamp `glow` centred on `(cx, cy)` out to `radius`.
    pub fn draw_glow(&mut self, glow: &Glow, cx: f32, cy: f32, radius: f32, alpha: f32) {
        let dest = Rect::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0);
        self.draw_pixmap(&glow.stamp, dest, alpha, FilterQuality::Bilinear);
    }
}

fn blank_pixmap(width: u32, height: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    pixmap.fill(Color::BLACK);
    Some(pixmap)
}
