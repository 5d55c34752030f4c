use std::f32::consts::TAU;

use rand::{Rng, RngExt};

use super::building::{Building, MAX_WINDOWS, Window, window_grid};
use super::drifters::Drifter;
use super::star::Star;
use super::{Layout, Viewport};
use crate::canvas::Rgb;
use crate::config::{LayerConfig, SceneConfig};

/// Upper bound for any configured count so a typo cannot exhaust memory.
const MAX_ELEMENTS: i64 = 100_000;

/// Used when a layer's palette is empty.
const FALLBACK_COLOR: Rgb = Rgb::new(0x0a, 0x15, 0x25);

const BRIGHT_WINDOW_CHANCE: f32 = 0.1;
const BLINK_CHANCE: f32 = 0.8;
const DIM_LIT_CHANCE: f32 = 0.5;

const DRIFTER_BAND: f32 = 0.5;
const DRIFTER_SPEED: [f32; 2] = [2.0, 6.0];
const DRIFTER_SCALE: [f32; 2] = [0.6, 1.0];

/// Builds the static layout for a viewport from a scene configuration.
pub struct SceneElementFactory<'a> {
    config: &'a SceneConfig,
    drifters: usize,
}

impl<'a> SceneElementFactory<'a> {
    pub fn new(config: &'a SceneConfig) -> Self {
        Self {
            config,
            drifters: 0,
        }
    }

    /// Also scatter `density` drifting decorations across the sky band.
    pub fn with_drifters(mut self, density: i64) -> Self {
        self.drifters = clamp_count(density);
        self
    }

    pub fn generate_layout<R: Rng + ?Sized>(&self, viewport: Viewport, rng: &mut R) -> Layout {
        if viewport.is_degenerate() {
            return Layout::empty(viewport);
        }

        let width = viewport.width as f32;
        let height = viewport.height as f32;

        let mut buildings = Vec::new();
        let mut window_budget = MAX_WINDOWS;
        for (idx, layer) in self.config.layers.iter().enumerate() {
            self.lay_out_layer(
                layer,
                idx as u32 + 1,
                height,
                &mut window_budget,
                rng,
                &mut buildings,
            );
        }

        let stars = (0..clamp_count(self.config.star_count))
            .map(|_| self.create_star(width, height, rng))
            .collect();

        let drifters = (0..self.drifters)
            .map(|_| create_drifter(width, height, rng))
            .collect();

        Layout::new(viewport, buildings, stars, drifters)
    }

    fn lay_out_layer<R: Rng + ?Sized>(
        &self,
        layer: &LayerConfig,
        index: u32,
        height: f32,
        window_budget: &mut usize,
        rng: &mut R,
        out: &mut Vec<Building>,
    ) {
        let count = clamp_count(layer.count);
        let width_range = ordered(layer.width_range);
        let height_range = ordered([
            layer.height_range[0].clamp(0.0, 1.0),
            layer.height_range[1].clamp(0.0, 1.0),
        ]);
        let (Some(width_range), Some(height_range)) = (width_range, height_range) else {
            return;
        };
        if count == 0 || width_range[0] < 0.0 {
            return;
        }

        let spacing = finite_or_zero(layer.spacing);
        let jitter = finite_or_zero(self.config.jitter).abs();
        let pitch = finite_or_zero(layer.window_pitch);
        let window_size = finite_or_zero(layer.window_size).clamp(0.0, pitch.max(0.0));

        let mut cursor = -finite_or_zero(self.config.start_offset);
        for _ in 0..count {
            let building_width = sample(rng, width_range);
            let building_height = sample(rng, height_range) * height;
            let color = pick_color(&layer.colors, rng);

            let mut building = Building {
                x: cursor,
                top: height - building_height,
                width: building_width,
                height: building_height,
                color,
                layer: index,
                windows: Vec::new(),
            };
            building.windows = create_windows(&building, pitch, window_size, window_budget, rng);
            out.push(building);

            let offset = if jitter > 0.0 {
                rng.random_range(-jitter / 2.0..=jitter / 2.0)
            } else {
                0.0
            };
            cursor += building_width + spacing + offset;
        }
    }

    fn create_star<R: Rng + ?Sized>(&self, width: f32, height: f32, rng: &mut R) -> Star {
        let band = finite_or_zero(self.config.star_band).clamp(0.0, 1.0) * height;
        let max_size = finite_or_zero(self.config.star_max_size).max(0.0);

        Star {
            x: rng.random::<f32>() * width,
            y: rng.random::<f32>() * band,
            size: rng.random::<f32>() * max_size,
            brightness: rng.random_range(0.5..=1.0),
            twinkle_speed: rng.random_range(1.0..=3.0),
            phase: rng.random::<f32>() * TAU,
        }
    }
}

/// Generate a layout with no drifting decorations.
pub fn generate_layout<R: Rng + ?Sized>(
    viewport: Viewport,
    config: &SceneConfig,
    rng: &mut R,
) -> Layout {
    SceneElementFactory::new(config).generate_layout(viewport, rng)
}

/// Windows for `building`, drawn from a budget shared by the whole layout.
/// Once the budget runs low, upper floors are kept and lower ones dropped.
fn create_windows<R: Rng + ?Sized>(
    building: &Building,
    pitch: f32,
    size: f32,
    budget: &mut usize,
    rng: &mut R,
) -> Vec<Window> {
    let (columns, floors) = window_grid(building.width, building.height, pitch);
    let floors = match columns {
        0 => 0,
        _ => floors.min(*budget / columns),
    };
    *budget = budget.saturating_sub(columns * floors);

    let mut windows = Vec::with_capacity(columns * floors);

    for column in 1..=columns {
        let x = building.x + column as f32 * pitch;
        for floor in 0..floors {
            let y = building.top + pitch + floor as f32 * pitch;
            windows.push(light_window(x, y, size, rng));
        }
    }

    windows
}

fn light_window<R: Rng + ?Sized>(x: f32, y: f32, size: f32, rng: &mut R) -> Window {
    if rng.random::<f32>() < BRIGHT_WINDOW_CHANCE {
        Window {
            x,
            y,
            size,
            lit: true,
            brightness: rng.random_range(0.5..=1.0),
            blink_phase: rng.random::<f32>() * TAU,
            blinks: rng.random::<f32>() < BLINK_CHANCE,
        }
    } else {
        Window {
            x,
            y,
            size,
            lit: rng.random::<f32>() < DIM_LIT_CHANCE,
            brightness: rng.random_range(0.3..=0.5),
            blink_phase: 0.0,
            blinks: false,
        }
    }
}

fn create_drifter<R: Rng + ?Sized>(width: f32, height: f32, rng: &mut R) -> Drifter {
    Drifter {
        x0: rng.random::<f32>() * width,
        y: rng.random::<f32>() * height * DRIFTER_BAND,
        speed: rng.random_range(DRIFTER_SPEED[0]..=DRIFTER_SPEED[1]),
        scale: rng.random_range(DRIFTER_SCALE[0]..=DRIFTER_SCALE[1]),
        bob_phase: rng.random::<f32>() * TAU,
    }
}

fn pick_color<R: Rng + ?Sized>(palette: &[Rgb], rng: &mut R) -> Rgb {
    if palette.is_empty() {
        FALLBACK_COLOR
    } else {
        palette[rng.random_range(0..palette.len())]
    }
}

fn clamp_count(count: i64) -> usize {
    count.clamp(0, MAX_ELEMENTS) as usize
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// `Some` for a finite `[lo, hi]` with `lo <= hi`.
fn ordered(range: [f32; 2]) -> Option<[f32; 2]> {
    let [lo, hi] = range;
    (lo.is_finite() && hi.is_finite() && lo <= hi).then_some(range)
}

fn sample<R: Rng + ?Sized>(rng: &mut R, range: [f32; 2]) -> f32 {
    if range[0] == range[1] {
        range[0]
    } else {
        rng.random_range(range[0]..=range[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_building_count_matches_layers() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert_eq!(layout.buildings().len(), 4 + 6 + 8);
        assert_eq!(layout.stars().len(), 150);
    }

    #[test]
    fn test_layers_are_ordered_farthest_first() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        let layers: Vec<u32> = layout.buildings().iter().map(|b| b.layer).collect();
        let mut sorted = layers.clone();
        sorted.sort();
        assert_eq!(layers, sorted);
        assert_eq!(layers.first(), Some(&1));
        assert_eq!(layers.last(), Some(&3));
    }

    #[test]
    fn test_first_building_starts_left_of_edge() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        for layer in 1..=3 {
            let first = layout
                .buildings()
                .iter()
                .find(|b| b.layer == layer)
                .unwrap();
            assert_eq!(first.x, -config.start_offset);
        }
    }

    #[test]
    fn test_buildings_stand_on_ground() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        for b in layout.buildings() {
            assert!((b.top + b.height - 90.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_windows_follow_grid() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        for b in layout.buildings() {
            let pitch = config.layers[(b.layer - 1) as usize].window_pitch;
            let (cols, floors) = window_grid(b.width, b.height, pitch);
            assert_eq!(b.windows.len(), cols * floors);
        }
    }

    #[test]
    fn test_unbounded_width_range_is_capped() {
        let mut config = SceneConfig::default();
        config.layers[0].width_range = [0.0, f32::MAX];
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert_eq!(layout.buildings().len(), 4 + 6 + 8);
        assert!(layout.window_count() <= MAX_WINDOWS);
    }

    #[test]
    fn test_fine_window_pitch_shares_one_budget() {
        let mut config = SceneConfig::default();
        for layer in &mut config.layers {
            layer.window_pitch = 0.01;
        }
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert!(layout.window_count() > 0);
        assert!(layout.window_count() <= MAX_WINDOWS);
    }

    #[test]
    fn test_subnormal_window_pitch_is_capped() {
        let mut config = SceneConfig::default();
        config.layers[2].window_pitch = f32::MIN_POSITIVE;
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert!(layout.window_count() <= MAX_WINDOWS);
    }

    #[test]
    fn test_negative_counts_are_empty() {
        let mut config = SceneConfig::default();
        config.layers[0].count = -3;
        config.star_count = -1;
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert_eq!(layout.buildings().len(), 6 + 8);
        assert!(layout.stars().is_empty());
    }

    #[test]
    fn test_inverted_range_empties_layer() {
        let mut config = SceneConfig::default();
        config.layers[1].width_range = [30.0, 10.0];
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert!(layout.buildings().iter().all(|b| b.layer != 2));
        assert_eq!(layout.buildings().len(), 4 + 8);
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let mut config = SceneConfig::default();
        config.layers[2].colors.clear();
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        assert!(
            layout
                .buildings()
                .iter()
                .filter(|b| b.layer == 3)
                .all(|b| b.color == FALLBACK_COLOR)
        );
    }

    #[test]
    fn test_window_size_never_exceeds_pitch() {
        let mut config = SceneConfig::default();
        config.layers[0].window_size = 50.0;
        let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng());
        for b in layout.buildings().iter().filter(|b| b.layer == 1) {
            for w in &b.windows {
                assert!(w.size <= config.layers[0].window_pitch);
            }
        }
    }

    #[test]
    fn test_stars_stay_in_band() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(200, 100), &config, &mut rng());
        for s in layout.stars() {
            assert!((0.0..200.0).contains(&s.x));
            assert!((0.0..70.0).contains(&s.y));
            assert!(s.size < config.star_max_size);
            assert!((0.5..=1.0).contains(&s.brightness));
        }
    }

    #[test]
    fn test_drifters_follow_density() {
        let config = SceneConfig::default();
        let layout = SceneElementFactory::new(&config)
            .with_drifters(15)
            .generate_layout(Viewport::new(200, 100), &mut rng());
        assert_eq!(layout.drifters().len(), 15);
        for d in layout.drifters() {
            assert!(d.y < 50.0);
            assert!(d.speed >= DRIFTER_SPEED[0] && d.speed <= DRIFTER_SPEED[1]);
        }

        let none = SceneElementFactory::new(&config)
            .with_drifters(-4)
            .generate_layout(Viewport::new(200, 100), &mut rng());
        assert!(none.drifters().is_empty());
    }

    #[test]
    fn test_degenerate_viewport_is_empty() {
        let config = SceneConfig::default();
        for viewport in [Viewport::new(0, 0), Viewport::new(0, 50), Viewport::new(80, 0)] {
            let layout = SceneElementFactory::new(&config)
                .with_drifters(10)
                .generate_layout(viewport, &mut rng());
            assert!(layout.is_empty());
        }
    }

    #[test]
    fn test_lighting_distribution_is_mostly_dim() {
        let config = SceneConfig::default();
        let layout = generate_layout(Viewport::new(400, 200), &config, &mut rng());
        let windows: Vec<&Window> = layout.buildings().iter().flat_map(|b| &b.windows).collect();
        let blinking = windows.iter().filter(|w| w.blinks).count();
        assert!(!windows.is_empty());
        assert!(blinking < windows.len() / 4);
        assert!(
            windows
                .iter()
                .filter(|w| w.blinks)
                .all(|w| w.lit && w.brightness >= 0.5)
        );
    }
}
