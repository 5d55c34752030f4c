//! Per-frame compositing: paints a [`Layout`] at a timestamp into an
//! off-screen [`Canvas`], which is then handed to a [`Surface`] whole.

use tiny_skia::{FilterQuality, Pixmap};

use crate::canvas::{Canvas, ColorStop, Glow, Rect, Rgb, Rgba, clamp_alpha, radial_gradient};
use crate::config::SceneConfig;
use crate::error::RenderError;
use crate::render::Surface;
use crate::scene::building::Building;
use crate::scene::sprite::{Sprite, foreground_bounds};
use crate::scene::{Layout, Viewport};

const SKY: [ColorStop; 3] = [
    ColorStop::new(0.0, Rgba::new(0x0a, 0x15, 0x25, 1.0)),
    ColorStop::new(0.5, Rgba::new(0x0c, 0x1a, 0x2a, 1.0)),
    ColorStop::new(1.0, Rgba::new(0x0e, 0x1f, 0x30, 1.0)),
];

const NEBULA: [ColorStop; 3] = [
    ColorStop::new(0.0, Rgba::new(128, 0, 128, 0.4)),
    ColorStop::new(0.5, Rgba::new(0, 0, 255, 0.3)),
    ColorStop::new(1.0, Rgba::new(255, 0, 255, 0.2)),
];

const STAR_COLOR: Rgb = Rgb::new(255, 255, 255);
const STAR_GLOW: f32 = 4.0;
const STAR_GLOW_STOPS: [ColorStop; 3] = [
    ColorStop::new(0.0, STAR_COLOR.with_alpha(1.0)),
    ColorStop::new(0.5, STAR_COLOR.with_alpha(0.3)),
    ColorStop::new(1.0, STAR_COLOR.with_alpha(0.0)),
];

const WINDOW_LIGHT: Rgb = Rgb::new(255, 255, 200);
const WINDOW_DARK: Rgb = Rgb::new(20, 20, 30);
const WINDOW_DARK_ALPHA: f32 = 0.8;
const HALO_STOPS: [ColorStop; 2] = [
    ColorStop::new(0.0, WINDOW_LIGHT.with_alpha(0.2)),
    ColorStop::new(1.0, WINDOW_LIGHT.with_alpha(0.0)),
];

/// Per-layer paint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub fog: f32,
    pub halo_scale: f32,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            fog: 1.0,
            halo_scale: 2.0,
        }
    }
}

/// Image inputs as they stand this frame.
#[derive(Debug, Clone, Copy)]
pub struct SpriteState<'a> {
    /// Present only while the sprite is loaded and switched on.
    pub foreground: Option<&'a Sprite>,
    pub foreground_scale: f32,
    pub decor: Option<&'a Sprite>,
    pub decor_scale: f32,
}

impl SpriteState<'static> {
    pub const NONE: Self = SpriteState {
        foreground: None,
        foreground_scale: 1.0,
        decor: None,
        decor_scale: 1.0,
    };
}

/// What ended up on the canvas, for the session log and for tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub stars: usize,
    pub windows: usize,
    pub drifters: usize,
    pub foreground: bool,
}

pub struct FrameRenderer {
    canvas: Canvas,
    styles: Vec<LayerStyle>,
    star_glow: Option<Glow>,
    halo: Option<Glow>,
    /// Rendered for the current canvas size; rebuilt when it changes.
    nebula: Option<Pixmap>,
}

impl FrameRenderer {
    pub fn new(scene: &SceneConfig) -> Self {
        let styles = scene
            .layers
            .iter()
            .map(|layer| LayerStyle {
                fog: clamp_alpha(layer.fog),
                halo_scale: if layer.halo_scale.is_finite() {
                    layer.halo_scale.max(0.0)
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            canvas: Canvas::new(0, 0),
            styles,
            star_glow: Glow::new(&STAR_GLOW_STOPS),
            halo: Glow::new(&HALO_STOPS),
            nebula: None,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn style(&self, layer: u32) -> LayerStyle {
        (layer as usize)
            .checked_sub(1)
            .and_then(|idx| self.styles.get(idx))
            .copied()
            .unwrap_or_default()
    }

    fn fit_to(&mut self, viewport: Viewport) {
        if self.canvas.width() == viewport.width && self.canvas.height() == viewport.height {
            return;
        }

        self.canvas.resize(viewport.width, viewport.height);
        let width = viewport.width as f32;
        let height = viewport.height as f32;
        self.nebula = radial_gradient(
            viewport.width,
            viewport.height,
            (width * 0.75, height * 0.25),
            width * 0.5,
            &NEBULA,
        );
    }

    /// Paint one frame, back to front, into the off-screen canvas.
    pub fn render_frame(
        &mut self,
        layout: &Layout,
        time_ms: f64,
        sprites: &SpriteState<'_>,
    ) -> FrameStats {
        let viewport = layout.viewport();
        self.fit_to(viewport);

        let mut stats = FrameStats::default();
        if viewport.is_degenerate() {
            return stats;
        }

        let width = viewport.width as f32;
        let height = viewport.height as f32;

        let canvas = &mut self.canvas;
        canvas.fill_vertical_gradient(&SKY);
        if let Some(nebula) = &self.nebula {
            let area = Rect::new(0.0, 0.0, width, height);
            canvas.draw_pixmap(nebula, area, 1.0, FilterQuality::Nearest);
        }

        let sprite_bounds = sprites
            .foreground
            .map(|sprite| foreground_bounds(viewport, sprite, sprites.foreground_scale));

        for (idx, star) in layout.stars().iter().enumerate() {
            if !layout.is_star_visible(idx, sprite_bounds.as_ref()) {
                continue;
            }
            let b = star.brightness_at(time_ms) as f32;
            if let Some(glow) = &self.star_glow {
                canvas.draw_glow(glow, star.x, star.y, star.size * STAR_GLOW, b);
            }
            canvas.fill_circle(star.x, star.y, star.size, STAR_COLOR, b);
            stats.stars += 1;
        }

        if let Some(decor) = sprites.decor {
            for drifter in layout.drifters() {
                let scale = sprites.decor_scale * drifter.scale;
                let w = decor.width() as f32 * scale;
                let h = decor.height() as f32 * scale;
                let (x, y) = drifter.position_at(time_ms, width, w);
                let dest = Rect::new(x, y, w, h);
                canvas.draw_pixmap(decor.pixmap(), dest, 1.0, FilterQuality::Nearest);
                stats.drifters += 1;
            }
        }

        for (idx, building) in layout.buildings().iter().enumerate() {
            stats.windows += self.paint_building(layout, idx, building, time_ms);
        }

        if let (Some(sprite), Some(bounds)) = (sprites.foreground, sprite_bounds) {
            self.canvas
                .draw_pixmap(sprite.pixmap(), bounds, 1.0, FilterQuality::Nearest);
            stats.foreground = true;
        }

        stats
    }

    fn paint_building(
        &mut self,
        layout: &Layout,
        idx: usize,
        building: &Building,
        time_ms: f64,
    ) -> usize {
        let style = self.style(building.layer);
        let canvas = &mut self.canvas;
        canvas.fill_rect(building.bounds(), building.color, style.fog);

        let mut painted = 0;
        for (w_idx, window) in building.windows.iter().enumerate() {
            if !layout.is_window_visible(idx, w_idx) {
                continue;
            }
            painted += 1;

            if !window.lit {
                canvas.fill_rect(window.bounds(), WINDOW_DARK, WINDOW_DARK_ALPHA * style.fog);
                continue;
            }

            let b = clamp_alpha(window.brightness_at(time_ms) as f32 * style.fog);
            canvas.fill_rect(window.bounds(), WINDOW_LIGHT, b);

            let halo = window.size * style.halo_scale;
            if let Some(glow) = self.halo.as_ref().filter(|_| halo > 0.0) {
                let (cx, cy) = window.center();
                canvas.draw_glow(glow, cx, cy, halo, b);
            }
        }

        painted
    }

    /// Hand the finished frame to the surface in one call.
    pub fn blit(&self, surface: &mut dyn Surface) -> Result<(), RenderError> {
        surface.present(&self.canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::building::Window;
    use crate::scene::star::Star;
    use image::{Rgba as Px, RgbaImage};

    fn building(x: f32, width: f32, height: f32, layer: u32, windows: Vec<Window>) -> Building {
        Building {
            x,
            top: 40.0 - height,
            width,
            height,
            color: Rgb::new(30, 40, 50),
            layer,
            windows,
        }
    }

    fn lit_window(x: f32, y: f32) -> Window {
        Window {
            x,
            y,
            size: 2.0,
            lit: true,
            brightness: 1.0,
            blink_phase: 0.0,
            blinks: false,
        }
    }

    #[test]
    fn test_degenerate_layout_paints_nothing() {
        let mut renderer = FrameRenderer::new(&SceneConfig::default());
        let layout = Layout::empty(Viewport::new(0, 0));
        let stats = renderer.render_frame(&layout, 0.0, &SpriteState::NONE);
        assert_eq!(stats, FrameStats::default());
        assert_eq!(renderer.canvas().width(), 0);
    }

    #[test]
    fn test_sky_is_painted() {
        let mut renderer = FrameRenderer::new(&SceneConfig::default());
        let layout = Layout::empty(Viewport::new(20, 10));
        renderer.render_frame(&layout, 0.0, &SpriteState::NONE);
        assert!(renderer.canvas().pixels().all(|p| p != Rgb::BLACK));
    }

    #[test]
    fn test_occluded_windows_are_skipped() {
        let windows = vec![lit_window(5.0, 30.0), lit_window(5.0, 14.0)];
        let far = building(0.0, 20.0, 30.0, 1, windows);
        let near = building(0.0, 20.0, 15.0, 2, vec![lit_window(5.0, 30.0)]);
        let layout = Layout::new(
            Viewport::new(40, 40),
            vec![far, near],
            Vec::new(),
            Vec::new(),
        );

        let mut renderer = FrameRenderer::new(&SceneConfig::default());
        let stats = renderer.render_frame(&layout, 0.0, &SpriteState::NONE);
        assert_eq!(stats.windows, 2);
    }

    #[test]
    fn test_nearer_building_paints_over_farther_one() {
        let mut far = building(0.0, 20.0, 30.0, 1, Vec::new());
        far.color = Rgb::new(255, 0, 0);
        let mut near = building(0.0, 20.0, 15.0, 2, Vec::new());
        near.color = Rgb::new(0, 0, 255);
        let layout = Layout::new(
            Viewport::new(40, 40),
            vec![near, far],
            Vec::new(),
            Vec::new(),
        );

        let mut renderer = FrameRenderer::new(&SceneConfig::default());
        renderer.render_frame(&layout, 0.0, &SpriteState::NONE);
        let px = renderer.canvas().pixel(10, 35).unwrap();
        assert!(px.b > 150 && px.r < 60, "{:?}", px);
    }

    #[test]
    fn test_lit_window_is_bright() {
        let b = building(0.0, 20.0, 30.0, 3, vec![lit_window(5.0, 20.0)]);
        let layout = Layout::new(Viewport::new(40, 40), vec![b], Vec::new(), Vec::new());

        let mut renderer = FrameRenderer::new(&SceneConfig::default());
        renderer.render_frame(&layout, 0.0, &SpriteState::NONE);
        let px = renderer.canvas().pixel(5, 20).unwrap();
        assert!(px.r > 200 && px.g > 200);
    }

    #[test]
    fn test_foreground_sprite_hides_stars_and_is_drawn_last() {
        let star = Star {
            x: 36.0,
            y: 36.0,
            size: 1.0,
            brightness: 1.0,
            twinkle_speed: 1.0,
            phase: 0.0,
        };
        let layout = Layout::new(Viewport::new(40, 40), Vec::new(), vec![star], Vec::new());
        let image = RgbaImage::from_pixel(8, 8, Px([0, 255, 0, 255]));
        let sprite = Sprite::from_image(image, "hill").unwrap();

        let mut renderer = FrameRenderer::new(&SceneConfig::default());
        let without = renderer.render_frame(&layout, 0.0, &SpriteState::NONE);
        assert_eq!(without.stars, 1);

        let state = SpriteState {
            foreground: Some(&sprite),
            ..SpriteState::NONE
        };
        let with = renderer.render_frame(&layout, 0.0, &state);
        assert_eq!(with.stars, 0);
        assert!(with.foreground);
        assert_eq!(renderer.canvas().pixel(35, 39), Some(Rgb::new(0, 255, 0)));
    }

    #[test]
    fn test_unknown_layer_uses_default_style() {
        let renderer = FrameRenderer::new(&SceneConfig::default());
        assert_eq!(renderer.style(9), LayerStyle::default());
        assert_eq!(renderer.style(0), LayerStyle::default());
        assert_eq!(renderer.style(1).fog, 0.8);
    }
}
