pub mod building;
pub mod drifters;
pub mod factory;
pub mod occlusion;
pub mod sprite;
pub mod star;

use crate::canvas::Rect;
use building::Building;
use drifters::Drifter;
use occlusion::LayoutOcclusion;
use star::Star;

pub use factory::{SceneElementFactory, generate_layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Everything procedurally generated for one viewport size.
///
/// A layout is never edited after construction; a resize replaces it
/// wholesale. The static half of occlusion (windows behind nearer buildings,
/// stars behind the skyline) is resolved once here.
#[derive(Debug)]
pub struct Layout {
    viewport: Viewport,
    buildings: Vec<Building>,
    stars: Vec<Star>,
    drifters: Vec<Drifter>,
    occlusion: LayoutOcclusion,
}

impl Layout {
    /// Buildings are stably sorted farthest layer first, so paint order and
    /// the occlusion memo never depend on the order they were passed in.
    pub fn new(
        viewport: Viewport,
        mut buildings: Vec<Building>,
        stars: Vec<Star>,
        drifters: Vec<Drifter>,
    ) -> Self {
        buildings.sort_by_key(|b| b.layer);
        let occlusion = LayoutOcclusion::resolve(&buildings, &stars);
        Self {
            viewport,
            buildings,
            stars,
            drifters,
            occlusion,
        }
    }

    pub fn empty(viewport: Viewport) -> Self {
        Self::new(viewport, Vec::new(), Vec::new(), Vec::new())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Buildings in paint order, farthest layer first.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn drifters(&self) -> &[Drifter] {
        &self.drifters
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty() && self.stars.is_empty() && self.drifters.is_empty()
    }

    pub fn window_count(&self) -> usize {
        self.buildings.iter().map(|b| b.windows.len()).sum()
    }

    /// Windows behind a nearer building, fixed for the life of the layout.
    pub fn hidden_windows(&self) -> usize {
        self.occlusion.hidden_windows()
    }

    pub fn is_window_visible(&self, building: usize, window: usize) -> bool {
        self.occlusion.window_visible(building, window)
    }

    pub fn is_star_visible(&self, star: usize, sprite_bounds: Option<&Rect>) -> bool {
        match self.stars.get(star) {
            Some(s) => {
                self.occlusion.star_clear_of_skyline(star)
                    && !sprite_bounds.is_some_and(|bounds| bounds.intersects(&s.bounds()))
            }
            None => false,
        }
    }
}
