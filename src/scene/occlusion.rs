use super::building::{Building, Window};
use super::star::Star;
use crate::canvas::Rect;

/// A window is hidden when a building from a strictly nearer layer overlaps it.
///
/// Windows of the nearest layer present are always visible.
pub fn is_window_visible(window: &Window, owner: &Building, buildings: &[Building]) -> bool {
    let nearest = buildings
        .iter()
        .map(|b| b.layer)
        .max()
        .unwrap_or(owner.layer);
    if owner.layer >= nearest {
        return true;
    }

    let bounds = window.bounds();
    !buildings
        .iter()
        .filter(|b| b.layer > owner.layer)
        .any(|b| b.bounds().intersects(&bounds))
}

/// Stars sit behind the whole skyline and, while it is shown, the sprite.
pub fn is_star_visible(star: &Star, buildings: &[Building], sprite: Option<&Rect>) -> bool {
    let bounds = star.bounds();
    if sprite.is_some_and(|s| s.intersects(&bounds)) {
        return false;
    }
    clear_of_skyline(&bounds, buildings)
}

fn clear_of_skyline(bounds: &Rect, buildings: &[Building]) -> bool {
    !buildings.iter().any(|b| b.bounds().intersects(bounds))
}

/// Per-layout memo of the geometry-only occlusion tests.
#[derive(Debug, Default)]
pub struct LayoutOcclusion {
    windows: Vec<Vec<bool>>,
    stars: Vec<bool>,
}

impl LayoutOcclusion {
    pub fn resolve(buildings: &[Building], stars: &[Star]) -> Self {
        let windows = buildings
            .iter()
            .map(|owner| {
                owner
                    .windows
                    .iter()
                    .map(|w| is_window_visible(w, owner, buildings))
                    .collect()
            })
            .collect();

        let stars = stars
            .iter()
            .map(|s| clear_of_skyline(&s.bounds(), buildings))
            .collect();

        Self { windows, stars }
    }

    pub fn window_visible(&self, building: usize, window: usize) -> bool {
        self.windows
            .get(building)
            .and_then(|w| w.get(window))
            .copied()
            .unwrap_or(false)
    }

    pub fn star_clear_of_skyline(&self, star: usize) -> bool {
        self.stars.get(star).copied().unwrap_or(false)
    }

    pub fn hidden_windows(&self) -> usize {
        self.windows.iter().flatten().filter(|v| !**v).count()
    }
}
