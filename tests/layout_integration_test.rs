use rand::SeedableRng;
use rand::rngs::StdRng;
use skyline::app::App;
use skyline::config::{Config, SceneConfig};
use skyline::scene::building::window_grid;
use skyline::scene::{Layout, SceneElementFactory, Viewport, generate_layout};
use std::sync::Arc;

fn assert_windows_contained(layout: &Layout) {
    let height = layout.viewport().height as f32;
    for building in layout.buildings() {
        let top = height - building.height;
        for window in &building.windows {
            assert!(window.x >= building.x && window.x <= building.x + building.width);
            assert!(window.y >= top && window.y <= height);
            assert!(window.x + window.size <= building.x + building.width + 1e-3);
            assert!(window.y + window.size <= height + 1e-3);
        }
    }
}

#[test]
fn test_layout_integration_cardinality() {
    let config = SceneConfig::default();
    let counts: Vec<i64> = config.layers.iter().map(|l| l.count).collect();

    for (seed, (w, h)) in [(1u64, (80, 48)), (2, (160, 90)), (3, (320, 120))] {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generate_layout(Viewport::new(w, h), &config, &mut rng);

        assert_eq!(layout.buildings().len() as i64, counts.iter().sum::<i64>());
        for building in layout.buildings() {
            let pitch = config.layers[(building.layer - 1) as usize].window_pitch;
            let (columns, floors) = window_grid(building.width, building.height, pitch);
            assert_eq!(building.windows.len(), columns * floors);
        }
    }
}

#[test]
fn test_layout_integration_windows_inside_buildings() {
    let config = SceneConfig::default();
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generate_layout(Viewport::new(200, 100), &config, &mut rng);
        assert_windows_contained(&layout);
    }
}

#[test]
fn test_layout_integration_brightness_clamped_for_any_time() {
    let config = SceneConfig::default();
    let mut rng = StdRng::seed_from_u64(11);
    let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng);

    let times = [
        0.0,
        16.7,
        -1.0e6,
        1.0e12,
        -1.0e15,
        f64::MAX,
        f64::MIN,
        f64::INFINITY,
        f64::NAN,
    ];
    for t in times {
        for window in layout.buildings().iter().flat_map(|b| &b.windows) {
            let b = window.brightness_at(t);
            assert!((0.0..=1.0).contains(&b), "window brightness {} at {}", b, t);
        }
        for star in layout.stars() {
            let b = star.brightness_at(t);
            assert!((0.0..=1.0).contains(&b), "star brightness {} at {}", b, t);
        }
    }
}

#[test]
fn test_layout_integration_animation_is_pure() {
    let config = SceneConfig::default();
    let mut rng = StdRng::seed_from_u64(12);
    let layout = generate_layout(Viewport::new(160, 90), &config, &mut rng);

    for t in [0.0, 1234.5, 98_765.0] {
        for window in layout.buildings().iter().flat_map(|b| &b.windows) {
            assert_eq!(window.brightness_at(t), window.brightness_at(t));
        }
        for star in layout.stars() {
            assert_eq!(star.brightness_at(t), star.brightness_at(t));
        }
    }
}

#[test]
fn test_layout_integration_same_seed_same_structure() {
    let config = SceneConfig::default();
    let mut rng = StdRng::seed_from_u64(5);
    let a = generate_layout(Viewport::new(120, 60), &config, &mut rng);
    let mut rng = StdRng::seed_from_u64(5);
    let b = generate_layout(Viewport::new(120, 60), &config, &mut rng);
    assert_eq!(a.buildings(), b.buildings());
    assert_eq!(a.stars(), b.stars());
}

#[test]
fn test_layout_integration_resize_regenerates() {
    let mut app = App::new(Config::default(), Viewport::new(80, 48), Some(9));
    let before = app.layout();

    app.resize(Viewport::new(140, 70));
    let after = app.layout();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_ne!(before.buildings(), after.buildings());
    assert_eq!(after.viewport(), Viewport::new(140, 70));
    assert_windows_contained(&after);
}

#[test]
fn test_layout_integration_degenerate_viewport() {
    let config = SceneConfig::default();
    let mut rng = StdRng::seed_from_u64(0);

    let layout = SceneElementFactory::new(&config)
        .with_drifters(20)
        .generate_layout(Viewport::new(0, 0), &mut rng);

    assert!(layout.buildings().is_empty());
    assert!(layout.stars().is_empty());
    assert!(layout.drifters().is_empty());
}
