use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::animation::clock::MAX_FPS;
use crate::canvas::Rgb;
use crate::error::ConfigError;

pub const ENV_FPS: &str = "SKYLINE_FPS";
pub const ENV_DENSITY: &str = "SKYLINE_DENSITY";
pub const ENV_SPRITE: &str = "SKYLINE_SPRITE";

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub sprite: SpriteConfig,
    #[serde(default)]
    pub decor: DecorConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub silent: bool,
}

/// Procedural layout parameters. Layers are listed farthest first.
///
/// Nothing here is validated on load: negative counts, inverted ranges and
/// empty palettes are clamped when the layout is generated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub layers: Vec<LayerConfig>,
    pub star_count: i64,
    /// Fraction of the viewport height, from the top, that stars may occupy.
    pub star_band: f32,
    pub star_max_size: f32,
    /// How far left of x = 0 each layer starts laying out buildings.
    pub start_offset: f32,
    /// Total horizontal jitter per building; offsets fall in `±jitter/2`.
    pub jitter: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LayerConfig {
    pub count: i64,
    /// Building height as a fraction of the viewport height.
    pub height_range: [f32; 2],
    pub width_range: [f32; 2],
    pub spacing: f32,
    pub colors: Vec<Rgb>,
    pub window_size: f32,
    pub window_pitch: f32,
    /// Halo radius in multiples of the window size.
    pub halo_scale: f32,
    /// Opacity multiplier simulating haze; lower is farther.
    pub fog: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SpriteConfig {
    pub path: Option<PathBuf>,
    pub show: bool,
    pub scale: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DecorConfig {
    pub path: Option<PathBuf>,
    /// Number of drifting decorations generated per layout.
    pub density: i64,
    pub scale: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ClockConfig {
    pub fps: u32,
    /// Drop every n-th tick; 0 or 1 disables skipping.
    pub frame_skip: u32,
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r, g, b)
}

pub fn default_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig {
            count: 4,
            height_range: [0.75, 0.95],
            width_range: [25.0, 35.0],
            spacing: 5.0,
            colors: vec![
                rgb(0x0a, 0x15, 0x25),
                rgb(0x0c, 0x1a, 0x2a),
                rgb(0x0e, 0x1f, 0x30),
            ],
            window_size: 1.0,
            window_pitch: 3.0,
            halo_scale: 1.5,
            fog: 0.8,
        },
        LayerConfig {
            count: 6,
            height_range: [0.45, 0.65],
            width_range: [18.0, 25.0],
            spacing: 3.0,
            colors: vec![
                rgb(0x11, 0x24, 0x36),
                rgb(0x14, 0x2a, 0x3d),
                rgb(0x17, 0x30, 0x45),
            ],
            window_size: 2.0,
            window_pitch: 4.0,
            halo_scale: 2.0,
            fog: 0.9,
        },
        LayerConfig {
            count: 8,
            height_range: [0.25, 0.35],
            width_range: [12.0, 18.0],
            spacing: 2.0,
            colors: vec![
                rgb(0x1a, 0x2f, 0x4a),
                rgb(0x1d, 0x35, 0x53),
                rgb(0x20, 0x3b, 0x5c),
            ],
            window_size: 2.0,
            window_pitch: 5.0,
            halo_scale: 2.5,
            fog: 1.0,
        },
    ]
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            layers: default_layers(),
            star_count: 150,
            star_band: 0.7,
            star_max_size: 1.5,
            start_offset: 5.0,
            jitter: 3.0,
        }
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        default_layers().swap_remove(1)
    }
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            path: None,
            show: true,
            scale: 1.0,
        }
    }
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            path: None,
            density: 15,
            scale: 1.0,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_skip: 0,
        }
    }
}

impl SceneConfig {
    /// Human-readable notes about values that will be clamped at generation.
    pub fn lint(&self) -> Vec<String> {
        let mut notes = Vec::new();

        if self.star_count < 0 {
            notes.push(format!("star_count is {}, no stars will be drawn.", self.star_count));
        }

        for (idx, layer) in self.layers.iter().enumerate() {
            let n = idx + 1;
            if layer.count < 0 {
                notes.push(format!(
                    "layer {n} has a negative count ({}), it will be empty.",
                    layer.count
                ));
            }
            if layer.width_range[0] > layer.width_range[1] {
                notes.push(format!("layer {n} has an inverted width_range, it will be empty."));
            }
            if layer.height_range[0] > layer.height_range[1] {
                notes.push(format!("layer {n} has an inverted height_range, it will be empty."));
            }
            if layer.colors.is_empty() {
                notes.push(format!("layer {n} has no colors, a fallback color will be used."));
            }
        }

        notes
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            eprintln!(
                "Note: Config file not found. Create one at {:?} to customize the scene.",
                config_path
            );
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let mut config = Self::load_from_path(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(ENV_FPS) {
            self.clock.fps = val
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidEnvVar {
                    name: ENV_FPS,
                    value: val.clone(),
                })?;
        }

        if let Ok(val) = env::var(ENV_DENSITY) {
            self.decor.density =
                val.trim()
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidEnvVar {
                        name: ENV_DENSITY,
                        value: val.clone(),
                    })?;
        }

        if let Ok(val) = env::var(ENV_SPRITE) {
            let trimmed = val.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::InvalidEnvVar {
                    name: ENV_SPRITE,
                    value: val,
                });
            }
            self.sprite.path = Some(PathBuf::from(trimmed));
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.fps == 0 || self.clock.fps > MAX_FPS {
            return Err(ConfigError::InvalidFrameRate(self.clock.fps));
        }

        for scale in [self.sprite.scale, self.decor.scale] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::InvalidSpriteScale(scale));
            }
        }

        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        if !config.silent {
            for note in config.scene.lint() {
                eprintln!("Warning: {}", note);
            }
        }

        Ok(config)
    }

    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config)
        } else {
            dirs::config_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
                .ok_or(ConfigError::NoConfigDir)?
        };

        Ok(config_dir.join("skyline"))
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}
