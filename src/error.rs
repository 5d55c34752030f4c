use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ParseError(toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(toml::ser::Error),

    #[error("Failed to write config file at {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidEnvVar { name: &'static str, value: String },

    #[error("Invalid frame rate {0}: must be between 1 and 240 fps")]
    InvalidFrameRate(u32),

    #[error("Invalid sprite scale {0}: must be a positive number")]
    InvalidSpriteScale(f32),
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::ReadError { .. } => "ReadError",
            ConfigError::ParseError(_) => "ParseError",
            ConfigError::SerializeError(_) => "SerializeError",
            ConfigError::WriteError { .. } => "WriteError",
            ConfigError::NoConfigDir => "NoConfigDir",
            ConfigError::InvalidEnvVar { .. } => "InvalidEnvVar",
            ConfigError::InvalidFrameRate(_) => "InvalidFrameRate",
            ConfigError::InvalidSpriteScale(_) => "InvalidSpriteScale",
        }
    }
}

/// Reasons an image input never becomes ready.
#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("Failed to read sprite image at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode sprite image at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Sprite image at {0} has no pixels")]
    EmptyImage(String),

    #[error("Sprite loader task ended unexpectedly: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(#[from] io::Error),
}

impl RenderError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            RenderError::SurfaceUnavailable(e) => match e.kind() {
                io::ErrorKind::Unsupported => {
                    "This terminal does not support raw mode and an alternate screen."
                        .to_string()
                }
                io::ErrorKind::BrokenPipe => {
                    "The terminal went away while drawing. Run skyline interactively."
                        .to_string()
                }
                _ => format!("Could not draw to the terminal: {}", e),
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum OnboardError {
    #[error("Prompt failed: {0}")]
    PromptError(String),

    #[error("Setup cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
