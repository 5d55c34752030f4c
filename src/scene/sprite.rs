use std::path::{Path, PathBuf};

use image::RgbaImage;
use tiny_skia::{ColorU8, Pixmap};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use super::Viewport;
use crate::canvas::Rect;
use crate::error::SpriteError;

/// Fraction of the viewport width where the foreground sprite's right edge sits.
const FOREGROUND_RIGHT: f32 = 0.95;

/// A decoded bitmap, premultiplied and ready to be composited.
#[derive(Debug, Clone)]
pub struct Sprite {
    pixmap: Pixmap,
}

impl Sprite {
    pub fn from_image(image: RgbaImage, origin: &str) -> Result<Self, SpriteError> {
        let mut pixmap = Pixmap::new(image.width(), image.height())
            .ok_or_else(|| SpriteError::EmptyImage(origin.to_string()))?;

        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        Ok(Self { pixmap })
    }

    pub fn decode(path: &Path, bytes: &[u8]) -> Result<Self, SpriteError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| SpriteError::Decode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();
        Self::from_image(image, &path.display().to_string())
    }

    pub async fn load(path: PathBuf) -> Result<Self, SpriteError> {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| SpriteError::Read {
                path: path.display().to_string(),
                source,
            })?;

        tokio::task::spawn_blocking(move || Self::decode(&path, &bytes))
            .await
            .map_err(|e| SpriteError::Task(e.to_string()))?
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteStatus {
    Disabled,
    Loading,
    Ready,
    Failed,
}

enum SlotState {
    Disabled,
    Loading(oneshot::Receiver<Result<Sprite, SpriteError>>),
    Ready(Sprite),
    Failed,
}

/// An image input that may still be loading in the background.
///
/// The render loop polls the slot once per frame and paints the sprite only
/// once it is ready; until then the sprite is simply left out.
pub struct SpriteSlot {
    state: SlotState,
}

impl SpriteSlot {
    pub fn disabled() -> Self {
        Self {
            state: SlotState::Disabled,
        }
    }

    pub fn ready(sprite: Sprite) -> Self {
        Self {
            state: SlotState::Ready(sprite),
        }
    }

    /// Start loading `path` on the current tokio runtime.
    pub fn spawn_load(path: PathBuf) -> Self {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(Sprite::load(path).await);
        });
        Self {
            state: SlotState::Loading(rx),
        }
    }

    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::spawn_load(path),
            None => Self::disabled(),
        }
    }

    /// Pick up a finished load. Returns the error once, on the poll that
    /// observes the failure.
    pub fn poll(&mut self) -> Option<SpriteError> {
        let SlotState::Loading(rx) = &mut self.state else {
            return None;
        };

        match rx.try_recv() {
            Ok(Ok(sprite)) => {
                self.state = SlotState::Ready(sprite);
                None
            }
            Ok(Err(e)) => {
                self.state = SlotState::Failed;
                Some(e)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.state = SlotState::Failed;
                Some(SpriteError::Task("loader dropped before finishing".to_string()))
            }
        }
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        match &self.state {
            SlotState::Ready(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn status(&self) -> SpriteStatus {
        match self.state {
            SlotState::Disabled => SpriteStatus::Disabled,
            SlotState::Loading(_) => SpriteStatus::Loading,
            SlotState::Ready(_) => SpriteStatus::Ready,
            SlotState::Failed => SpriteStatus::Failed,
        }
    }
}

/// Natural size times `scale`, right edge at 95% of the width, resting on the
/// bottom of the viewport.
pub fn foreground_bounds(viewport: Viewport, sprite: &Sprite, scale: f32) -> Rect {
    let width = sprite.width() as f32 * scale;
    let height = sprite.height() as f32 * scale;
    Rect::new(
        viewport.width as f32 * FOREGROUND_RIGHT - width,
        viewport.height as f32 - height,
        width,
        height,
    )
}
