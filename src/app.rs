use crate::animation::{AnimationClock, ClockExit, FrameSkip, IntervalTicker};
use crate::config::Config;
use crate::error::RenderError;
use crate::frame::{FrameRenderer, FrameStats, SpriteState};
use crate::render::{Surface, TerminalRenderer};
use crate::scene::sprite::SpriteSlot;
use crate::scene::{Layout, SceneElementFactory, Viewport};
use crate::{log_info, log_warn};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;

/// Input translated into what the scene should do about it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    ToggleForeground,
    /// Zoom steps; positive zooms in.
    Zoom(f32),
    Resize(u16, u16),
}

pub fn action_for(event: &Event) -> Option<Action> {
    match event {
        Event::Resize(width, height) => Some(Action::Resize(*width, *height)),
        Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::ToggleForeground),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Zoom(1.0)),
            KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::Zoom(-1.0)),
            _ => None,
        },
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::Zoom(-1.0)),
            MouseEventKind::ScrollUp => Some(Action::Zoom(1.0)),
            _ => None,
        },
        _ => None,
    }
}

/// Owns the viewport, the current layout and the animation loop.
pub struct App {
    config: Config,
    viewport: Viewport,
    layout: Arc<Layout>,
    rng: StdRng,
    foreground: SpriteSlot,
    decor: SpriteSlot,
    renderer: FrameRenderer,
    show_foreground: bool,
    pending_resize: Option<Viewport>,
}

impl App {
    pub fn new(config: Config, viewport: Viewport, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        let layout = Arc::new(
            SceneElementFactory::new(&config.scene)
                .with_drifters(config.decor.density)
                .generate_layout(viewport, &mut rng),
        );
        let renderer = FrameRenderer::new(&config.scene);
        let show_foreground = config.sprite.show;

        Self {
            config,
            viewport,
            layout,
            rng,
            foreground: SpriteSlot::disabled(),
            decor: SpriteSlot::disabled(),
            renderer,
            show_foreground,
            pending_resize: None,
        }
    }

    /// Start loading the configured images in the background. Must be
    /// called from within a tokio runtime.
    pub fn load_sprites(&mut self) {
        self.foreground = SpriteSlot::from_path(self.config.sprite.path.clone());
        self.decor = SpriteSlot::from_path(self.config.decor.path.clone());
    }

    pub fn set_sprites(&mut self, foreground: SpriteSlot, decor: SpriteSlot) {
        self.foreground = foreground;
        self.decor = decor;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The current layout. A resize swaps in a new one; holders of the old
    /// `Arc` keep a consistent view of it.
    pub fn layout(&self) -> Arc<Layout> {
        Arc::clone(&self.layout)
    }

    pub fn show_foreground(&self) -> bool {
        self.show_foreground
    }

    pub fn toggle_foreground(&mut self) {
        self.show_foreground = !self.show_foreground;
    }

    /// Discard the layout and generate a fresh one for `viewport`.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.layout = Arc::new(
            SceneElementFactory::new(&self.config.scene)
                .with_drifters(self.config.decor.density)
                .generate_layout(viewport, &mut self.rng),
        );
        log_info!(
            "Layout rebuilt for {}x{}: {} buildings, {} windows ({} hidden), {} stars",
            viewport.width,
            viewport.height,
            self.layout.buildings().len(),
            self.layout.window_count(),
            self.layout.hidden_windows(),
            self.layout.stars().len()
        );
    }

    /// Remember the latest size; the rebuild happens once, before the next frame.
    pub fn request_resize(&mut self, viewport: Viewport) {
        self.pending_resize = Some(viewport);
    }

    pub fn apply_pending_resize(&mut self) -> bool {
        match self.pending_resize.take() {
            Some(viewport) if viewport != self.viewport => {
                self.resize(viewport);
                true
            }
            _ => false,
        }
    }

    fn poll_sprites(&mut self) {
        if let Some(e) = self.foreground.poll() {
            log_warn!("Foreground sprite unavailable: {}", e);
        }
        if let Some(e) = self.decor.poll() {
            log_warn!("Decoration sprite unavailable: {}", e);
        }
    }

    /// Paint the current layout at `elapsed` and blit it to `surface`.
    pub fn draw_frame(
        &mut self,
        surface: &mut dyn Surface,
        elapsed: Duration,
    ) -> Result<FrameStats, RenderError> {
        self.apply_pending_resize();
        self.poll_sprites();

        let layout = Arc::clone(&self.layout);
        let sprites = SpriteState {
            foreground: self.foreground.sprite().filter(|_| self.show_foreground),
            foreground_scale: self.config.sprite.scale,
            decor: self.decor.sprite(),
            decor_scale: self.config.decor.scale,
        };

        let stats = self
            .renderer
            .render_frame(&layout, elapsed.as_secs_f64() * 1000.0, &sprites);
        self.renderer.blit(surface)?;
        Ok(stats)
    }

    fn apply(
        &mut self,
        action: Action,
        renderer: &mut TerminalRenderer,
    ) -> Result<(), RenderError> {
        match action {
            Action::Quit => {}
            Action::ToggleForeground => self.toggle_foreground(),
            Action::Zoom(steps) => renderer.zoom_by(steps),
            Action::Resize(width, height) => {
                renderer.manual_resize(width, height)?;
                self.request_resize(renderer.pixel_size());
            }
        }
        Ok(())
    }

    /// Mount the animation loop on `renderer` and run until quit or until
    /// the terminal can no longer be drawn to.
    pub async fn run(&mut self, renderer: &mut TerminalRenderer) -> ClockExit {
        let ticker = IntervalTicker::new(self.config.clock.fps);
        let mut clock = AnimationClock::new(ticker, FrameSkip::every(self.config.clock.frame_skip));
        let handle = clock.handle();

        log_info!(
            "Scene started at {} fps (frame skip {})",
            self.config.clock.fps,
            self.config.clock.frame_skip
        );

        let exit = clock
            .start(|elapsed| {
                while event::poll(Duration::ZERO)? {
                    let Some(action) = action_for(&event::read()?) else {
                        continue;
                    };
                    if action == Action::Quit {
                        handle.stop();
                        return Ok(());
                    }
                    self.apply(action, &mut *renderer)?;
                }

                self.draw_frame(&mut *renderer, elapsed)?;
                Ok(())
            })
            .await;

        match &exit {
            ClockExit::SurfaceLost(e) => log_warn!("Stopped drawing: {}", e),
            _ => log_info!("Scene stopped after {} frames", clock.frames()),
        }

        exit
    }
}
