use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Stdout, Write};

use crate::canvas::{Canvas, Rgb};
use crate::error::RenderError;
use crate::scene::Viewport;

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '▀';

/// Something a finished off-screen frame can be handed to.
pub trait Surface {
    /// Drawable size in pixels.
    fn pixel_size(&self) -> Viewport;

    /// Show `canvas` in one operation.
    fn present(&mut self, canvas: &Canvas) -> Result<(), RenderError>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cell {
    pub top: Rgb,
    pub bottom: Rgb,
}

pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        MIN_ZOOM
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

/// Presentation zoom about the screen centre. Opens fully zoomed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Default for Zoom {
    fn default() -> Self {
        Zoom(MAX_ZOOM)
    }
}

impl Zoom {
    pub fn new(factor: f32) -> Self {
        Zoom(clamp_zoom(factor))
    }

    pub fn factor(self) -> f32 {
        self.0
    }

    /// Positive steps zoom in, negative steps zoom out.
    pub fn step(self, steps: f32) -> Self {
        Zoom::new(((self.0 + steps * ZOOM_STEP) * 10.0).round() / 10.0)
    }
}

/// Source coordinate for `dest` when zooming about the centre of `extent`.
fn zoom_source(dest: u32, extent: u32, zoom: f32) -> u32 {
    let centre = extent as f32 / 2.0;
    let src = centre + (dest as f32 + 0.5 - centre) / zoom;
    (src.floor().max(0.0) as u32).min(extent.saturating_sub(1))
}

/// Convert a canvas into half-block cells, zoomed about the screen centre.
///
/// `cells` must hold `cols * rows` entries. Pixels outside the canvas (for
/// example while a resize is still pending) come out black.
pub fn canvas_to_cells(canvas: &Canvas, cols: u16, rows: u16, zoom: f32, cells: &mut [Cell]) {
    let zoom = clamp_zoom(zoom);
    let width = cols as u32;
    let height = rows as u32 * 2;
    let stride = canvas.width() as usize;
    let pixels = canvas.pixmap().map(|p| p.pixels()).unwrap_or_default();

    let sample = |x: u32, y: u32| -> Rgb {
        let sx = zoom_source(x, width, zoom) as usize;
        let sy = zoom_source(y, height, zoom) as usize;
        if sx >= stride {
            return Rgb::BLACK;
        }
        pixels
            .get(sy * stride + sx)
            .map_or(Rgb::BLACK, |p| Rgb::from(*p))
    };

    for row in 0..rows as u32 {
        for col in 0..width {
            let idx = (row * width + col) as usize;
            if let Some(cell) = cells.get_mut(idx) {
                *cell = Cell {
                    top: sample(col, row * 2),
                    bottom: sample(col, row * 2 + 1),
                };
            }
        }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

pub struct TerminalRenderer {
    stdout: Stdout,
    width: u16,
    height: u16,
    zoom: Zoom,
    buffer: Vec<Cell>,
    last_buffer: Vec<Cell>,
    force_redraw: bool,
    active: bool,
}

impl TerminalRenderer {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = io::stdout();
        let buffer_size = (width as usize) * (height as usize);

        Ok(Self {
            stdout,
            width,
            height,
            zoom: Zoom::default(),
            buffer: vec![Cell::default(); buffer_size],
            last_buffer: vec![Cell::default(); buffer_size],
            force_redraw: true,
            active: false,
        })
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.stdout,
            EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;
        self.active = true;
        self.force_redraw = true;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(
            self.stdout,
            DisableMouseCapture,
            LeaveAlternateScreen,
            cursor::Show,
            ResetColor
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn manual_resize(&mut self, width: u16, height: u16) -> io::Result<()> {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            let buffer_size = (width as usize) * (height as usize);
            self.buffer = vec![Cell::default(); buffer_size];
            self.last_buffer = vec![Cell::default(); buffer_size];
            self.force_redraw = true;
            execute!(self.stdout, Clear(ClearType::All))?;
        }
        Ok(())
    }

    /// Positive steps zoom in, negative steps zoom out.
    pub fn zoom_by(&mut self, steps: f32) {
        let next = self.zoom.step(steps);
        if next != self.zoom {
            self.zoom = next;
            self.force_redraw = true;
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut current: Option<Cell> = None;
        let mut last_pos: Option<(u16, u16)> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = (y as usize) * (self.width as usize) + (x as usize);

                let (Some(&cell), Some(&last_cell)) =
                    (self.buffer.get(idx), self.last_buffer.get(idx))
                else {
                    continue;
                };

                if !self.force_redraw && cell == last_cell {
                    continue;
                }

                let expected_pos = last_pos.map(|(lx, ly)| (lx + 1, ly));
                if expected_pos != Some((x, y)) {
                    queue!(self.stdout, cursor::MoveTo(x, y))?;
                }

                if current.is_none_or(|c| c.top != cell.top) {
                    queue!(self.stdout, SetForegroundColor(color(cell.top)))?;
                }
                if current.is_none_or(|c| c.bottom != cell.bottom) {
                    queue!(self.stdout, SetBackgroundColor(color(cell.bottom)))?;
                }
                current = Some(cell);

                queue!(self.stdout, Print(HALF_BLOCK))?;
                last_pos = Some((x, y));
            }
        }

        if current.is_some() {
            queue!(self.stdout, ResetColor)?;
        }

        self.stdout.flush()?;
        self.last_buffer.copy_from_slice(&self.buffer);
        self.force_redraw = false;
        Ok(())
    }
}

impl Surface for TerminalRenderer {
    fn pixel_size(&self) -> Viewport {
        Viewport::new(self.width as u32, self.height as u32 * 2)
    }

    fn present(&mut self, canvas: &Canvas) -> Result<(), RenderError> {
        canvas_to_cells(
            canvas,
            self.width,
            self.height,
            self.zoom.factor(),
            &mut self.buffer,
        );
        self.flush()?;
        Ok(())
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Rect;

    #[test]
    fn test_clamp_zoom() {
        assert_eq!(clamp_zoom(0.5), 1.0);
        assert_eq!(clamp_zoom(3.0), 2.0);
        assert_eq!(clamp_zoom(1.3), 1.3);
        assert_eq!(clamp_zoom(f32::NAN), 1.0);
    }

    #[test]
    fn test_zoom_opens_fully_zoomed_in() {
        assert_eq!(Zoom::default().factor(), MAX_ZOOM);
    }

    #[test]
    fn test_zoom_steps_are_tenths_and_clamped() {
        let zoom = Zoom::default().step(-1.0);
        assert_eq!(zoom.factor(), 1.9);
        assert_eq!(zoom.step(-3.0).factor(), 1.6);
        assert_eq!(zoom.step(5.0).factor(), MAX_ZOOM);
        assert_eq!(Zoom::new(1.0).step(-1.0).factor(), MIN_ZOOM);
        assert_eq!(Zoom::new(f32::NAN).factor(), MIN_ZOOM);
    }

    #[test]
    fn test_unzoomed_cells_stack_two_pixels() {
        let mut canvas = Canvas::new(2, 4);
        canvas.fill_rect(Rect::new(0.0, 0.0, 2.0, 1.0), Rgb::new(255, 0, 0), 1.0);
        canvas.fill_rect(Rect::new(0.0, 1.0, 2.0, 1.0), Rgb::new(0, 0, 255), 1.0);

        let mut cells = vec![Cell::default(); 4];
        canvas_to_cells(&canvas, 2, 2, 1.0, &mut cells);

        assert_eq!(cells[0].top, Rgb::new(255, 0, 0));
        assert_eq!(cells[0].bottom, Rgb::new(0, 0, 255));
        assert_eq!(cells[2], Cell::default());
    }

    #[test]
    fn test_zoom_keeps_centre_fixed() {
        for zoom in [1.0, 1.5, 2.0] {
            assert_eq!(zoom_source(50, 100, zoom), 50);
        }
        assert_eq!(zoom_source(0, 100, 2.0), 25);
        assert_eq!(zoom_source(99, 100, 2.0), 74);
    }

    #[test]
    fn test_smaller_canvas_reads_as_black() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgb::new(9, 9, 9), 1.0);

        let mut cells = vec![Cell::default(); 4];
        canvas_to_cells(&canvas, 2, 2, 1.0, &mut cells);

        assert_eq!(cells[0].top, Rgb::new(9, 9, 9));
        assert_eq!(cells[0].bottom, Rgb::BLACK);
        assert_eq!(cells[1].top, Rgb::BLACK);
    }
}
