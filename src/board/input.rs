use crate::board::model::{swatch, Color, Point, DEFAULT_STROKE_COLOR};
use crate::board::surface::RasterSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeMode {
    Idle,
    Drawing,
}

/// Turns pointer events into strokes on a `RasterSurface`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeInput {
    mode: StrokeMode,
    color: Color,
}

impl Default for StrokeInput {
    fn default() -> Self {
        Self::new(DEFAULT_STROKE_COLOR)
    }
}

impl StrokeInput {
    pub fn new(color: Color) -> Self {
        Self {
            mode: StrokeMode::Idle,
            color,
        }
    }

    pub fn mode(&self) -> StrokeMode {
        self.mode
    }

    pub fn is_drawing(&self) -> bool {
        self.mode == StrokeMode::Drawing
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Applies to strokes started after this call.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Select a palette swatch. Unknown indices are ignored.
    pub fn select_swatch(&mut self, index: usize) -> bool {
        match swatch(index) {
            Some(color) => {
                self.color = color;
                true
            }
            None => false,
        }
    }

    pub fn handle_pointer_down(&mut self, surface: &mut RasterSurface, point: Point) {
        if !point.is_finite() {
            return;
        }
        if surface.backdrop().is_none() {
            surface.set_backdrop(Color::BLACK);
        }
        surface.begin_stroke(point, self.color);
        self.mode = StrokeMode::Drawing;
    }

    pub fn handle_pointer_move(&mut self, surface: &mut RasterSurface, point: Point) {
        if self.mode != StrokeMode::Drawing {
            return;
        }
        surface.extend_stroke(point);
    }

    /// Pointer released or left the surface.
    pub fn handle_pointer_up(&mut self) {
        self.mode = StrokeMode::Idle;
    }
}
