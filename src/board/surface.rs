use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::board::error::EvaluateError;
use crate::board::model::{BoundingBox, Color, Point, DEFAULT_ANCHOR, STROKE_WIDTH};

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// RGBA8 pixel buffer the user draws on.
///
/// Background pixels are fully transparent black. Strokes are rasterised as
/// capsules around each segment, which gives round caps and joins.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    line_width: u32,
    stroke_color: Color,
    cursor: Option<Point>,
    backdrop: Option<Color>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; buffer_len(width, height)],
            line_width: STROKE_WIDTH,
            stroke_color: Color::default(),
            cursor: None,
            backdrop: None,
        }
    }

    /// Build a surface sized to the viewport below `top_offset`.
    pub fn for_viewport(viewport_width: u32, viewport_height: u32, top_offset: u32) -> Self {
        Self::new(viewport_width, viewport_height.saturating_sub(top_offset))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }

    pub fn backdrop(&self) -> Option<Color> {
        self.backdrop
    }

    /// Display-only backdrop. Never written into the pixel buffer.
    pub fn set_backdrop(&mut self, color: Color) {
        self.backdrop = Some(color);
    }

    pub fn rgba_pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocate for a new viewport. Content and any open path are dropped,
    /// the line configuration is kept.
    pub fn resize(&mut self, viewport_width: u32, viewport_height: u32, top_offset: u32) {
        let height = viewport_height.saturating_sub(top_offset);
        tracing::debug!(
            from_width = self.width,
            from_height = self.height,
            width = viewport_width,
            height,
            "resizing raster surface"
        );
        self.width = viewport_width;
        self.height = height;
        self.pixels = vec![0; buffer_len(viewport_width, height)];
        self.cursor = None;
    }

    pub fn begin_stroke(&mut self, point: Point, color: Color) {
        if !point.is_finite() {
            return;
        }
        self.stroke_color = color;
        self.cursor = Some(point);
    }

    /// Draw a straight segment from the last point of the open path.
    pub fn extend_stroke(&mut self, point: Point) {
        if !point.is_finite() {
            return;
        }
        let Some(start) = self.cursor else {
            return;
        };
        self.draw_segment(start, point);
        self.cursor = Some(point);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = pixel_index(self.width, x, y);
        Some(Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ))
    }

    /// Extent of every pixel whose alpha is non-zero, or the sentinel box
    /// (`min = full extent`, `max = 0`) when nothing is drawn.
    pub fn non_background_bounds(&self) -> BoundingBox {
        self.scan_drawn()
            .unwrap_or_else(|| BoundingBox::sentinel(self.width, self.height))
    }

    /// Where results for the current drawing should be placed.
    pub fn anchor(&self) -> Point {
        self.scan_drawn()
            .map(|bounds| bounds.center())
            .unwrap_or(DEFAULT_ANCHOR)
    }

    pub fn is_blank(&self) -> bool {
        self.scan_drawn().is_none()
    }

    fn scan_drawn(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        let row_len = self.width as usize * 4;
        if row_len == 0 {
            return None;
        }
        for (y, row) in self.pixels.chunks_exact(row_len).enumerate() {
            for (x, px) in row.chunks_exact(4).enumerate() {
                if px[3] == 0 {
                    continue;
                }
                let (x, y) = (x as u32, y as u32);
                bounds = Some(match bounds {
                    None => BoundingBox {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => BoundingBox {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                });
            }
        }
        bounds
    }

    /// Encode the buffer as a PNG data URI.
    pub fn export_snapshot(&self) -> Result<String, EvaluateError> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&self.pixels, self.width, self.height, ColorType::Rgba8)
            .map_err(|err| EvaluateError::Snapshot(err.to_string()))?;
        let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len() * 4 / 3 + 4);
        uri.push_str(PNG_DATA_URI_PREFIX);
        general_purpose::STANDARD.encode_string(&png, &mut uri);
        Ok(uri)
    }

    fn draw_segment(&mut self, start: Point, end: Point) {
        let radius = self.line_width as f32 / 2.0;
        let pad = radius.ceil() + 1.0;
        let min_x = (start.x.min(end.x) - pad).floor().max(0.0);
        let min_y = (start.y.min(end.y) - pad).floor().max(0.0);
        let max_x = (start.x.max(end.x) + pad).ceil().min(self.width as f32);
        let max_y = (start.y.max(end.y) + pad).ceil().min(self.height as f32);
        if max_x <= min_x || max_y <= min_y {
            return;
        }

        let radius_sq = radius * radius;
        let color = self.stroke_color.to_rgba_array();
        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if point_segment_distance_sq(center, start, end) <= radius_sq {
                    let idx = pixel_index(self.width, x, y);
                    self.pixels[idx..idx + 4].copy_from_slice(&color);
                }
            }
        }
    }
}

fn buffer_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}

fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

fn point_segment_distance_sq(point: Point, start: Point, end: Point) -> f32 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        let px = point.x - start.x;
        let py = point.y - start.y;
        return px * px + py * py;
    }
    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    let px = point.x - (start.x + t * dx);
    let py = point.y - (start.y + t * dy);
    px * px + py * py
}
