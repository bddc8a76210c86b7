/*!
# Raster surface

The drawing primitives the renderer needs, and an `image::RgbaImage`
implementation of them that encodes to PNG.

Coordinates are in canvas pixels as `f64`. A rectangle covers every pixel
column its span touches, so boxes narrower than a pixel still show up.
*/

use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba as ImageRgba, RgbaImage};

use crate::color::Rgba;
use crate::font;

/// Dash pattern of `dashed_line`, in pixels
const DASH_ON: f64 = 3.0;
const DASH_OFF: f64 = 2.0;

/// Position of a gradient stop along a rectangle's width, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba,
}

pub trait RasterSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba);
    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba);

    /// Horizontal dashed line from `x1` to `x2`.
    fn dashed_line(&mut self, x1: f64, x2: f64, y: f64, color: Rgba) {
        let mut x = x1;
        while x < x2 {
            let end = (x + DASH_ON).min(x2);
            self.line(x, y, end, y, color);
            x = end + DASH_OFF;
        }
    }

    /// Horizontal linear gradient across the rectangle.
    fn gradient_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stops: &[GradientStop]);
    /// Draw `text` with its top-left corner at `(x, y)`.
    fn text(&mut self, x: f64, y: f64, text: &str, color: Rgba);
    fn encode_png(&self) -> Result<Vec<u8>>;
}

/// CPU raster surface backed by an RGBA image.
pub struct ImageSurface {
    img: RgbaImage,
}

impl ImageSurface {
    /// Zero dimensions are raised to one pixel; PNG cannot hold an empty image.
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        Self { img: RgbaImage::from_pixel(width.max(1), height.max(1), ImageRgba(background)) }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.img.width() && y < self.img.height()).then(|| self.img.get_pixel(x, y).0)
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.img.width() as i64 || y >= self.img.height() as i64 {
            return;
        }
        let px = self.img.get_pixel_mut(x as u32, y as u32);
        let alpha = color[3] as u32;
        if alpha == 255 {
            *px = ImageRgba(color);
            return;
        }
        for c in 0..3 {
            px.0[c] = ((color[c] as u32 * alpha + px.0[c] as u32 * (255 - alpha)) / 255) as u8;
        }
        px.0[3] = px.0[3].max(color[3]);
    }

    /// Pixel columns or rows covered by `[start, start + len)`, at least one.
    fn pixel_range(start: f64, len: f64) -> (i64, i64) {
        let first = start.floor() as i64;
        let last = ((start + len).ceil() as i64).max(first + 1);
        (first, last)
    }
}

impl RasterSurface for ImageSurface {
    fn width(&self) -> u32 {
        self.img.width()
    }

    fn height(&self) -> u32 {
        self.img.height()
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        if w < 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = Self::pixel_range(x, w);
        let (y0, y1) = Self::pixel_range(y, h);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba) {
        // Bresenham line drawing
        let (mut x0, mut y0) = (x0.round() as i64, y0.round() as i64);
        let (x1, y1) = (x1.round() as i64, y1.round() as i64);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn gradient_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stops: &[GradientStop]) {
        match stops {
            [] => return,
            [only] => return self.fill_rect(x, y, w, h, only.color),
            _ => {}
        }
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = Self::pixel_range(x, w);
        let (y0, y1) = Self::pixel_range(y, h);
        for px in x0..x1 {
            let t = ((px as f64 + 0.5 - x) / w).clamp(0.0, 1.0);
            let color = interpolate(stops, t);
            for py in y0..y1 {
                self.blend(px, py, color);
            }
        }
    }

    fn text(&mut self, x: f64, y: f64, text: &str, color: Rgba) {
        let (x, y) = (x.round() as i64, y.round() as i64);
        for (i, c) in text.bytes().enumerate() {
            let left = x + (i as u32 * font::ADVANCE) as i64;
            for row in 0..font::GLYPH_HEIGHT {
                for col in 0..font::GLYPH_WIDTH {
                    if font::is_set(c, col, row) {
                        self.blend(left + col as i64, y + row as i64, color);
                    }
                }
            }
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(self.img.as_raw(), self.img.width(), self.img.height(), ColorType::Rgba8)
            .context("failed to encode PNG")?;
        Ok(bytes)
    }
}

/// Colour at `t` between the surrounding stops, which must be sorted by offset.
fn interpolate(stops: &[GradientStop], t: f64) -> Rgba {
    let Some(first) = stops.first() else {
        return [0, 0, 0, 0];
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f64::EPSILON);
            let f = (t - a.offset) / span;
            let mut out = [0u8; 4];
            for c in 0..4 {
                out[c] = (a.color[c] as f64 + (b.color[c] as f64 - a.color[c] as f64) * f).round() as u8;
            }
            return out;
        }
    }
    stops[stops.len() - 1].color
}
