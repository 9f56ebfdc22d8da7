//! The 2D raster surface the render engine paints into.

use crate::renderer::RenderResult;
use kurbo::{BezPath, Point};
use peniko::Color;

/// How a path or text run is painted. Everything is in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Color with the element opacity already folded into alpha.
    pub color: Color,
    /// Stroke width.
    pub width: f64,
    /// Dash length, when dashed (on and off runs are equal).
    pub dash: Option<f64>,
}

impl Paint {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(mut self, length: f64) -> Self {
        self.dash = Some(length);
        self
    }
}

/// A raster target. Coordinates are surface pixels; the render engine has
/// already applied the viewport.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Stroke a path with round caps and joins.
    fn stroke(&mut self, path: &BezPath, paint: &Paint);

    /// Clear the alpha of a disc.
    fn erase_disc(&mut self, center: Point, radius: f64);

    /// Fill a single line of text with its baseline starting at `origin`.
    fn fill_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color);

    /// Straight-alpha RGBA8 pixels, row-major.
    fn read_pixels(&self) -> Vec<u8>;

    /// Replace every pixel. Fails when `pixels` does not match the size.
    fn write_pixels(&mut self, pixels: &[u8]) -> RenderResult<()>;
}
