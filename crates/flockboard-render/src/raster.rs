//! CPU raster surface on an `image::RgbaImage`.

use crate::renderer::{RenderResult, RendererError};
use crate::surface::{Paint, Surface};
use flockboard_core::elements::GLYPH_ADVANCE;
use image::{Rgba, RgbaImage};
use kurbo::{BezPath, PathEl, Point, Rect};
use peniko::Color;

/// Flattening tolerance for curves, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// Block glyph height as a fraction of the font size.
const GLYPH_HEIGHT: f64 = 0.7;

/// Block glyph width as a fraction of the advance.
const GLYPH_FILL: f64 = 0.8;

/// Anti-aliased straight-alpha RGBA surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidSize { width, height });
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// RGBA of one pixel, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Which pixels hold any paint, row-major.
    pub fn coverage_mask(&self) -> Vec<bool> {
        self.image.pixels().map(|p| p.0[3] > 0).collect()
    }

    /// True when nothing is painted.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    fn composite(&mut self, coverage: &Coverage, color: Color) {
        let rgba = color.to_rgba8();
        for row in 0..coverage.height {
            for col in 0..coverage.width {
                let c = coverage.values[row * coverage.width + col];
                if c <= 0.0 {
                    continue;
                }
                let alpha = (f32::from(rgba.a) * c).round() as u8;
                let x = (coverage.x0 + col) as u32;
                let y = (coverage.y0 + row) as u32;
                blend(self.image.get_pixel_mut(x, y), [rgba.r, rgba.g, rgba.b], alpha);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (width, height) = self.size();
        let Some((x0, x1)) = span(rect.x0, rect.x1, width) else {
            return;
        };
        let Some((y0, y1)) = span(rect.y0, rect.y1, height) else {
            return;
        };
        let rgba = color.to_rgba8();
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if rect.contains(center) {
                    blend(self.image.get_pixel_mut(x as u32, y as u32), [rgba.r, rgba.g, rgba.b], rgba.a);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke(&mut self, path: &BezPath, paint: &Paint) {
        let segments = flatten_segments(path, paint.dash);
        let half = paint.width.max(0.0) / 2.0;
        let Some(mut coverage) = Coverage::for_segments(&segments, half + 1.0, self.size()) else {
            return;
        };
        for &(a, b) in &segments {
            coverage.add_capsule(a, b, half);
        }
        self.composite(&coverage, paint.color);
    }

    fn erase_disc(&mut self, center: Point, radius: f64) {
        let (width, height) = self.size();
        let reach = radius + 1.0;
        let Some((x0, x1)) = span(center.x - reach, center.x + reach, width) else {
            return;
        };
        let Some((y0, y1)) = span(center.y - reach, center.y + reach, height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let d = (Point::new(x as f64 + 0.5, y as f64 + 0.5) - center).hypot();
                let c = (radius + 0.5 - d).clamp(0.0, 1.0);
                if c <= 0.0 {
                    continue;
                }
                let pixel = self.image.get_pixel_mut(x as u32, y as u32);
                let alpha = (f64::from(pixel.0[3]) * (1.0 - c)).round() as u8;
                if alpha == 0 {
                    *pixel = Rgba([0, 0, 0, 0]);
                } else {
                    pixel.0[3] = alpha;
                }
            }
        }
    }

    fn fill_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color) {
        let advance = font_size * GLYPH_ADVANCE;
        let glyph_height = font_size * GLYPH_HEIGHT;
        for (index, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = origin.x + index as f64 * advance;
            self.fill_rect(
                Rect::new(x, origin.y - glyph_height, x + advance * GLYPH_FILL, origin.y),
                color,
            );
        }
    }

    fn read_pixels(&self) -> Vec<u8> {
        self.image.as_raw().clone()
    }

    fn write_pixels(&mut self, pixels: &[u8]) -> RenderResult<()> {
        let expected = self.image.as_raw().len();
        if pixels.len() != expected {
            return Err(RendererError::PixelMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        for (dst, src) in self.image.pixels_mut().zip(pixels.chunks_exact(4)) {
            dst.0.copy_from_slice(src);
        }
        Ok(())
    }
}

/// Per-stroke coverage over the clipped bounding box of its segments.
struct Coverage {
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Coverage {
    fn for_segments(segments: &[(Point, Point)], margin: f64, (width, height): (u32, u32)) -> Option<Self> {
        let (first, rest) = segments.split_first()?;
        let bounds = rest
            .iter()
            .fold(Rect::from_points(first.0, first.1), |acc, (a, b)| {
                acc.union_pt(*a).union_pt(*b)
            })
            .inflate(margin, margin);
        let (x0, x1) = span(bounds.x0, bounds.x1, width)?;
        let (y0, y1) = span(bounds.y0, bounds.y1, height)?;
        let (w, h) = (x1 - x0, y1 - y0);
        Some(Self {
            x0,
            y0,
            width: w,
            height: h,
            values: vec![0.0; w * h],
        })
    }

    /// Max-accumulate the coverage of a round-capped segment.
    fn add_capsule(&mut self, a: Point, b: Point, half: f64) {
        let reach = half + 1.0;
        let lo = (a.x.min(b.x) - reach, a.y.min(b.y) - reach);
        let hi = (a.x.max(b.x) + reach, a.y.max(b.y) + reach);
        let col_start = ((lo.0.floor() as i64) - self.x0 as i64).max(0) as usize;
        let col_end = ((hi.0.ceil() as i64) - self.x0 as i64).clamp(0, self.width as i64) as usize;
        let row_start = ((lo.1.floor() as i64) - self.y0 as i64).max(0) as usize;
        let row_end = ((hi.1.ceil() as i64) - self.y0 as i64).clamp(0, self.height as i64) as usize;
        for row in row_start..row_end {
            for col in col_start..col_end {
                let center = Point::new((self.x0 + col) as f64 + 0.5, (self.y0 + row) as f64 + 0.5);
                let c = (half + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0) as f32;
                let slot = &mut self.values[row * self.width + col];
                if c > *slot {
                    *slot = c;
                }
            }
        }
    }
}

/// Straight-alpha source-over.
fn blend(dst: &mut Rgba<u8>, src: [u8; 3], src_alpha: u8) {
    if src_alpha == 0 {
        return;
    }
    let sa = f32::from(src_alpha) / 255.0;
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for (channel, value) in src.iter().enumerate() {
        let mixed = (f32::from(*value) * sa + f32::from(dst.0[channel]) * da * (1.0 - sa)) / out_a;
        dst.0[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Pixel range `[start, end)` covering `lo..hi`, clipped to `0..limit`.
fn span(lo: f64, hi: f64, limit: u32) -> Option<(usize, usize)> {
    let start = lo.floor().max(0.0);
    let end = hi.ceil().min(f64::from(limit));
    (start < end).then_some((start as usize, end as usize))
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    let t = if len2 == 0.0 {
        0.0
    } else {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    };
    (p - (a + ab * t)).hypot()
}

/// Flatten a path (optionally dashed) into line segments.
fn flatten_segments(path: &BezPath, dash: Option<f64>) -> Vec<(Point, Point)> {
    let mut segments = Vec::new();
    let mut start = None;
    let mut last = None;
    let mut collect = |el: PathEl| match el {
        PathEl::MoveTo(p) => {
            start = Some(p);
            last = Some(p);
        }
        PathEl::LineTo(p) => {
            if let Some(from) = last {
                segments.push((from, p));
            }
            last = Some(p);
        }
        PathEl::ClosePath => {
            if let (Some(from), Some(to)) = (last, start) {
                if from != to {
                    segments.push((from, to));
                }
            }
            last = start;
        }
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    };
    match dash {
        Some(length) if length > 0.0 => {
            let pattern = [length, length];
            kurbo::flatten(kurbo::dash(path.iter(), 0.0, &pattern), FLATTEN_TOLERANCE, &mut collect);
        }
        _ => kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, &mut collect),
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(width: f64) -> Paint {
        Paint::solid(Color::from_rgba8(0, 0, 0, 255), width)
    }

    fn line(from: (f64, f64), to: (f64, f64)) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(from);
        path.line_to(to);
        path
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = RasterSurface::new(4, 3).unwrap();
        assert_eq!(surface.size(), (4, 3));
        assert!(surface.is_blank());
        assert!(RasterSurface::new(0, 3).is_err());
    }

    #[test]
    fn test_stroke_covers_line_center() {
        let mut surface = RasterSurface::new(20, 20).unwrap();
        surface.stroke(&line((2.0, 10.5), (18.0, 10.5)), &black(1.0));
        assert_eq!(surface.pixel(10, 10), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(10, 5).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut surface = RasterSurface::new(40, 5).unwrap();
        surface.stroke(&line((0.0, 2.5), (40.0, 2.5)), &black(1.0).dashed(5.0));
        // First dash spans 0..5, the gap 5..10.
        assert_eq!(surface.pixel(2, 2).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(7, 2).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(12, 2).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_half_alpha_composites_over_white() {
        let mut surface = RasterSurface::new(3, 3).unwrap();
        surface.write_pixels(&[255; 36]).unwrap();
        let paint = Paint::solid(Color::from_rgba8(0, 0, 0, 255).multiply_alpha(0.5), 3.0);
        surface.stroke(&line((0.0, 1.5), (3.0, 1.5)), &paint);
        let [r, _, _, a] = surface.pixel(1, 1).unwrap();
        assert_eq!(a, 255);
        assert!((126..=129).contains(&r), "got {r}");
    }

    #[test]
    fn test_erase_clears_alpha() {
        let mut surface = RasterSurface::new(10, 10).unwrap();
        surface.write_pixels(&[200; 400]).unwrap();
        surface.erase_disc(Point::new(5.0, 5.0), 2.0);
        assert_eq!(surface.pixel(5, 5), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(0, 0), Some([200; 4]));
    }

    #[test]
    fn test_text_block_glyphs() {
        let mut surface = RasterSurface::new(40, 20).unwrap();
        surface.fill_text(Point::new(0.0, 15.0), "a b", 10.0, Color::from_rgba8(255, 0, 0, 255));
        assert_eq!(surface.pixel(2, 12), Some([255, 0, 0, 255]));
        // The space leaves its cell empty.
        assert_eq!(surface.pixel(8, 12).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(14, 12).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_write_pixels_rejects_wrong_size() {
        let mut surface = RasterSurface::new(2, 2).unwrap();
        let err = surface.write_pixels(&[0; 3]).unwrap_err();
        assert!(matches!(err, RendererError::PixelMismatch { expected: 16, actual: 3 }));
    }

    #[test]
    fn test_stroke_outside_surface_is_clipped() {
        let mut surface = RasterSurface::new(5, 5).unwrap();
        surface.stroke(&line((-50.0, -50.0), (-40.0, -40.0)), &black(2.0));
        assert!(surface.is_blank());
    }
}
