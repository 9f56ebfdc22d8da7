//! Render engine: reconciles the element collection onto a surface.

use crate::surface::{Paint, Surface};
use flockboard_core::canvas::ElementCollection;
use flockboard_core::elements::{Element, ElementStyle};
use flockboard_core::viewport::Viewport;
use kurbo::{BezPath, Point};
use peniko::Color;
use thiserror::Error;

/// Grid spacing in canvas units.
pub const GRID_SIZE: f64 = 20.0;

/// Grid line color (`#e0e0e0`).
pub const GRID_COLOR: Color = Color::from_rgb8(0xe0, 0xe0, 0xe0);

pub const GRID_ALPHA: f32 = 0.5;

const GRID_LINE_WIDTH: f64 = 1.0;

/// Opacity of the in-progress shape.
pub const PREVIEW_ALPHA: f32 = 0.5;

/// Dash length of the in-progress shape, in canvas units.
pub const PREVIEW_DASH: f64 = 5.0;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Pixel buffer holds {actual} bytes, surface needs {expected}")]
    PixelMismatch { expected: usize, actual: usize },
    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Inputs of a full redraw.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Elements in paint order.
    pub elements: &'a ElementCollection,
    pub viewport: Viewport,
    pub grid: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(elements: &'a ElementCollection) -> Self {
        Self {
            elements,
            viewport: Viewport::default(),
            grid: false,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }
}

/// CPU render engine. Stateless: identical inputs give identical pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Clear, paint the grid if enabled, then every element in order.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, ctx: &RenderContext) {
        surface.clear();
        if ctx.grid {
            self.paint_grid(surface, &ctx.viewport);
        }
        for element in ctx.elements {
            self.paint_element(surface, element, &ctx.viewport);
        }
    }

    /// Full redraw, then `preview` dashed at half opacity. Nothing is committed.
    pub fn render_preview<S: Surface + ?Sized>(&self, surface: &mut S, ctx: &RenderContext, preview: &Element) {
        self.render(surface, ctx);
        let viewport = &ctx.viewport;
        let style = preview.style();
        let color = style.stroke().multiply_alpha(PREVIEW_ALPHA);
        match preview {
            Element::Text(text) => surface.fill_text(
                viewport.canvas_to_screen(text.position),
                &text.content,
                text.font_size * viewport.zoom,
                color,
            ),
            _ => {
                let paint = Paint::solid(color, f64::from(style.stroke_width) * viewport.zoom)
                    .dashed(PREVIEW_DASH * viewport.zoom);
                self.stroke_canvas_path(surface, preview.to_path(), viewport, &paint);
            }
        }
    }

    /// Paint one element over whatever is on the surface.
    pub fn paint_element<S: Surface + ?Sized>(&self, surface: &mut S, element: &Element, viewport: &Viewport) {
        let style = element.style();
        match element {
            Element::Text(text) => surface.fill_text(
                viewport.canvas_to_screen(text.position),
                &text.content,
                text.font_size * viewport.zoom,
                element_color(style),
            ),
            _ => {
                let paint = stroke_paint(style, viewport);
                self.stroke_canvas_path(surface, element.to_path(), viewport, &paint);
            }
        }
    }

    /// Paint a single two-point segment (local pen ticks and remote draws).
    pub fn paint_segment<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        from: Point,
        to: Point,
        style: &ElementStyle,
        viewport: &Viewport,
    ) {
        let mut path = BezPath::new();
        path.move_to(from);
        path.line_to(to);
        self.stroke_canvas_path(surface, path, viewport, &stroke_paint(style, viewport));
    }

    /// Clear a disc of `radius` canvas units around `center`.
    pub fn paint_eraser<S: Surface + ?Sized>(&self, surface: &mut S, center: Point, radius: f64, viewport: &Viewport) {
        surface.erase_disc(viewport.canvas_to_screen(center), radius * viewport.zoom);
    }

    fn stroke_canvas_path<S: Surface + ?Sized>(&self, surface: &mut S, path: BezPath, viewport: &Viewport, paint: &Paint) {
        if path.elements().is_empty() {
            return;
        }
        surface.stroke(&(viewport.transform() * path), paint);
    }

    fn paint_grid<S: Surface + ?Sized>(&self, surface: &mut S, viewport: &Viewport) {
        let (width, height) = surface.size();
        let inverse = viewport.inverse_transform();
        let top_left = inverse * Point::ZERO;
        let bottom_right = inverse * Point::new(f64::from(width), f64::from(height));
        let start_x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        let start_y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        let end_x = (bottom_right.x / GRID_SIZE).ceil() * GRID_SIZE;
        let end_y = (bottom_right.y / GRID_SIZE).ceil() * GRID_SIZE;

        let mut path = BezPath::new();
        let mut x = start_x;
        while x <= end_x {
            path.move_to((x, start_y));
            path.line_to((x, end_y));
            x += GRID_SIZE;
        }
        let mut y = start_y;
        while y <= end_y {
            path.move_to((start_x, y));
            path.line_to((end_x, y));
            y += GRID_SIZE;
        }
        let paint = Paint::solid(GRID_COLOR.multiply_alpha(GRID_ALPHA), GRID_LINE_WIDTH * viewport.zoom);
        self.stroke_canvas_path(surface, path, viewport, &paint);
    }
}

fn element_color(style: &ElementStyle) -> Color {
    style.stroke().multiply_alpha(style.opacity as f32)
}

fn stroke_paint(style: &ElementStyle, viewport: &Viewport) -> Paint {
    Paint::solid(element_color(style), f64::from(style.stroke_width) * viewport.zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RasterSurface;
    use flockboard_core::elements::{
        Arrow, Brush, Circle, Freehand, Line, Rectangle, SerializableColor, Text,
    };

    fn style(width: u32) -> ElementStyle {
        ElementStyle::new(SerializableColor::black(), width, 1.0)
    }

    fn alpha(surface: &RasterSurface, x: u32, y: u32) -> u8 {
        surface.pixel(x, y).map_or(0, |p| p[3])
    }

    fn collection(elements: Vec<Element>) -> ElementCollection {
        ElementCollection::from(elements)
    }

    #[test]
    fn test_empty_render_is_blank() {
        let mut surface = RasterSurface::new(64, 64).unwrap();
        surface.write_pixels(&vec![255; 64 * 64 * 4]).unwrap();
        let elements = ElementCollection::default();
        Renderer::new().render(&mut surface, &RenderContext::new(&elements));
        assert!(surface.is_blank());
    }

    #[test]
    fn test_grid_lines_every_twenty_units() {
        let mut surface = RasterSurface::new(64, 64).unwrap();
        let elements = ElementCollection::default();
        Renderer::new().render(&mut surface, &RenderContext::new(&elements).with_grid(true));
        let [r, g, b, a] = surface.pixel(20, 5).unwrap();
        assert_eq!((r, g, b), (0xe0, 0xe0, 0xe0));
        assert!(a > 0 && a <= 128);
        assert_eq!(alpha(&surface, 10, 10), 0);
    }

    #[test]
    fn test_render_is_idempotent() {
        let elements = collection(vec![
            Element::Rectangle(Rectangle::from_corners(Point::new(5.0, 5.0), Point::new(40.0, 30.0), style(3))),
            Element::Circle(Circle::from_drag(Point::new(30.0, 30.0), Point::new(40.0, 30.0), style(2))),
        ]);
        let ctx = RenderContext::new(&elements).with_grid(true);
        let mut a = RasterSurface::new(64, 64).unwrap();
        let mut b = RasterSurface::new(64, 64).unwrap();
        Renderer::new().render(&mut a, &ctx);
        Renderer::new().render(&mut b, &ctx);
        Renderer::new().render(&mut b, &ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_extent_rectangle_normalizes() {
        let forward = collection(vec![Element::Rectangle(Rectangle::new(
            Point::new(10.0, 10.0),
            30.0,
            20.0,
            style(2),
        ))]);
        let backward = collection(vec![Element::Rectangle(Rectangle::new(
            Point::new(40.0, 30.0),
            -30.0,
            -20.0,
            style(2),
        ))]);
        let mut a = RasterSurface::new(64, 64).unwrap();
        let mut b = RasterSurface::new(64, 64).unwrap();
        Renderer::new().render(&mut a, &RenderContext::new(&forward));
        Renderer::new().render(&mut b, &RenderContext::new(&backward));
        assert_eq!(a.coverage_mask(), b.coverage_mask());
        assert_eq!(alpha(&a, 20, 10), 255);
        assert_eq!(alpha(&a, 20, 20), 0);
    }

    #[test]
    fn test_single_point_freehand_paints_nothing() {
        let elements = collection(vec![Element::Freehand(Freehand::from_points(
            vec![Point::new(10.0, 10.0)],
            Brush::Pen,
            style(5),
        ))]);
        let mut surface = RasterSurface::new(32, 32).unwrap();
        Renderer::new().render(&mut surface, &RenderContext::new(&elements));
        assert!(surface.is_blank());
    }

    #[test]
    fn test_redraw_matches_incremental_segments() {
        let points = vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 10.0)];
        let stroke_style = style(3);
        let renderer = Renderer::new();
        let viewport = Viewport::default();

        let mut incremental = RasterSurface::new(24, 24).unwrap();
        for pair in points.windows(2) {
            renderer.paint_segment(&mut incremental, pair[0], pair[1], &stroke_style, &viewport);
        }

        let elements = collection(vec![Element::Freehand(Freehand::from_points(points, Brush::Pen, stroke_style))]);
        let mut redrawn = RasterSurface::new(24, 24).unwrap();
        renderer.render(&mut redrawn, &RenderContext::new(&elements));

        assert_eq!(incremental.coverage_mask(), redrawn.coverage_mask());
        assert!(!redrawn.is_blank());
    }

    #[test]
    fn test_arrow_draws_head_ticks() {
        let elements = collection(vec![Element::Arrow(Arrow::new(
            Point::new(10.0, 50.0),
            Point::new(90.0, 50.0),
            style(2),
        ))]);
        let mut surface = RasterSurface::new(100, 100).unwrap();
        Renderer::new().render(&mut surface, &RenderContext::new(&elements));
        // Head ticks end 20 units back at +-30 degrees: (72.68, 40) and (72.68, 60).
        assert!(alpha(&surface, 73, 40) > 0);
        assert!(alpha(&surface, 73, 59) > 0);
        assert_eq!(alpha(&surface, 73, 30), 0);
    }

    #[test]
    fn test_text_fills_with_stroke_color() {
        let red = ElementStyle::new(SerializableColor::new(255, 0, 0, 255), 5, 1.0);
        let elements = collection(vec![Element::Text(Text::new(Point::new(10.0, 40.0), "Hi".into(), red))]);
        let mut surface = RasterSurface::new(64, 64).unwrap();
        Renderer::new().render(&mut surface, &RenderContext::new(&elements));
        // Font size 15: the first glyph cell spans x 10..17.2, y 29.5..40.
        assert_eq!(surface.pixel(12, 35), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let faint = ElementStyle::new(SerializableColor::black(), 4, 0.5);
        let elements = collection(vec![Element::Line(Line::new(
            Point::new(0.0, 10.0),
            Point::new(30.0, 10.0),
            faint,
        ))]);
        let mut surface = RasterSurface::new(32, 32).unwrap();
        Renderer::new().render(&mut surface, &RenderContext::new(&elements));
        assert!((126..=129).contains(&alpha(&surface, 15, 10)));
    }

    #[test]
    fn test_preview_is_dashed_half_alpha() {
        let elements = ElementCollection::default();
        let preview = Element::Line(Line::new(Point::new(0.0, 10.5), Point::new(40.0, 10.5), style(1)));
        let mut surface = RasterSurface::new(48, 24).unwrap();
        Renderer::new().render_preview(&mut surface, &RenderContext::new(&elements), &preview);
        assert!((126..=129).contains(&alpha(&surface, 2, 10)));
        assert_eq!(alpha(&surface, 7, 10), 0);
        assert!(elements.is_empty());
    }

    #[test]
    fn test_zoom_scales_positions() {
        let mut viewport = Viewport::default();
        viewport.zoom_in();
        let renderer = Renderer::new();
        let mut surface = RasterSurface::new(64, 64).unwrap();
        renderer.paint_segment(&mut surface, Point::new(20.0, 20.0), Point::new(20.0, 20.0), &style(2), &viewport);
        // Canvas (20, 20) lands on screen (24, 24).
        assert!(alpha(&surface, 24, 24) > 0);
        assert_eq!(alpha(&surface, 20, 20), 0);
    }

    #[test]
    fn test_eraser_clears_local_pixels() {
        let renderer = Renderer::new();
        let viewport = Viewport::default();
        let mut surface = RasterSurface::new(32, 32).unwrap();
        renderer.paint_segment(&mut surface, Point::new(0.0, 16.0), Point::new(32.0, 16.0), &style(6), &viewport);
        renderer.paint_eraser(&mut surface, Point::new(16.0, 16.0), 5.0, &viewport);
        assert_eq!(alpha(&surface, 16, 16), 0);
        assert_eq!(alpha(&surface, 2, 16), 255);
    }
}
