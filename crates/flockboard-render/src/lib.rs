//! Flockboard Render Library
//!
//! The raster surface seam and its CPU implementation, the render engine
//! that reconciles the element collection onto a surface, raster undo/redo
//! history and PNG export.

pub mod export;
pub mod history;
mod raster;
mod renderer;
mod surface;

pub use export::{encode_png, export_png};
pub use history::{DEFAULT_HISTORY_LIMIT, History};
pub use raster::RasterSurface;
pub use renderer::{
    GRID_ALPHA, GRID_COLOR, GRID_SIZE, PREVIEW_ALPHA, PREVIEW_DASH, RenderContext, Renderer, RendererError,
    RenderResult,
};
pub use surface::{Paint, Surface};
