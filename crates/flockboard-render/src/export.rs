//! PNG export of the current surface.

use crate::renderer::RenderResult;
use crate::surface::Surface;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn write_png<W: Write, S: Surface + ?Sized>(writer: W, surface: &S) -> RenderResult<()> {
    let (width, height) = surface.size();
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&surface.read_pixels())?;
    writer.finish()?;
    Ok(())
}

/// Encode the surface as PNG bytes.
pub fn encode_png<S: Surface + ?Sized>(surface: &S) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_png(&mut bytes, surface)?;
    Ok(bytes)
}

/// Write the surface to a PNG file at `path`.
pub fn export_png<S: Surface + ?Sized>(surface: &S, path: &Path) -> RenderResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_png(&mut writer, surface)?;
    writer.flush()?;
    let (width, height) = surface.size();
    log::info!("Exported {}x{} PNG to {}", width, height, path.display());
    Ok(())
}
