use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{PinpointError, PinpointResult};

/// The still image being presented, decoded to premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 pixels, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Wrap already-premultiplied pixels.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> PinpointResult<Self> {
        if width == 0 || height == 0 {
            return Err(PinpointError::validation("image dimensions must be non-zero"));
        }
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(PinpointError::validation(format!(
                "image byte length {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Solid-color image, handy for previews and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PinpointResult<Self> {
        let px = premultiply(rgba);
        let n = (width as usize).saturating_mul(height as usize);
        let mut data = Vec::with_capacity(n.saturating_mul(4));
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self::from_premul(width, height, data)
    }
}

/// Supplies the image currently being presented, if any.
pub trait ImageProvider {
    /// Image to present, or `None` when nothing is loaded.
    fn current_image(&self) -> Option<&SourceImage>;
}

impl ImageProvider for SourceImage {
    fn current_image(&self) -> Option<&SourceImage> {
        Some(self)
    }
}

impl ImageProvider for Option<SourceImage> {
    fn current_image(&self) -> Option<&SourceImage> {
        self.as_ref()
    }
}

/// Decode PNG/JPEG/... bytes into a premultiplied [`SourceImage`].
pub fn decode_image(bytes: &[u8]) -> PinpointResult<SourceImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    SourceImage::from_premul(width, height, rgba8_premul)
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> PinpointResult<SourceImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

pub(crate) fn premultiply(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { ((u16::from(c) * a16 + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let p = premultiply([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&p);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
