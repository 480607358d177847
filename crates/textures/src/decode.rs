use image::imageops::flip_vertical_in_place;

use crate::error::TextureError;

/// Tightly packed RGBA8 pixels, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedTexture {
    /// 1×1 opaque white, bound while a slot is pending or failed.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.width == 1 && self.height == 1 && self.pixels == [255; 4]
    }
}

/// Decodes any supported image format into RGBA8 and flips it vertically
/// so row zero is the bottom of the image.
pub fn decode_texture(bytes: &[u8]) -> Result<DecodedTexture, TextureError> {
    let image = image::load_from_memory(bytes)?;
    let mut rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty { width, height });
    }
    flip_vertical_in_place(&mut rgba);
    Ok(DecodedTexture {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}
