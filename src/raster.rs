/// Raster codec boundary
///
/// The steganography core only sees [`Carrier`] buffers. Turning them into image
/// files (and back) goes through a [`RasterCodec`], by default the `image` crate.

use crate::error::{Result, StegoError};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// An RGBA pixel buffer, 4 bytes per pixel in row-major order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Carrier {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Carrier {
    /// All-zero carrier of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(StegoError::BufferSize { expected, found: pixels.len() });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}

/// Encode/decode between [`Carrier`] buffers and image file bytes
pub trait RasterCodec {
    /// File extension (without dot) this codec writes
    fn extension(&self) -> &str;

    fn encode(&self, carrier: &Carrier) -> Result<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> Result<Carrier>;
}

/// Lossless formats only: any lossy step would destroy the payload
pub fn lossless_format(ext: &str) -> Result<ImageFormat> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Ok(ImageFormat::Png),
        "bmp" => Ok(ImageFormat::Bmp),
        "tif" | "tiff" => Ok(ImageFormat::Tiff),
        "jpg" | "jpeg" | "webp" | "avif" => Err(StegoError::UnsupportedFormat(format!(
            "'.{ext}' is lossy and would destroy the hidden data; use png, bmp or tiff"
        ))),
        other => Err(StegoError::UnsupportedFormat(format!("'.{other}' is not a supported carrier format"))),
    }
}

/// [`RasterCodec`] backed by the `image` crate
#[derive(Clone, Debug)]
pub struct ImageCodec {
    format: ImageFormat,
    extension: String,
}

impl ImageCodec {
    pub fn new(extension: &str) -> Result<Self> {
        let format = lossless_format(extension)?;
        Ok(Self {
            format,
            extension: extension.to_ascii_lowercase(),
        })
    }

    /// Codec chosen from a file's extension
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| StegoError::UnsupportedFormat(format!("{} has no extension", path.display())))?;
        Self::new(ext)
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            extension: "png".to_string(),
        }
    }
}

impl RasterCodec for ImageCodec {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn encode(&self, carrier: &Carrier) -> Result<Vec<u8>> {
        let img = RgbaImage::from_raw(carrier.width(), carrier.height(), carrier.bytes().to_vec())
            .ok_or(StegoError::BufferSize {
                expected: carrier.width() as usize * carrier.height() as usize * 4,
                found: carrier.bytes().len(),
            })?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, self.format)?;
        Ok(out.into_inner())
    }

    fn decode(&self, data: &[u8]) -> Result<Carrier> {
        let img = image::load_from_memory_with_format(data, self.format)?.to_rgba8();
        let (width, height) = img.dimensions();
        Carrier::from_raw(width, height, img.into_raw())
    }
}
