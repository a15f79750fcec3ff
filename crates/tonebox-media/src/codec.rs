//! Data-URL codec: `data:image/<fmt>;base64,<payload>` to and from
//! [`FrameBuffer`].

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tonebox_core::pipeline::FrameBuffer;
use tracing::trace;

use crate::error::{MediaError, Result};

/// Output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless, keeps alpha.
    Png,
    /// Lossy; alpha is dropped before encoding.
    Jpeg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    fn codec(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            other => Err(MediaError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Decode a base64 data URL into an RGBA frame. The header is only used to
/// locate the payload; the image format is sniffed from the bytes.
pub fn decode_data_url(data_url: &str) -> Result<FrameBuffer> {
    let (_, payload) = data_url
        .split_once(',')
        .ok_or_else(|| MediaError::InvalidDataUrl("missing ',' separator".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidDataUrl(e.to_string()))?;
    let image = image::load_from_memory(&bytes).map_err(|e| MediaError::Decode(e.to_string()))?;
    let frame = frame_from_image(image);
    trace!(width = frame.width, height = frame.height, "decoded data URL");
    Ok(frame)
}

/// Encode `frame` as a data URL in `format`.
pub fn encode_data_url(frame: &FrameBuffer, format: ImageFormat) -> Result<String> {
    let bytes = encode(frame, format)?;
    trace!(%format, bytes = bytes.len(), "encoded data URL");
    Ok(format!(
        "data:image/{};base64,{}",
        format.as_str(),
        STANDARD.encode(bytes)
    ))
}

/// Encode `frame` to raw file bytes in `format`.
pub fn encode(frame: &FrameBuffer, format: ImageFormat) -> Result<Vec<u8>> {
    let rgba = frame_to_image(frame)?;
    let image = match format {
        ImageFormat::Png => DynamicImage::ImageRgba8(rgba),
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
    };
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, format.codec())
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

pub fn frame_from_image(image: DynamicImage) -> FrameBuffer {
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    FrameBuffer::from_rgba_vec(width, height, rgba.into_raw())
}

pub fn frame_to_image(frame: &FrameBuffer) -> Result<RgbaImage> {
    if frame.width == 0 || frame.height == 0 {
        return Err(MediaError::Encode(format!(
            "cannot encode a {}x{} image",
            frame.width, frame.height
        )));
    }
    RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| MediaError::Encode("pixel data does not match dimensions".into()))
}
