use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tonebox_core::config::EngineConfig;
use tonebox_core::pipeline::FrameBuffer;

/// A frame filled with one colour.
pub fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> FrameBuffer {
    FrameBuffer::from_rgba_vec(width, height, rgba.repeat((width * height) as usize))
}

/// A frame with a distinct, saturated colour at every pixel. Red ramps along
/// x, green along y, and blue varies with both, so colour transforms and
/// crops produce visibly different output.
pub fn gradient_frame(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    let wx = width.saturating_sub(1).max(1);
    let hy = height.saturating_sub(1).max(1);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / wx) as u8;
            let g = (y * 255 / hy) as u8;
            let b = ((x + y) * 40 % 256) as u8;
            frame.pixel_mut(x, y).copy_from_slice(&[r, g, b, 255]);
        }
    }
    frame
}

/// PNG-encode `frame` as a `data:image/png;base64,` URL.
pub fn png_data_url(frame: &FrameBuffer) -> String {
    let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .expect("frame data must match its dimensions");
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("PNG encoding of a test frame");
    format!("data:image/png;base64,{}", STANDARD.encode(bytes.into_inner()))
}

/// Write `config` as JSON into `dir` and return its path.
pub fn write_config(dir: &Path, config: &EngineConfig) -> PathBuf {
    let path = dir.join("tonebox.json");
    let json = serde_json::to_string_pretty(config).expect("config serializes");
    std::fs::write(&path, json).expect("write config fixture");
    path
}

/// Get a temporary directory for test fixtures that persists for the test run.
pub fn fixture_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir for fixtures")
}
