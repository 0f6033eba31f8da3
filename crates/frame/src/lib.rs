//! Host-side frames for the segmentation pipeline.
//!
//! Decodes encoded images into [`Frame`] tensors (HWC layout) and encodes
//! the pipeline's float RGBA output buffers back into PNG.

pub mod error;
pub mod frame;

pub use error::FrameError;
pub use frame::Frame;

use base::Tensor;
use crates_image::{DynamicImage, ImageEncoder};

fn to_tensor<T>(
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<T>,
) -> Result<Tensor<T>, FrameError> {
    let shape = vec![height as usize, width as usize, channels];
    Ok(Tensor::new(shape, data)?)
}

/// Decode without going through the tokio blocking pool.
pub fn decode_frame_blocking(data: &[u8]) -> Result<Frame, FrameError> {
    let img = crates_image::load_from_memory(data).map_err(FrameError::Decode)?;

    match img {
        DynamicImage::ImageRgb8(buf) => {
            let (w, h) = buf.dimensions();
            Ok(Frame::U8(to_tensor(w, h, 3, buf.into_raw())?))
        }
        DynamicImage::ImageRgba8(buf) => {
            let (w, h) = buf.dimensions();
            Ok(Frame::U8(to_tensor(w, h, 4, buf.into_raw())?))
        }
        DynamicImage::ImageRgb16(buf) => {
            let (w, h) = buf.dimensions();
            Ok(Frame::U16(to_tensor(w, h, 3, buf.into_raw())?))
        }
        DynamicImage::ImageRgba16(buf) => {
            let (w, h) = buf.dimensions();
            Ok(Frame::U16(to_tensor(w, h, 4, buf.into_raw())?))
        }
        DynamicImage::ImageRgb32F(buf) => {
            let (w, h) = buf.dimensions();
            Ok(Frame::F32(to_tensor(w, h, 3, buf.into_raw())?))
        }
        DynamicImage::ImageRgba32F(buf) => {
            let (w, h) = buf.dimensions();
            Ok(Frame::F32(to_tensor(w, h, 4, buf.into_raw())?))
        }
        // grayscale and exotic layouts are widened, the pipeline only takes 3 or 4 channels
        _ => {
            let rgb = img.to_rgb8();
            let (w, h) = rgb.dimensions();
            Ok(Frame::U8(to_tensor(w, h, 3, rgb.into_raw())?))
        }
    }
}

fn encode_png_inner(rgba: &[f32], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() < expected {
        return Err(FrameError::ShortBuffer {
            width,
            height,
            needed: expected,
            got: rgba.len(),
        });
    }

    let bytes: Vec<u8> = rgba[..expected]
        .iter()
        .map(|&v| v.clamp(0.0, 255.0).round() as u8)
        .collect();

    let mut buffer = Vec::new();
    let encoder = crates_image::codecs::png::PngEncoder::new(&mut buffer);
    encoder
        .write_image(&bytes, width, height, crates_image::ExtendedColorType::Rgba8)
        .map_err(FrameError::Encode)?;

    Ok(buffer)
}

/// Decodes an image from raw bytes into a [`Frame`].
///
/// The format is auto-detected. 8-bit, 16-bit and float RGB/RGBA keep their
/// precision; anything else is converted to 8-bit RGB.
///
/// The CPU-bound decoding work runs on tokio's blocking thread pool.
pub async fn decode_frame(data: &[u8]) -> Result<Frame, FrameError> {
    let owned = data.to_vec();
    tokio::task::spawn_blocking(move || decode_frame_blocking(&owned))
        .await
        .map_err(|e| FrameError::Worker(e.to_string()))?
}

/// Encodes an interleaved float RGBA buffer (0..255 per sample) as PNG.
///
/// Only the first `width * height * 4` floats are used.
pub async fn encode_png(rgba: Vec<f32>, width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    tokio::task::spawn_blocking(move || encode_png_inner(&rgba, width, height))
        .await
        .map_err(|e| FrameError::Worker(e.to_string()))?
}
