use std::{fmt, path::PathBuf};

use base64::Engine;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, GenericImageView};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::StoryError;

pub const MAX_WIDTH: u32 = 1080;
pub const MAX_HEIGHT: u32 = 1920;
pub const JPEG_QUALITY: u8 = 90;

const DATA_URL_PREFIX: &str = "data:image/";

/// An encoded, ready to display image as a `data:image/...` URL.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn parse<S>(s: S) -> Result<Self, StoryError>
    where
        S: Into<String>,
    {
        let s = s.into();
        if s.starts_with(DATA_URL_PREFIX) {
            Ok(ImagePayload(s))
        } else {
            Err(StoryError::NotAnImage)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Payloads are large, keep log lines short
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.0.split(',').next().unwrap_or_default();
        write!(f, "ImagePayload({}, {} bytes)", head, self.0.len())
    }
}

/// Scale `(width, height)` down to fit the bounds, keeping the aspect ratio.
/// Images that already fit are left alone.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);
    let (new_w, new_h) = if max_w * h <= max_h * w {
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };
    (new_w.max(1) as u32, new_h.max(1) as u32)
}

/// Decode raw file contents, shrink to the story bounds and re-encode as JPEG.
pub fn encode(bytes: &[u8]) -> Result<ImagePayload, StoryError> {
    let format = image::guess_format(bytes).map_err(|_| StoryError::NotAnImage)?;
    debug!("decoding {:?} image ({} bytes)", format, bytes.len());
    let img = image::load_from_memory_with_format(bytes, format)?;

    let (width, height) = img.dimensions();
    let (new_width, new_height) = fit_within(width, height, MAX_WIDTH, MAX_HEIGHT);
    let img = if (new_width, new_height) != (width, height) {
        debug!(
            "resizing image {}x{} -> {}x{}",
            width, height, new_width, new_height
        );
        img.resize_exact(new_width, new_height, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    Ok(ImagePayload(format!("data:image/jpeg;base64,{}", encoded)))
}

/// Read an image file and encode it off the async executor.
pub async fn produce(path: PathBuf) -> Result<ImagePayload, StoryError> {
    info!("file selected: {}", path.display());
    let bytes = tokio::fs::read(&path).await?;
    let payload = tokio::task::spawn_blocking(move || encode(&bytes)).await??;
    info!("image resized: {:?}", payload);
    Ok(payload)
}
