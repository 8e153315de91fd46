//! Persisting selected frames as image files.
//!
//! [`FrameWriter`] is the seam the worker writes through; [`JpegWriter`] is
//! the default and only built-in implementation.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::error::FrameError;

/// Default JPEG quality, matching what common video tooling writes.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encodes one decoded frame and writes it to disk.
pub trait FrameWriter: Send + Sync {
    /// File extension (without the dot) for files this writer produces.
    fn extension(&self) -> &str;

    /// Write `image` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IoError`] or [`FrameError::ImageError`] if the
    /// file cannot be created or the frame cannot be encoded.
    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), FrameError>;
}

/// Writes frames as baseline RGB JPEG files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegWriter {
    quality: u8,
}

impl JpegWriter {
    /// Create a writer with `quality` clamped to `1..=100`.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Encoder quality in `1..=100`.
    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegWriter {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameWriter for JpegWriter {
    fn extension(&self) -> &str {
        "jpg"
    }

    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), FrameError> {
        let mut output = BufWriter::new(File::create(path)?);
        // JPEG has no alpha channel.
        JpegEncoder::new_with_quality(&mut output, self.quality).encode_image(&image.to_rgb8())?;
        output.flush()?;
        Ok(())
    }
}
