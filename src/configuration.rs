//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads the decoding and writing
//! collaborators through the worker without widening every signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use framesnap::{ExtractOptions, FfmpegOpener};
//!
//! let options = ExtractOptions::new()
//!     .with_opener(Arc::new(FfmpegOpener))
//!     .with_jpeg_quality(85);
//! assert_eq!(options.writer().extension(), "jpg");
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use crate::{
    decoder::{FfmpegOpener, VideoOpener},
    writer::{FrameWriter, JpegWriter},
};

/// Collaborators used by an extraction job.
///
/// A default-constructed value decodes with FFmpeg and writes JPEG files at
/// quality 95.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) opener: Arc<dyn VideoOpener>,
    pub(crate) writer: Arc<dyn FrameWriter>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("extension", &self.writer.extension())
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with the default FFmpeg opener and JPEG writer.
    pub fn new() -> Self {
        Self {
            opener: Arc::new(FfmpegOpener),
            writer: Arc::new(JpegWriter::default()),
        }
    }

    /// Use a different video opener.
    #[must_use]
    pub fn with_opener(mut self, opener: Arc<dyn VideoOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Use a different frame writer.
    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn FrameWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Write JPEG files at `quality` (clamped to `1..=100`).
    ///
    /// Replaces any writer set earlier.
    #[must_use]
    pub fn with_jpeg_quality(self, quality: u8) -> Self {
        self.with_writer(Arc::new(JpegWriter::new(quality)))
    }

    /// The configured video opener.
    pub fn opener(&self) -> &dyn VideoOpener {
        self.opener.as_ref()
    }

    /// The configured frame writer.
    pub fn writer(&self) -> &dyn FrameWriter {
        self.writer.as_ref()
    }
}
