//! Error types for the `framesnap` crate.
//!
//! [`FrameError`] is returned by every fallible library operation. The
//! extraction worker never hands these to its caller directly: fatal job
//! errors are rendered into a failed
//! [`TerminalResult`](crate::TerminalResult) instead.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `framesnap` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The input could not be opened as a decodable video.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the opener.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container opened but holds no video stream.
    #[error("No video stream found in {0}")]
    NoVideoStream(PathBuf),

    /// The decoder could not report a positive frame count.
    #[error("Could not determine the frame count of {0}")]
    FrameCountUnavailable(PathBuf),

    /// The per-video output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: IoError,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A sample stride of zero was provided.
    #[error("Sample stride must be greater than zero")]
    InvalidStride,

    /// `start` was called while a job is still running on the worker.
    #[error("A frame extraction job is already running on this worker")]
    WorkerBusy,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A settings file could not be serialised or parsed.
    #[error("Settings error: {0}")]
    SettingsError(#[from] JsonError),
}

impl From<FfmpegError> for FrameError {
    fn from(error: FfmpegError) -> Self {
        FrameError::FfmpegError(error.to_string())
    }
}
