//! Sequential video decoding.
//!
//! The worker only needs two things from a video: a total frame count and a
//! way to pull decoded frames one after another. [`VideoOpener`] and
//! [`VideoDecoder`] describe exactly that, and [`FfmpegOpener`] provides the
//! FFmpeg-backed implementation used by default.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framesnap::{FfmpegOpener, VideoOpener};
//!
//! let mut decoder = FfmpegOpener.open(Path::new("input.mp4"))?;
//! println!("{:?} frames", decoder.total_frames());
//! while let Some(frame) = decoder.next_frame()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), framesnap::FrameError>(())
//! ```

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational, Stream,
    codec::context::Context as CodecContext,
    decoder::Video as FfmpegVideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::FrameError;

/// Consecutive non-EOF packet read failures tolerated before giving up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 32;

/// Opens a video file for sequential decoding.
///
/// Implementations are shared with the worker thread, hence `Send + Sync`.
/// The decoder they return lives and dies on that thread.
pub trait VideoOpener: Send + Sync {
    /// Open `path`.
    ///
    /// # Errors
    ///
    /// Any error means the file cannot be used as a video source.
    fn open(&self, path: &Path) -> Result<Box<dyn VideoDecoder>, FrameError>;
}

/// An open decoder handle yielding frames in stream order.
///
/// Dropping the handle releases every resource it holds.
pub trait VideoDecoder {
    /// Total number of frames in the stream, if the decoder can tell.
    fn total_frames(&self) -> Option<u64>;

    /// Decode the next frame, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>, FrameError>;
}

/// [`VideoOpener`] backed by FFmpeg through `ffmpeg-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl VideoOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoDecoder>, FrameError> {
        Ok(Box::new(FfmpegDecoder::open(path)?))
    }
}

/// Decodes the best video stream of a container into RGB8 images.
pub struct FfmpegDecoder {
    input_context: Input,
    decoder: FfmpegVideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    total_frames: Option<u64>,
    width: u32,
    height: u32,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    file_path: PathBuf,
}

impl FfmpegDecoder {
    /// Open `path` and prepare its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// - [`FrameError::FileOpen`] if FFmpeg cannot open the container or
    ///   build a decoder for the stream.
    /// - [`FrameError::NoVideoStream`] if the container has no video.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let file_path = path.to_path_buf();
        let open_error = |reason: String| FrameError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| FrameError::NoVideoStream(file_path.clone()))?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("Failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let total_frames = count_frames(&input_context, &stream);

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_error(format!("Failed to create pixel converter: {error}")))?;

        log::debug!(
            "Video stream {video_stream_index}: {width}x{height}, {total_frames:?} frames"
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            total_frames,
            width,
            height,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            file_path,
        })
    }

    fn convert_current_frame(&mut self) -> Result<DynamicImage, FrameError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = crate::utilities::frame_to_rgb_buffer(&self.rgb_frame, self.width, self.height);
        let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            FrameError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    fn next_frame(&mut self) -> Result<Option<DynamicImage>, FrameError> {
        let mut read_errors = 0;

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            FrameError::VideoDecodeError(error.to_string())
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(FrameError::VideoDecodeError(format!(
                            "Repeated read failures in {}: {error}",
                            self.file_path.display()
                        )));
                    }
                }
            }
        }
    }
}

/// Frame count from the stream header, or estimated from duration × rate.
fn count_frames(input_context: &Input, stream: &Stream) -> Option<u64> {
    let recorded = stream.frames();
    if recorded > 0 {
        return Some(recorded as u64);
    }

    let frames_per_second = crate::utilities::rational_to_f64(stream.avg_frame_rate())
        .or_else(|| crate::utilities::rational_to_f64(stream.rate()))?;

    let duration = crate::utilities::stream_duration(stream.duration(), stream.time_base())
        .or_else(|| {
            // Container duration is always in microseconds.
            crate::utilities::stream_duration(input_context.duration(), Rational::new(1, 1_000_000))
        })?;

    let estimate = crate::utilities::estimate_frame_count(duration, frames_per_second);
    (estimate > 0).then_some(estimate)
}
