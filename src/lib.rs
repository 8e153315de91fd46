//! # framesnap
//!
//! Extract still frames from a video at a fixed frame stride, writing them
//! as sequentially numbered JPEG files while reporting progress and
//! honouring stop requests.
//!
//! Extraction runs on a background worker so the caller stays responsive.
//! The worker reports through a channel: one [`ProgressUpdate`] per decoded
//! frame, then a single [`TerminalResult`]. Decoding is powered by FFmpeg
//! via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate and
//! encoding by the [`image`](https://crates.io/crates/image) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesnap::{ExtractionEvent, ExtractionJob, ExtractionWorker};
//!
//! let mut worker = ExtractionWorker::new();
//! let job = ExtractionJob::new("holiday.mp4", "frames", 30)?;
//!
//! // Writes frames/holiday/0000.jpg, 0001.jpg, ...
//! for event in worker.start(job)? {
//!     if let ExtractionEvent::Finished(result) = event {
//!         println!("{result}");
//!     }
//! }
//! # Ok::<(), framesnap::FrameError>(())
//! ```
//!
//! ## Output layout
//!
//! `<output_root>/<video name without extension>/NNNN.jpg`, numbered from
//! `0000` with no gaps. Re-running a job overwrites files with the same
//! names.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `ExtractionStream`, a Tokio stream of extraction events |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod decoder;
pub mod error;
pub mod ffmpeg;
pub mod job;
pub mod progress;
pub mod settings;
#[cfg(feature = "async")]
pub mod stream;
mod utilities;
pub mod worker;
pub mod writer;

pub use configuration::ExtractOptions;
pub use decoder::{FfmpegDecoder, FfmpegOpener, VideoDecoder, VideoOpener};
pub use error::FrameError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use job::ExtractionJob;
pub use progress::{CompletionReason, ExtractionEvent, ProgressUpdate, StopHandle, TerminalResult};
pub use settings::ControllerSettings;
#[cfg(feature = "async")]
pub use stream::ExtractionStream;
pub use worker::ExtractionWorker;
pub use writer::{FrameWriter, JpegWriter};
