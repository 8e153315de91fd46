//! The immutable parameters of one extraction run.
//!
//! An [`ExtractionJob`] names the source video, the root directory under
//! which a per-video folder is created, and the frame stride. It also owns
//! the naming rules for everything the job writes.

use std::path::{Path, PathBuf};

use crate::error::FrameError;

/// Fallback folder name for sources whose path has no file stem.
const FALLBACK_VIDEO_NAME: &str = "video";

/// Parameters for a single frame-extraction run.
///
/// # Example
///
/// ```
/// use std::path::Path;
///
/// use framesnap::ExtractionJob;
///
/// let job = ExtractionJob::new("clips/intro.mp4", "out", 10)?;
/// assert_eq!(job.video_name(), "intro");
/// assert_eq!(job.frame_path(3, "jpg"), Path::new("out/intro/0003.jpg"));
/// assert_eq!(job.expected_saves(95), 9);
/// # Ok::<(), framesnap::FrameError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    source_path: PathBuf,
    output_root: PathBuf,
    sample_stride: u64,
}

impl ExtractionJob {
    /// Create a job.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidStride`] if `sample_stride` is zero.
    pub fn new<S, O>(source_path: S, output_root: O, sample_stride: u64) -> Result<Self, FrameError>
    where
        S: AsRef<Path>,
        O: AsRef<Path>,
    {
        if sample_stride == 0 {
            return Err(FrameError::InvalidStride);
        }

        Ok(Self {
            source_path: source_path.as_ref().to_path_buf(),
            output_root: output_root.as_ref().to_path_buf(),
            sample_stride,
        })
    }

    /// Path of the input video.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Directory under which the per-video folder is created.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Only every Nth decoded frame (0-indexed) is persisted.
    pub fn sample_stride(&self) -> u64 {
        self.sample_stride
    }

    /// Base name of the source file without its extension.
    pub fn video_name(&self) -> String {
        self.source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| FALLBACK_VIDEO_NAME.to_string())
    }

    /// `output_root/<video_name>`.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(self.video_name())
    }

    /// Static estimate of how many frames the job will save.
    ///
    /// This is `floor(total_frames / sample_stride)` and is only used as the
    /// denominator of progress labels; the real count can be one higher.
    pub fn expected_saves(&self, total_frames: u64) -> u64 {
        total_frames / self.sample_stride
    }

    /// Whether the frame at `decoded_index` is persisted.
    pub fn should_save(&self, decoded_index: u64) -> bool {
        decoded_index % self.sample_stride == 0
    }

    /// Output file for the `index`-th saved frame, zero-padded to 4 digits.
    pub fn frame_path(&self, index: u64, extension: &str) -> PathBuf {
        self.output_dir().join(format!("{index:04}.{extension}"))
    }
}
