//! Events emitted by the extraction worker, and its stop signal.
//!
//! A job produces one [`ProgressUpdate`] per decoded frame followed by
//! exactly one [`TerminalResult`], both wrapped in [`ExtractionEvent`].
//! [`StopHandle`] is the only piece of worker state a caller may touch
//! while a job is running.
//!
//! # Example
//!
//! ```
//! use framesnap::ProgressUpdate;
//!
//! // 37th decoded frame of 100, 4 frames saved, 10 expected.
//! let update = ProgressUpdate::compute(37, 100, 4, 10);
//! assert_eq!(update.percent, 37);
//! assert_eq!(update.label, "5/10");
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// A per-frame progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Completion percentage, truncated toward zero.
    pub percent: u8,
    /// `"<next save index>/<expected saves>"`.
    pub label: String,
}

impl ProgressUpdate {
    /// Build the update emitted after frame `decoded_count` (0-indexed).
    ///
    /// `percent = floor(decoded_count * 100 / total_frames)`. Because the
    /// index is 0-based, a stream whose length matches `total_frames` tops
    /// out at 99. Frame counts reported by some containers are estimates, so
    /// the value is clamped to 100 if the stream runs long.
    pub fn compute(
        decoded_count: u64,
        total_frames: u64,
        saved_count: u64,
        expected_saves: u64,
    ) -> Self {
        let percent = if total_frames == 0 {
            0
        } else {
            (u128::from(decoded_count) * 100 / u128::from(total_frames)).min(100) as u8
        };

        Self {
            percent,
            label: format!("{}/{}", saved_count + 1, expected_saves),
        }
    }
}

/// Why a job stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletionReason {
    /// The decoder reached the end of the stream.
    Exhausted,
    /// A stop was requested before the stream ended.
    Cancelled,
    /// A mid-stream decode or write error ended the loop early.
    Interrupted(String),
    /// The job could not start extracting (open, frame count, or output
    /// directory failure).
    Failed,
}

/// The single, final notification closing out a job.
///
/// `success` is `true` for every job that reached the frame loop, including
/// cancelled and interrupted ones; inspect [`reason`](TerminalResult::reason)
/// to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalResult {
    /// Whether the job reached the frame loop.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Directory the frames were written to, empty on failure.
    pub output_path: String,
    /// Number of frames written.
    pub saved_count: u64,
    /// Why the job stopped.
    pub reason: CompletionReason,
}

impl TerminalResult {
    /// A job that ran its frame loop to an end.
    pub fn completed(saved_count: u64, output_dir: &Path, reason: CompletionReason) -> Self {
        Self {
            success: true,
            message: format!("Frame extraction finished: {saved_count} images saved"),
            output_path: output_dir.display().to_string(),
            saved_count,
            reason,
        }
    }

    /// A job that failed before extracting anything.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output_path: String::new(),
            saved_count: 0,
            reason: CompletionReason::Failed,
        }
    }
}

impl Display for TerminalResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.success {
            write!(f, "{} ({})", self.message, self.output_path)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Everything a job reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// One per decoded frame, in decode order.
    Progress(ProgressUpdate),
    /// Always the last event of a job.
    Finished(TerminalResult),
}

impl ExtractionEvent {
    /// Returns `true` for [`ExtractionEvent::Finished`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExtractionEvent::Finished(_))
    }
}

/// Cooperative stop signal backed by an [`AtomicBool`] "running" flag.
///
/// Clone it freely and call [`request_stop`](StopHandle::request_stop) from
/// any thread. The worker polls the flag once per decoded frame, so a stop
/// takes effect after the in-flight frame has been read, written, and
/// reported.
///
/// # Example
///
/// ```
/// use framesnap::StopHandle;
///
/// let handle = StopHandle::new();
/// assert!(!handle.is_running());
///
/// handle.request_stop(); // no-op while idle
/// assert!(!handle.is_running());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Create an idle handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running job to stop. Idempotent.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Whether a job is currently running and has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Raise the flag at job start.
    pub(crate) fn arm(&self) {
        self.running.store(true, Ordering::Release);
    }
}
