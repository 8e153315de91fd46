//! The frame extraction worker.
//!
//! [`ExtractionWorker`] runs an [`ExtractionJob`] on its own OS thread and
//! reports back through an [`mpsc`] channel: one
//! [`ExtractionEvent::Progress`] per decoded frame, then exactly one
//! [`ExtractionEvent::Finished`]. The caller's thread never blocks on the
//! job; it drains the channel on its own schedule and may call
//! [`request_stop`](ExtractionWorker::request_stop) at any time.
//!
//! # Example
//!
//! ```no_run
//! use framesnap::{ExtractionEvent, ExtractionJob, ExtractionWorker};
//!
//! let mut worker = ExtractionWorker::new();
//! let events = worker.start(ExtractionJob::new("input.mp4", "frames", 10)?)?;
//!
//! for event in events {
//!     match event {
//!         ExtractionEvent::Progress(update) => println!("{}% [{}]", update.percent, update.label),
//!         ExtractionEvent::Finished(result) => println!("{result}"),
//!     }
//! }
//! # Ok::<(), framesnap::FrameError>(())
//! ```

use std::{
    any::Any,
    fs,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver},
    },
    thread::{self, JoinHandle},
};

use crate::{
    configuration::ExtractOptions,
    error::FrameError,
    job::ExtractionJob,
    progress::{CompletionReason, ExtractionEvent, ProgressUpdate, StopHandle, TerminalResult},
};

/// Name given to worker threads.
const WORKER_THREAD_NAME: &str = "frame-extractor";

/// Per-worker job counters, readable from the caller's thread.
///
/// Only the job's own thread writes them while `active` is set. Decoded and
/// saved counts live behind one lock so a reader never pairs a fresh value
/// of one with a stale value of the other.
#[derive(Debug, Default)]
pub(crate) struct JobCounters {
    active: AtomicBool,
    counts: Mutex<(u64, u64)>,
}

impl JobCounters {
    pub(crate) fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// `(decoded, saved)` as last recorded by the job.
    fn snapshot(&self) -> (u64, u64) {
        *self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, decoded: u64, saved: u64) {
        *self.counts.lock().unwrap_or_else(PoisonError::into_inner) = (decoded, saved);
    }

    pub(crate) fn reset(&self) {
        self.record(0, 0);
        self.active.store(false, Ordering::Release);
    }
}

/// Clears the job's counters and running flag when dropped, including
/// while unwinding.
struct Teardown<'a> {
    counters: &'a JobCounters,
    stop: &'a StopHandle,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.counters.reset();
        self.stop.request_stop();
    }
}

/// Runs frame extraction jobs on a background thread, one at a time.
///
/// A worker can be reused once the previous job's
/// [`ExtractionEvent::Finished`] has been observed. Dropping the worker
/// requests a stop; the thread still releases its decoder and exits on its
/// own.
pub struct ExtractionWorker {
    options: ExtractOptions,
    stop: StopHandle,
    counters: Arc<JobCounters>,
    handle: Option<JoinHandle<()>>,
}

impl Default for ExtractionWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionWorker {
    /// Create a worker that decodes with FFmpeg and writes JPEG files.
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::new())
    }

    /// Create a worker with custom collaborators.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            options,
            stop: StopHandle::new(),
            counters: Arc::new(JobCounters::default()),
            handle: None,
        }
    }

    /// Start `job` on a new thread and return its event channel.
    ///
    /// Every job outcome, including failure to open the video, arrives on
    /// the returned channel as the final [`ExtractionEvent::Finished`].
    ///
    /// # Errors
    ///
    /// - [`FrameError::WorkerBusy`] if the previous job has not finished.
    /// - [`FrameError::IoError`] if the thread cannot be spawned.
    pub fn start(&mut self, job: ExtractionJob) -> Result<Receiver<ExtractionEvent>, FrameError> {
        if self.counters.is_active() {
            return Err(FrameError::WorkerBusy);
        }
        // The previous thread has already sent its terminal event.
        self.wait();

        // Handles cloned for an earlier job must not reach this one.
        self.stop = StopHandle::new();
        self.counters.activate();
        self.stop.arm();

        let (sender, receiver) = mpsc::channel();
        let options = self.options.clone();
        let stop = self.stop.clone();
        let counters = Arc::clone(&self.counters);

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                run_job(&job, &options, &stop, &counters, &mut |event| {
                    sender.send(event).is_ok()
                });
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(receiver)
            }
            Err(error) => {
                self.counters.reset();
                self.stop.request_stop();
                Err(error.into())
            }
        }
    }

    /// Ask the running job to stop after its current frame.
    ///
    /// Safe to call at any time; a no-op when no job is running.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// A cloneable handle for stopping the current job from other threads.
    ///
    /// Each [`start`](ExtractionWorker::start) issues a new handle, so a
    /// handle only ever stops the job that was current when it was taken.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether a job is running and has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.stop.is_running()
    }

    /// Frames decoded so far by the current job, 0 when idle.
    pub fn decoded_count(&self) -> u64 {
        self.counters.snapshot().0
    }

    /// Frames written so far by the current job, 0 when idle.
    pub fn saved_count(&self) -> u64 {
        self.counters.snapshot().1
    }

    /// `(decoded, saved)` read together, so `saved <= decoded` always holds.
    pub fn counts(&self) -> (u64, u64) {
        self.counters.snapshot()
    }

    /// Block until the worker thread has exited.
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Frame extraction thread panicked");
            }
        }
    }
}

impl Drop for ExtractionWorker {
    fn drop(&mut self) {
        self.stop.request_stop();
    }
}

/// Run `job` to completion on the current thread.
///
/// `emit` receives every event and returns `false` once nobody is
/// listening, which is treated as a stop request. Teardown order is fixed:
/// the decoder is dropped, then counters and the running flag are reset,
/// then the terminal event is emitted. A panic in a collaborator is caught
/// and reported as a failed job.
pub(crate) fn run_job(
    job: &ExtractionJob,
    options: &ExtractOptions,
    stop: &StopHandle,
    counters: &JobCounters,
    emit: &mut dyn FnMut(ExtractionEvent) -> bool,
) {
    let teardown = Teardown { counters, stop };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        extract_frames(job, options, stop, counters, &mut *emit)
    }));
    let result = outcome.unwrap_or_else(|payload| {
        let error = format!(
            "Frame extraction panicked: {}",
            panic_message(payload.as_ref())
        );
        log::error!("{error}");
        TerminalResult::failed(error)
    });

    drop(teardown);

    log::debug!("Extraction of {} finished: {result}", job.source_path().display());
    emit(ExtractionEvent::Finished(result));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn extract_frames(
    job: &ExtractionJob,
    options: &ExtractOptions,
    stop: &StopHandle,
    counters: &JobCounters,
    emit: &mut dyn FnMut(ExtractionEvent) -> bool,
) -> TerminalResult {
    let mut decoder = match options.opener.open(job.source_path()) {
        Ok(decoder) => decoder,
        Err(error) => {
            log::warn!("{error}");
            return TerminalResult::failed(format!("Unable to open video file: {error}"));
        }
    };

    let total_frames = match decoder.total_frames() {
        Some(total) if total > 0 => total,
        _ => {
            let error = FrameError::FrameCountUnavailable(job.source_path().to_path_buf());
            log::warn!("{error}");
            return TerminalResult::failed(error.to_string());
        }
    };

    let output_dir = job.output_dir();
    if let Err(error) = fs::create_dir_all(&output_dir) {
        let error = FrameError::OutputDirectory {
            path: output_dir,
            source: error,
        };
        log::warn!("{error}");
        return TerminalResult::failed(error.to_string());
    }
    log::info!("Saving frames to {}", output_dir.display());

    let expected_saves = job.expected_saves(total_frames);
    let extension = options.writer.extension().to_string();
    let mut decoded_count = 0_u64;
    let mut saved_count = 0_u64;

    let reason = loop {
        if !stop.is_running() {
            break CompletionReason::Cancelled;
        }

        let frame = match decoder.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break CompletionReason::Exhausted,
            Err(error) => {
                log::warn!("Stopping after {decoded_count} frames: {error}");
                break CompletionReason::Interrupted(error.to_string());
            }
        };

        if job.should_save(decoded_count) {
            let frame_path = job.frame_path(saved_count, &extension);
            if let Err(error) = options.writer.write(&frame, &frame_path) {
                log::warn!("Failed to write {}: {error}", frame_path.display());
                break CompletionReason::Interrupted(error.to_string());
            }
            saved_count += 1;
        }

        let update =
            ProgressUpdate::compute(decoded_count, total_frames, saved_count, expected_saves);
        if !emit(ExtractionEvent::Progress(update)) {
            log::debug!("Event receiver dropped, stopping extraction");
            stop.request_stop();
        }

        decoded_count += 1;
        counters.record(decoded_count, saved_count);
    };

    drop(decoder);

    if reason == CompletionReason::Cancelled {
        log::info!("Extraction cancelled after {decoded_count} frames");
    }

    TerminalResult::completed(saved_count, &output_dir, reason)
}
