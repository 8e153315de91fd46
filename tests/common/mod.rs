//! Shared helpers for integration tests.
//!
//! [`SyntheticVideo`] is an in-memory [`VideoOpener`] producing flat grey
//! frames whose brightness encodes the frame index, so tests can drive the
//! worker deterministically without FFmpeg fixtures.

#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    time::Duration,
};

use framesnap::{
    ExtractionEvent, FrameError, FrameWriter, JpegWriter, ProgressUpdate, TerminalResult,
    VideoDecoder, VideoOpener,
};
use image::{DynamicImage, Rgb, RgbImage};

const FRAME_SIZE: u32 = 8;
const EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Grey level used for frame `index`.
pub fn frame_shade(index: u64) -> u8 {
    (index * 2).min(255) as u8
}

struct Gate {
    run: usize,
    at: u64,
    reached: Sender<()>,
    resume: Receiver<()>,
}

/// Test side of a decoder that pauses on one frame.
pub struct PauseControl {
    reached: Receiver<()>,
    resume: Sender<()>,
}

impl PauseControl {
    /// Block until the decoder is holding the paused frame.
    pub fn wait_until_reached(&self) {
        self.reached
            .recv_timeout(EVENT_TIMEOUT)
            .expect("Decoder never reached the pause point");
    }

    /// Let the decoder return the paused frame.
    pub fn resume(&self) {
        // The decoder may already be gone if the job was torn down.
        let _ = self.resume.send(());
    }
}

/// In-memory video source.
pub struct SyntheticVideo {
    frames: u64,
    reported_total: Option<u64>,
    openable: bool,
    fail_at: Option<u64>,
    gate: Mutex<Option<Gate>>,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl SyntheticVideo {
    /// A video of `frames` frames that reports its length correctly.
    pub fn new(frames: u64) -> Self {
        Self {
            frames,
            reported_total: Some(frames),
            openable: true,
            fail_at: None,
            gate: Mutex::new(None),
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report `total` instead of the real frame count.
    pub fn reporting_total(mut self, total: Option<u64>) -> Self {
        self.reported_total = total;
        self
    }

    /// Refuse to open.
    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }

    /// Fail with a decode error when frame `index` is requested.
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Block inside `next_frame` for frame `index` until resumed.
    pub fn pausing_at(self, index: u64) -> (Self, PauseControl) {
        self.pausing_at_run(0, index)
    }

    /// Like [`pausing_at`](Self::pausing_at), but only for the decoder
    /// returned by the `run`-th successful open (0-based).
    pub fn pausing_at_run(self, run: usize, index: u64) -> (Self, PauseControl) {
        let (reached_sender, reached_receiver) = mpsc::channel();
        let (resume_sender, resume_receiver) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(Gate {
            run,
            at: index,
            reached: reached_sender,
            resume: resume_receiver,
        });
        let control = PauseControl {
            reached: reached_receiver,
            resume: resume_sender,
        };
        (self, control)
    }

    /// How many decoders have been opened.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// How many decoders have been dropped.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl VideoOpener for SyntheticVideo {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoDecoder>, FrameError> {
        if !self.openable {
            return Err(FrameError::FileOpen {
                path: path.to_path_buf(),
                reason: "Invalid data found when processing input".to_string(),
            });
        }
        let run = self.opened.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.gate.lock().unwrap();
        let gate = if pending.as_ref().is_some_and(|gate| gate.run == run) {
            pending.take()
        } else {
            None
        };
        drop(pending);
        Ok(Box::new(SyntheticDecoder {
            frames: self.frames,
            reported_total: self.reported_total,
            fail_at: self.fail_at,
            gate,
            next: 0,
            released: Arc::clone(&self.released),
        }))
    }
}

struct SyntheticDecoder {
    frames: u64,
    reported_total: Option<u64>,
    fail_at: Option<u64>,
    gate: Option<Gate>,
    next: u64,
    released: Arc<AtomicUsize>,
}

impl VideoDecoder for SyntheticDecoder {
    fn total_frames(&self) -> Option<u64> {
        self.reported_total
    }

    fn next_frame(&mut self) -> Result<Option<DynamicImage>, FrameError> {
        if self.next >= self.frames {
            return Ok(None);
        }
        if self.fail_at == Some(self.next) {
            return Err(FrameError::VideoDecodeError(format!(
                "corrupt packet at frame {}",
                self.next
            )));
        }
        if self.gate.as_ref().is_some_and(|gate| gate.at == self.next) {
            if let Some(gate) = self.gate.take() {
                let _ = gate.reached.send(());
                let _ = gate.resume.recv();
            }
        }

        let shade = frame_shade(self.next);
        self.next += 1;
        Ok(Some(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            FRAME_SIZE,
            FRAME_SIZE,
            Rgb([shade, shade, shade]),
        ))))
    }
}

impl Drop for SyntheticDecoder {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Writer that records target paths and fails from the Nth write on.
pub struct FlakyWriter {
    fail_from: usize,
    written: Mutex<Vec<PathBuf>>,
}

impl FlakyWriter {
    pub fn failing_from(fail_from: usize) -> Self {
        Self {
            fail_from,
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().unwrap().clone()
    }
}

impl FrameWriter for FlakyWriter {
    fn extension(&self) -> &str {
        "jpg"
    }

    fn write(&self, _image: &DynamicImage, path: &Path) -> Result<(), FrameError> {
        let mut written = self.written.lock().unwrap();
        if written.len() >= self.fail_from {
            return Err(FrameError::IoError(std::io::Error::other("disk full")));
        }
        written.push(path.to_path_buf());
        Ok(())
    }
}

/// Writer that panics on its first call and writes JPEGs afterwards.
pub struct PanicOnceWriter {
    tripped: AtomicBool,
    inner: JpegWriter,
}

impl PanicOnceWriter {
    pub fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
            inner: JpegWriter::default(),
        }
    }
}

impl FrameWriter for PanicOnceWriter {
    fn extension(&self) -> &str {
        self.inner.extension()
    }

    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), FrameError> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            panic!("encoder exploded");
        }
        self.inner.write(image, path)
    }
}

/// Drain a job's events, asserting the terminal event comes last and once.
pub fn collect_events(events: Receiver<ExtractionEvent>) -> (Vec<ProgressUpdate>, TerminalResult) {
    let mut updates = Vec::new();
    loop {
        match events
            .recv_timeout(EVENT_TIMEOUT)
            .expect("Worker stopped sending events before finishing")
        {
            ExtractionEvent::Progress(update) => updates.push(update),
            ExtractionEvent::Finished(result) => {
                assert!(
                    events.recv_timeout(Duration::from_millis(200)).is_err(),
                    "No events may follow the terminal result",
                );
                return (updates, result);
            }
        }
    }
}

/// Sorted file names in `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .expect("Failed to list output directory")
        .map(|entry| {
            entry
                .expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
