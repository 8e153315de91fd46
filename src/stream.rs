//! Async event stream for extraction jobs.
//!
//! [`ExtractionStream`] runs a job under `tokio::task::spawn_blocking` and
//! yields its [`ExtractionEvent`]s through a bounded channel, so decoding
//! never ties up the runtime's cooperative task budget.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use framesnap::{ExtractOptions, ExtractionEvent, ExtractionJob, ExtractionStream};
//!
//! # async fn example() -> Result<(), framesnap::FrameError> {
//! let job = ExtractionJob::new("input.mp4", "frames", 10)?;
//! let mut stream = ExtractionStream::spawn(job, ExtractOptions::new());
//!
//! while let Some(event) = stream.next().await {
//!     if let ExtractionEvent::Finished(result) = event {
//!         println!("{result}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::{sync::mpsc::Receiver, task::JoinHandle};
use tokio_stream::Stream;

use crate::{
    configuration::ExtractOptions,
    job::ExtractionJob,
    progress::{ExtractionEvent, StopHandle},
    worker::{JobCounters, run_job},
};

/// Bounded-channel capacity for [`ExtractionStream`].
///
/// Progress events are small, so this mostly bounds how far decoding can
/// run ahead of a slow consumer.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A stream of events from a job running on a blocking thread.
///
/// The stream ends after [`ExtractionEvent::Finished`]. Dropping it closes
/// the channel, which stops the job at the next frame boundary.
pub struct ExtractionStream {
    receiver: Receiver<ExtractionEvent>,
    stop: StopHandle,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl ExtractionStream {
    /// Spawn `job` on Tokio's blocking pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(job: ExtractionJob, options: ExtractOptions) -> Self {
        let (sender, receiver) = tokio::sync::mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let stop = StopHandle::new();
        let counters = Arc::new(JobCounters::default());

        counters.activate();
        stop.arm();

        let job_stop = stop.clone();
        let handle = tokio::task::spawn_blocking(move || {
            run_job(&job, &options, &job_stop, &counters, &mut |event| {
                sender.blocking_send(event).is_ok()
            });
        });

        Self {
            receiver,
            stop,
            handle,
        }
    }

    /// A cloneable handle for stopping the job.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Ask the job to stop after its current frame.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }
}

impl Stream for ExtractionStream {
    type Item = ExtractionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
