//! Benchmarks for frame extraction.
//!
//! Run with: cargo bench
//!
//! The synthetic benchmarks need no fixtures. The FFmpeg benchmark requires
//! `tests/fixtures/sample_video.mp4` and is skipped without it.

use std::{
    path::Path,
    sync::Arc,
    time::Duration,
};

use criterion::{BenchmarkId, Criterion, Throughput};
use ffmpeg_next::util::log::Level as LogLevel;
use framesnap::{
    ExtractOptions, ExtractionEvent, ExtractionJob, ExtractionWorker, FrameError, FrameWriter,
    JpegWriter, VideoDecoder, VideoOpener,
};
use image::{DynamicImage, Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";
const SYNTHETIC_FRAMES: u64 = 300;

/// Opener producing flat 320x240 frames from memory.
struct SolidVideo {
    frames: u64,
}

struct SolidDecoder {
    remaining: u64,
    frame: DynamicImage,
}

impl VideoOpener for SolidVideo {
    fn open(&self, _path: &Path) -> Result<Box<dyn VideoDecoder>, FrameError> {
        Ok(Box::new(SolidDecoder {
            remaining: self.frames,
            frame: DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([90, 120, 150]))),
        }))
    }
}

impl VideoDecoder for SolidDecoder {
    fn total_frames(&self) -> Option<u64> {
        Some(self.remaining)
    }

    fn next_frame(&mut self) -> Result<Option<DynamicImage>, FrameError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.frame.clone()))
    }
}

/// Writer that discards frames, isolating worker overhead from encoding.
struct NullWriter;

impl FrameWriter for NullWriter {
    fn extension(&self) -> &str {
        "jpg"
    }

    fn write(&self, _image: &DynamicImage, _path: &Path) -> Result<(), FrameError> {
        Ok(())
    }
}

fn run_to_completion(options: &ExtractOptions, source: &str, root: &Path, stride: u64) -> u64 {
    let mut worker = ExtractionWorker::with_options(options.clone());
    let job = ExtractionJob::new(source, root, stride).unwrap();
    let events = worker.start(job).unwrap();
    let mut saved = 0;
    for event in events {
        if let ExtractionEvent::Finished(result) = event {
            assert!(result.success, "{}", result.message);
            saved = result.saved_count;
        }
    }
    saved
}

fn benchmark_worker_overhead(criterion: &mut Criterion) {
    let temporary_directory = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new()
        .with_opener(Arc::new(SolidVideo {
            frames: SYNTHETIC_FRAMES,
        }))
        .with_writer(Arc::new(NullWriter));

    let mut group = criterion.benchmark_group("worker overhead");
    group.throughput(Throughput::Elements(SYNTHETIC_FRAMES));

    for stride in [1u64, 10, 30] {
        group.bench_with_input(BenchmarkId::from_parameter(stride), &stride, |bencher, &stride| {
            bencher.iter(|| {
                run_to_completion(&options, "synthetic.mp4", temporary_directory.path(), stride)
            });
        });
    }

    group.finish();
}

fn benchmark_jpeg_encoding(criterion: &mut Criterion) {
    let temporary_directory = tempfile::tempdir().unwrap();
    let frame = DynamicImage::ImageRgb8(RgbImage::from_fn(640, 360, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }));
    let target = temporary_directory.path().join("0000.jpg");

    let mut group = criterion.benchmark_group("jpeg encoding 640x360");
    for quality in [75u8, 95] {
        let writer = JpegWriter::new(quality);
        group.bench_with_input(BenchmarkId::from_parameter(quality), &quality, |bencher, _| {
            bencher.iter(|| writer.write(&frame, &target).unwrap());
        });
    }
    group.finish();
}

fn benchmark_fixture_extraction(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let temporary_directory = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new();

    let mut group = criterion.benchmark_group("fixture extraction");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));
    group.bench_function("every 30th frame", |bencher| {
        bencher.iter(|| run_to_completion(&options, SAMPLE_VIDEO, temporary_directory.path(), 30));
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_worker_overhead,
    benchmark_jpeg_encoding,
    benchmark_fixture_extraction,
);
criterion::criterion_main!(benches);
