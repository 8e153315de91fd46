//! Internal utility functions.
//!
//! Pixel-data copying and frame-count arithmetic shared by the FFmpeg
//! decoder.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg RGB24 frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// This strips that padding so the result can be passed directly to
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Convert an FFmpeg rational to a float, `None` when it is undefined.
pub(crate) fn rational_to_f64(rational: Rational) -> Option<f64> {
    if rational.numerator() <= 0 || rational.denominator() <= 0 {
        None
    } else {
        Some(f64::from(rational.numerator()) / f64::from(rational.denominator()))
    }
}

/// Duration of `timestamp` ticks in `time_base`, `None` if either is unset.
pub(crate) fn stream_duration(timestamp: i64, time_base: Rational) -> Option<Duration> {
    if timestamp <= 0 {
        return None;
    }
    let seconds = timestamp as f64 * rational_to_f64(time_base)?;
    Some(Duration::from_secs_f64(seconds))
}

/// Estimate a frame count from a duration and a frame rate.
pub(crate) fn estimate_frame_count(duration: Duration, frames_per_second: f64) -> u64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    (duration.as_secs_f64() * frames_per_second).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_rationals_are_rejected() {
        assert_eq!(rational_to_f64(Rational::new(0, 1)), None);
        assert_eq!(rational_to_f64(Rational::new(30, 0)), None);
        assert_eq!(rational_to_f64(Rational::new(30000, 1001)).map(|v| v.round()), Some(30.0));
    }

    #[test]
    fn stream_duration_uses_time_base() {
        let duration = stream_duration(90_000, Rational::new(1, 90_000));
        assert_eq!(duration, Some(Duration::from_secs(1)));
        assert_eq!(stream_duration(-1, Rational::new(1, 1000)), None);
    }

    #[test]
    fn frame_count_estimate_rounds() {
        assert_eq!(estimate_frame_count(Duration::from_secs(4), 25.0), 100);
        assert_eq!(estimate_frame_count(Duration::from_millis(3337), 29.97), 100);
        assert_eq!(estimate_frame_count(Duration::from_secs(4), 0.0), 0);
    }
}
