// crates/duoscope-core/src/helpers/frames.rs
//
// Conversions between playback time (seconds) and frame indices at a fixed
// frame rate. Every drift comparison in the synchronizer goes through these,
// never through raw wall-clock seconds.
//
// Float products like `(40.0 / 30.0) * 30.0` can land a hair above the integer,
// which `ceil` would push to the next frame. FRAME_EPSILON absorbs that.

use std::time::Duration;

/// Default frame rate of the recording rigs.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

const FRAME_EPSILON: f64 = 1e-6;

/// Total frames covered by `duration_secs` of media, rounded up.
///
/// ```
/// use duoscope_core::helpers::frames::duration_frames;
/// assert_eq!(duration_frames(10.0, 30.0), 300);
/// assert_eq!(duration_frames(10.01, 30.0), 301);
/// assert_eq!(duration_frames(0.0, 30.0), 0);
/// ```
pub fn duration_frames(duration_secs: f64, fps: f64) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (duration_secs * fps - FRAME_EPSILON).ceil().max(0.0) as u64
}

/// Raw frame index at playback time `secs`: `ceil(secs × fps)`.
///
/// ```
/// use duoscope_core::helpers::frames::frame_at;
/// assert_eq!(frame_at(40.0 / 30.0, 30.0), 40);
/// assert_eq!(frame_at(1.01, 30.0), 31);
/// ```
pub fn frame_at(secs: f64, fps: f64) -> i64 {
    if !secs.is_finite() || fps <= 0.0 {
        return 0;
    }
    (secs * fps - FRAME_EPSILON).ceil() as i64
}

/// Playback time in seconds at which `frame` begins.
pub fn frame_to_secs(frame: i64, fps: f64) -> f64 {
    if fps <= 0.0 {
        return 0.0;
    }
    frame as f64 / fps
}

/// Wall-clock time a lagging stream needs to cover `gap_frames`.
pub fn gap_to_duration(gap_frames: i64, fps: f64) -> Duration {
    if gap_frames <= 0 || fps <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(gap_frames as f64 / fps)
}

/// Format an adjusted frame index as `MM:SS:FF` at the given frame rate.
///
/// Negative frames (playhead still before the usable range) get a `-` prefix.
///
/// ```
/// use duoscope_core::helpers::frames::format_frame_time;
/// assert_eq!(format_frame_time(0, 30.0),    "00:00:00");
/// assert_eq!(format_frame_time(1845, 30.0), "01:01:15");
/// assert_eq!(format_frame_time(-15, 30.0),  "-00:00:15");
/// ```
pub fn format_frame_time(frame: i64, fps: f64) -> String {
    let per_sec = fps.round().max(1.0) as i64;
    let sign    = if frame < 0 { "-" } else { "" };
    let f       = frame.abs();
    let total_s = f / per_sec;
    let m       = total_s / 60;
    let sc      = total_s % 60;
    let fr      = f % per_sec;
    format!("{sign}{m:02}:{sc:02}:{fr:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_frames_rounds_up_partial_frame() {
        assert_eq!(duration_frames(1.0 / 30.0 + 0.001, 30.0), 2);
        assert_eq!(duration_frames(9.99, 30.0), 300);
    }

    #[test]
    fn duration_frames_rejects_bad_input() {
        assert_eq!(duration_frames(f64::NAN, 30.0), 0);
        assert_eq!(duration_frames(-3.0, 30.0), 0);
        assert_eq!(duration_frames(3.0, 0.0), 0);
    }

    #[test]
    fn frame_at_is_exact_on_frame_boundaries() {
        for f in 0..600_i64 {
            assert_eq!(frame_at(frame_to_secs(f, 30.0), 30.0), f);
        }
    }

    #[test]
    fn frame_at_other_rates() {
        assert_eq!(frame_at(2.0, 25.0), 50);
        assert_eq!(frame_at(1.0 / 59.94 * 120.0, 59.94), 120);
    }

    #[test]
    fn gap_to_duration_two_frames() {
        let d = gap_to_duration(2, 30.0);
        assert!((d.as_secs_f64() - 2.0 / 30.0).abs() < 1e-9);
        assert_eq!(gap_to_duration(-4, 30.0), Duration::ZERO);
    }
}
