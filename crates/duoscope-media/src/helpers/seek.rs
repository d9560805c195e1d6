// crates/duoscope-media/src/helpers/seek.rs
//
// Every demuxer seek in duoscope goes through here so failure handling is the
// same for the paused-frame decode and the playback pipeline.
//
// Seeks are always backward (`..=seek_ts`): the demuxer lands on the keyframe
// at or before the target and the decoder burns forward to the exact frame.
// A forward seek would land on the next keyframe, which can be seconds past
// the requested position and would put the two cameras visibly out of step.
//
// Position 0 is never sought. A freshly opened context already sits there,
// and some platforms reject `avformat_seek_file(max_ts = 0)`.

use ffmpeg_the_third as ffmpeg;

use duoscope_core::duoscope_log;

/// Seek `ictx` to `target_secs` from the start of the file.
///
/// Returns `false` when the seek failed; the caller then decodes from wherever
/// the demuxer is and relies on its PTS filter.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if target_secs <= 0.0 {
        return true;
    }

    let seek_ts = (target_secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            duoscope_log!("[seek] soft-fail in {label} at {target_secs:.3}s: {e}");
            false
        }
    }
}
