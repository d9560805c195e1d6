// crates/duoscope-media/src/probe.rs
//
// In-process FFmpeg probing: duration, frame rate and picture size.
// Header-only; nothing is decoded.

use std::path::Path;

use anyhow::{anyhow, Result};
use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;

use duoscope_core::duoscope_log;
use duoscope_core::media_types::MediaInfo;

pub fn probe_media(path: &Path) -> Result<MediaInfo> {
    let ctx = input(path)?;
    let stream = ctx
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("no video stream in {}", path.display()))?;

    // Container duration first, stream duration as fallback.
    let mut duration = ctx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    if duration <= 0.0 {
        let tb = stream.time_base();
        duration = stream.duration() as f64 * tb.numerator() as f64
            / tb.denominator().max(1) as f64;
    }
    if duration <= 0.0 {
        return Err(anyhow!("duration unknown for {}", path.display()));
    }

    let rate = stream.avg_frame_rate();
    let fps = if rate.denominator() > 0 && rate.numerator() > 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };

    let (width, height) = unsafe {
        let p = stream.parameters().as_ptr();
        ((*p).width as u32, (*p).height as u32)
    };

    duoscope_log!(
        "[media] probed {duration:.2}s {width}x{height} @ {fps:.3} ← {}",
        path.display()
    );
    Ok(MediaInfo { duration, fps, width, height })
}
