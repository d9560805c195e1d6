// crates/duoscope-media/src/decode.rs
//
// FrameDecoder: stateful per-file decoder that walks forward through a video
// without re-opening or seeking for every frame. The playback thread in
// stream.rs keeps one per camera; a paused seek opens a fresh one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video;

use duoscope_core::media_types::RgbaFrame;

use crate::helpers::seek::seek_to_secs;

/// Frame serials are unique across every decoder in the process.
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

pub struct FrameDecoder {
    pub path:      PathBuf,
    ictx:          ffmpeg::format::context::Input,
    decoder:       ffmpeg::decoder::video::Video,
    video_idx:     usize,
    pub last_pts:  i64,
    tb_num:        i32,
    tb_den:        i32,
    pub out_w:     u32,
    pub out_h:     u32,
    scaler:        SwsContext,
}

impl FrameDecoder {
    /// Open `path` positioned at the keyframe before `timestamp`. Output is
    /// scaled down to at most `max_width` pixels wide (0 keeps native size).
    pub fn open(path: &Path, timestamp: f64, max_width: u32) -> Result<Self> {
        let mut ictx  = input(path)?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?.index();

        let (tb_num, tb_den, raw_w, raw_h) = {
            let stream = ictx.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
            let tb = stream.time_base();
            let (w, h) = unsafe {
                let p = stream.parameters().as_ptr();
                ((*p).width as u32, (*p).height as u32)
            };
            (tb.numerator(), tb.denominator(), w, h)
        };

        seek_to_secs(&mut ictx, timestamp, "FrameDecoder::open");

        // Second context for decoder params (Parameters borrows from the stream).
        let ictx2   = input(path)?;
        let stream2 = ictx2.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream2.parameters())?;
        let decoder = dec_ctx.decoder().video()?;

        let (out_w, out_h) = output_size(raw_w, raw_h, max_width);
        let scaler = SwsContext::get(
            decoder.format(), decoder.width(), decoder.height(),
            Pixel::RGBA, out_w, out_h, Flags::BILINEAR,
        )?;

        let mut d = Self {
            path: path.to_path_buf(), ictx, decoder, video_idx,
            last_pts: 0, tb_num, tb_den, out_w, out_h, scaler,
        };
        d.last_pts = d.ts_to_pts(timestamp) - 1;
        Ok(d)
    }

    pub fn ts_to_pts(&self, t: f64) -> i64 {
        (t * self.tb_den as f64 / self.tb_num.max(1) as f64) as i64
    }

    pub fn pts_to_secs(&self, pts: i64) -> f64 {
        pts as f64 * self.tb_num as f64 / self.tb_den.max(1) as f64
    }

    /// Decode the next frame sequentially. `None` at end of file.
    pub fn next_frame(&mut self) -> Option<RgbaFrame> {
        for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() != self.video_idx { continue; }
            if self.decoder.send_packet(&packet).is_err() { continue; }
            let mut decoded = Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(self.last_pts + 1);
                self.last_pts = pts;
                let ts = pts as f64 * self.tb_num as f64 / self.tb_den.max(1) as f64;
                return scale(&mut self.scaler, &decoded, self.out_w, self.out_h, ts);
            }
        }
        None
    }

    /// Read forward to the first frame at or past `target_secs`, scaling only
    /// that one. Hitting end of file returns the last frame decoded.
    pub fn advance_to(&mut self, target_secs: f64) -> Option<RgbaFrame> {
        let target_pts = self.ts_to_pts(target_secs);
        let mut last: Option<(Video, i64)> = None;
        for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() != self.video_idx { continue; }
            if self.decoder.send_packet(&packet).is_err() { continue; }
            let mut decoded = Video::empty();
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(self.last_pts + 1);
                self.last_pts = pts;
                if pts + 1 >= target_pts {
                    let ts = pts as f64 * self.tb_num as f64 / self.tb_den.max(1) as f64;
                    return scale(&mut self.scaler, &decoded, self.out_w, self.out_h, ts);
                }
                last = Some((decoded.clone(), pts));
            }
        }
        let (frame, pts) = last?;
        let ts = self.pts_to_secs(pts);
        scale(&mut self.scaler, &frame, self.out_w, self.out_h, ts)
    }
}

/// Fit `raw` into `max_width`, keeping aspect, even height for the scaler.
fn output_size(raw_w: u32, raw_h: u32, max_width: u32) -> (u32, u32) {
    if max_width == 0 || raw_w <= max_width {
        return (raw_w.max(2), raw_h.max(2));
    }
    let h = ((max_width as f64 * raw_h as f64 / raw_w.max(1) as f64) as u32).max(2) & !1;
    (max_width, h)
}

/// Scale one decoded frame to RGBA and destripe it (drop stride padding).
fn scale(scaler: &mut SwsContext, decoded: &Video, out_w: u32, out_h: u32, ts: f64) -> Option<RgbaFrame> {
    let mut out = Video::empty();
    scaler.run(decoded, &mut out).ok()?;
    let stride    = out.stride(0);
    let raw       = out.data(0);
    let row_bytes = out_w as usize * 4;
    let data: Vec<u8> = (0..out_h as usize)
        .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
        .copied()
        .collect();
    Some(RgbaFrame {
        serial:    NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
        timestamp: ts,
        width:     out_w,
        height:    out_h,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_size_keeps_aspect_and_even_height() {
        assert_eq!(output_size(1920, 1080, 960), (960, 540));
        assert_eq!(output_size(1920, 1081, 640), (640, 360));
        assert_eq!(output_size(640, 480, 960), (640, 480));
        assert_eq!(output_size(640, 480, 0), (640, 480));
    }
}
