// crates/duoscope-media/src/upload.rs
//
// Uploader: fire-and-forget POST of measurement payloads.
//
// The UI hands payloads over through `MeasurementSink::send` and never waits.
// A single background thread posts them in order and reports each outcome
// on `rx`. Failures are reported, not retried; the rulers stay on screen so
// the operator can re-send by nudging a point.

use std::thread;

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};

use duoscope_core::duoscope_log;
use duoscope_core::media_types::UploadResult;
use duoscope_core::payload::{MeasurementPayload, MeasurementSink};

struct UploadJob {
    endpoint: String,
    body:     String,
}

pub struct Uploader {
    endpoint:   String,
    job_tx:     Sender<UploadJob>,
    result_tx:  Sender<UploadResult>,
    /// One result per payload sent, in send order.
    pub rx:     Receiver<UploadResult>,
}

impl Uploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let (job_tx, job_rx)       = unbounded::<UploadJob>();
        let (result_tx, result_rx) = unbounded::<UploadResult>();

        let tx = result_tx.clone();
        thread::spawn(move || {
            for job in job_rx {
                let result = match post_json(&job.endpoint, &job.body) {
                    Ok(status) => {
                        duoscope_log!("[upload] {status} ← {}", job.endpoint);
                        UploadResult::Sent { status }
                    }
                    Err(e) => {
                        duoscope_log!("[upload] failed → {}: {e}", job.endpoint);
                        UploadResult::Failed { msg: e.to_string() }
                    }
                };
                if tx.send(result).is_err() { return; }
            }
        });

        Self { endpoint: endpoint.into(), job_tx, result_tx, rx: result_rx }
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }
}

impl MeasurementSink for Uploader {
    fn send(&mut self, payload: MeasurementPayload) {
        let body = match payload.to_json() {
            Ok(b)  => b,
            Err(e) => {
                let _ = self.result_tx.send(UploadResult::Failed { msg: e.to_string() });
                return;
            }
        };
        let job = UploadJob { endpoint: self.endpoint.clone(), body };
        if self.job_tx.send(job).is_err() {
            let _ = self.result_tx.send(UploadResult::Failed { msg: "upload thread gone".into() });
        }
    }
}

fn post_json(endpoint: &str, body: &str) -> Result<u16> {
    let resp = ureq::post(endpoint)
        .header("Content-Type", "application/json")
        .send(body)?;
    Ok(resp.status().as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoscope_core::helpers::geometry::Point;
    use duoscope_core::payload::Keypoints;

    fn payload() -> MeasurementPayload {
        let k = Keypoints { p0: Point::new(1.0, 2.0), p1: Point::new(3.0, 4.0) };
        MeasurementPayload { keypoints_left: k, keypoints_right: k }
    }

    #[test]
    fn unreachable_endpoint_reports_failure() {
        // nothing listens on the discard port
        let mut up = Uploader::new("http://127.0.0.1:9/processing/");
        up.send(payload());
        let r = up.rx.recv_timeout(std::time::Duration::from_secs(30)).unwrap();
        assert!(matches!(r, UploadResult::Failed { .. }));
    }

    #[test]
    fn malformed_endpoint_reports_failure() {
        let mut up = Uploader::new("not a url");
        up.send(payload());
        let r = up.rx.recv_timeout(std::time::Duration::from_secs(30)).unwrap();
        assert!(matches!(r, UploadResult::Failed { .. }));
    }
}
