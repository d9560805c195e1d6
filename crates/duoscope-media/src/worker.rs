// crates/duoscope-media/src/worker.rs
//
// MediaWorker: background probing of the videos picked for review.
// All probe results reach the UI over one shared channel.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use uuid::Uuid;

use duoscope_core::duoscope_log;
use duoscope_core::media_types::MediaResult;

use crate::probe::probe_media;

pub struct MediaWorker {
    /// Shared result channel for probes.
    pub rx:   Receiver<MediaResult>,
    tx:       Sender<MediaResult>,
    shutdown: Arc<AtomicBool>,
}

impl Default for MediaWorker {
    fn default() -> Self { Self::new() }
}

impl MediaWorker {
    pub fn new() -> Self {
        let (tx, rx) = bounded(64);
        Self { rx, tx, shutdown: Arc::new(AtomicBool::new(false)) }
    }

    /// Probe `path` on a background thread. Replies with `Probed` or `Error`
    /// carrying the same `id`.
    pub fn probe(&self, id: Uuid, path: PathBuf) {
        let tx = self.tx.clone();
        let sd = self.shutdown.clone();
        thread::spawn(move || {
            if sd.load(Ordering::Relaxed) { return; }
            let result = match probe_media(&path) {
                Ok(info) => MediaResult::Probed { id, path, info },
                Err(e) => {
                    duoscope_log!("[media] probe failed: {e}");
                    MediaResult::Error { id, msg: e.to_string() }
                }
            };
            if sd.load(Ordering::Relaxed) { return; }
            let _ = tx.send(result);
        });
    }

    /// Stop delivering results; probes already running finish silently.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_file_reports_error_with_same_id() {
        let w  = MediaWorker::new();
        let id = Uuid::new_v4();
        w.probe(id, PathBuf::from("/definitely/not/here.mp4"));
        match w.rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            MediaResult::Error { id: got, .. } => assert_eq!(got, id),
            MediaResult::Probed { .. } => panic!("probe of a missing file succeeded"),
        }
    }
}
