// crates/duoscope-core/src/helpers/log.rs
//
// Unified logging for every duoscope crate.
//
// Release builds of the desktop host have no console attached, so plain
// `eprintln!` output vanishes. All log calls append to a file in the OS temp
// directory; debug builds mirror each line to stderr as well.
//
// File: $TEMP/duoscope.log, append-only, created on first write.
//
// Usage:
//   use duoscope_core::duoscope_log;
//   duoscope_log!("[sync] paused {} for {gap} frames", side.label());
//
// Tags in use: [sync] [toolkit] [events] [detection] [session] [media] [upload] [app]

use std::io::Write;

const LOG_FILE: &str = "duoscope.log";

/// Append `msg` to the duoscope log file.
/// Never panics. A failed write is dropped.
pub fn dlog(msg: &str) {
    if cfg!(debug_assertions) {
        eprintln!("{msg}");
    }
    if let Ok(mut f) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(std::env::temp_dir().join(LOG_FILE))
    {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let _ = writeln!(f, "[{ts}] {msg}");
    }
}

/// Formats like `eprintln!` but routes through `dlog`.
#[macro_export]
macro_rules! duoscope_log {
    ($($arg:tt)*) => {
        $crate::helpers::log::dlog(&format!($($arg)*))
    };
}
