// crates/duoscope-media/src/lib.rs
//
// No egui dependency. Talks to duoscope-ui via channels and the
// core traits only.
//
// To add a new media capability:
//   1. Create a new module file here
//   2. Add `pub mod mymodule;` below
//   3. Call it from worker.rs (probe or a new MediaWorker method)

pub mod decode;
mod helpers;
pub mod probe;
pub mod stream;
pub mod upload;
pub mod worker;

// Re-export the main public API so duoscope-ui imports are simple.
pub use stream::VideoStream;
pub use upload::Uploader;
pub use worker::MediaWorker;
pub use duoscope_core::media_types::{MediaInfo, MediaResult, RgbaFrame, UploadResult};
