// crates/duoscope-core/src/lib.rs
//
// Pure review logic. No egui, ffmpeg or threads.
//
// Hosts hand in media through the `MediaStream` trait and receive drawing
// through the `Surface` traits. Everything here is driven by the caller's
// clock, so the whole crate is testable with fakes.
//
// To add a new review capability:
//   1. Create a module file here
//   2. Add `pub mod mymodule;` below
//   3. Give it a ReviewCommand variant and one match arm in session.rs

pub mod commands;
pub mod config;
pub mod detection;
pub mod events;
pub mod helpers;
pub mod media_types;
pub mod payload;
pub mod ruler;
pub mod schedule;
pub mod session;
pub mod stream;
pub mod surface;
pub mod sync;
pub mod toolkit;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ReviewConfig;
pub use session::ReviewSession;
pub use stream::{MediaStream, StreamTag};
pub use surface::{Drawable, FrameSurface, Rgba, Surface};
