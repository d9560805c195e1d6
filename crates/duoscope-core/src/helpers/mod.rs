// crates/duoscope-core/src/helpers/mod.rs
//
// Small stateless helpers shared by every review component.

pub mod frames;
pub mod geometry;
pub mod log;
