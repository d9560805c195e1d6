// crates/duoscope-media/src/helpers/mod.rs
//
// Internal helper modules for duoscope-media.
// Not re-exported from lib.rs; decode implementation details only.

pub mod seek;
