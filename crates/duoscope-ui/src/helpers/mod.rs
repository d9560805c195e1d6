pub mod format;
pub mod surface;
