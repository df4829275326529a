//! Mesh channel decoding.
//!
//! - [`GeometryMeta`] - JSON side table naming index and attribute records
//! - [`decode_geometry`] - side-table driven decode into flat float channels

mod channels;

pub use channels::*;
