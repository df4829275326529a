//! Animation keyframe storage.

mod packed;

pub use packed::{Keyframe, KeyframeBuffer, KeyframeProperty, PackingType};
