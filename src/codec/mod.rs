//! Binary codecs for packed geometry and animation streams.
//!
//! - [`index`] - delta / implicit / watermark index reconstruction
//! - [`vertex`] - parallelogram prediction and dequantization
//! - [`normal`] - octahedral normals
//! - [`keyframe`] - linear and quaternion keyframe channels, tick repair
//! - [`direction`] - direction-table rotation channels
//!
//! Every decoder is a pure function over borrowed buffers. State that spans
//! several calls ([`WatermarkState`], [`RotationAccumulator`]) is returned
//! from each call and passed back in by the caller.

pub mod direction;
pub mod index;
pub mod keyframe;
pub mod normal;
pub mod vertex;

pub use direction::{DirectionCache, DirectionTable};
pub use index::{decode_indices, CodecHeader, ImplicitPolicy, IndexPasses, WatermarkState};
pub use keyframe::{decode_linear_vec3, decode_quaternion, repair_ticks, RotationAccumulator};
pub use normal::decode_octahedral;
pub use vertex::{decode_predictive, dequantize};
