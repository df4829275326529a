//! Math type re-exports and small scalar helpers shared by the codecs.

pub use glam::{Quat, Vec2, Vec3, Vec4};

/// `1.0` for input `>= 0.0` (both zeros included), `-1.0` otherwise.
#[inline]
pub fn sign_not_zero(v: f32) -> f32 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}
