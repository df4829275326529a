//! Octahedral normal decoding.

use crate::util::{sign_not_zero, Element, Error, Result, Vec3};

/// Unfold a point of the `[-1, 1]^2` octahedral square to a unit vector.
#[inline]
pub fn octahedral_to_unit(x: f32, y: f32) -> Vec3 {
    let mut n = Vec3::new(x, y, 1.0 - x.abs() - y.abs());
    if n.z < 0.0 {
        let (ox, oy) = (n.x, n.y);
        n.x = sign_not_zero(ox) * (1.0 - oy.abs());
        n.y = sign_not_zero(oy) * (1.0 - ox.abs());
    }
    n.normalize_or_zero()
}

/// Decode interleaved `(u, v)` pairs into unit normals.
///
/// Components are scaled against the largest value in the whole array, not
/// a fixed bit width. An all-zero array decodes as if the maximum were 1.
pub fn decode_octahedral<T: Element>(pairs: &[T]) -> Result<Vec<Vec3>> {
    if pairs.len() % 2 != 0 {
        return Err(Error::out_of_bounds(format!(
            "octahedral stream has odd length {}",
            pairs.len()
        )));
    }
    let max = pairs.iter().map(|v| v.to_f32()).fold(0.0f32, f32::max);
    let max = if max > 0.0 { max } else { 1.0 };

    Ok(pairs
        .chunks_exact(2)
        .map(|p| {
            let x = (p[0].to_f32() / max).clamp(0.0, 1.0) * 2.0 - 1.0;
            let y = (p[1].to_f32() / max).clamp(0.0, 1.0) * 2.0 - 1.0;
            octahedral_to_unit(x, y)
        })
        .collect())
}
