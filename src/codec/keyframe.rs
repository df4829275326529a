//! Compressed animation keyframe channels.
//!
//! Linear and quaternion channels store quantized increments axis-major
//! (all X, then all Y, ...). Decoding regroups them per keyframe,
//! dequantizes with `origin + raw * scale`, and sums them up. Quaternion
//! channels then chain the sums as relative rotations.
//!
//! Direction-table channels live in [`super::direction`].

use crate::util::{Element, Error, Quat, Result, Vec3, Vec4};

/// Default nudge applied to non-increasing ticks.
pub const DEFAULT_TICK_EPSILON: f32 = 0.001;

/// Force strictly increasing ticks.
///
/// A tick `<=` its (already repaired) predecessor becomes predecessor +
/// `epsilon`, or the next representable `f32` when `epsilon` is below the
/// predecessor's precision. Returns how many ticks were moved.
pub fn repair_ticks(ticks: &mut [f32], epsilon: f32) -> usize {
    let mut repaired = 0;
    for i in 1..ticks.len() {
        let prev = ticks[i - 1];
        if ticks[i] <= prev {
            let next = prev + epsilon;
            ticks[i] = if next > prev { next } else { prev.next_up() };
            repaired += 1;
        }
    }
    if repaired > 0 {
        tracing::trace!(repaired, total = ticks.len(), "non-increasing keyframe ticks repaired");
    }
    repaired
}

/// Recast raw ticks to `f32` and repair their ordering.
pub fn decode_ticks<T: Element>(raw: &[T], epsilon: f32) -> Vec<f32> {
    let mut ticks: Vec<f32> = raw.iter().map(|t| t.to_f32()).collect();
    repair_ticks(&mut ticks, epsilon);
    ticks
}

/// Regroup an axis-major stream of `N` components and dequantize it.
fn deinterleave<T: Element, const N: usize>(raw: &[T], origin: [f32; N], scale: [f32; N]) -> Result<Vec<[f32; N]>> {
    if raw.len() % N != 0 {
        return Err(Error::out_of_bounds(format!(
            "{} values do not split into {} axes",
            raw.len(),
            N
        )));
    }
    let count = raw.len() / N;
    Ok((0..count)
        .map(|k| std::array::from_fn(|axis| origin[axis] + raw[axis * count + k].to_f32() * scale[axis]))
        .collect())
}

/// Running sum over keyframes.
fn accumulate<const N: usize>(frames: &mut [[f32; N]], mut sum: [f32; N]) -> [f32; N] {
    for frame in frames.iter_mut() {
        for axis in 0..N {
            sum[axis] += frame[axis];
            frame[axis] = sum[axis];
        }
    }
    sum
}

/// Decode a linear Vec3 channel.
pub fn decode_linear_vec3<T: Element>(raw: &[T], origin: Vec3, scale: Vec3) -> Result<Vec<Vec3>> {
    let mut frames = deinterleave(raw, origin.to_array(), scale.to_array())?;
    accumulate(&mut frames, [0.0; 3]);
    Ok(frames.into_iter().map(Vec3::from_array).collect())
}

// ============================================================================
// Quaternion channels
// ============================================================================

/// State carried from one quaternion decode to the next.
///
/// `sum` is the running component sum, `product` the last absolute rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationAccumulator {
    pub sum: Vec4,
    pub product: Quat,
}

impl Default for RotationAccumulator {
    fn default() -> Self {
        Self { sum: Vec4::ZERO, product: Quat::IDENTITY }
    }
}

/// Decode a quaternion channel stored as `(x, y, z, w)` increments.
///
/// Each summed sample is a rotation relative to the previous keyframe:
/// `q[n] = q[n - 1] * q[n]`. Continue a channel split over several streams
/// by passing the returned accumulator to the next call.
pub fn decode_quaternion<T: Element>(
    raw: &[T],
    origin: Vec4,
    scale: Vec4,
    acc: RotationAccumulator,
) -> Result<(Vec<Quat>, RotationAccumulator)> {
    let mut frames = deinterleave(raw, origin.to_array(), scale.to_array())?;
    let sum = accumulate(&mut frames, acc.sum.to_array());

    let mut product = acc.product;
    let rotations = frames
        .into_iter()
        .map(|[x, y, z, w]| {
            product *= Quat::from_xyzw(x, y, z, w);
            product
        })
        .collect();

    Ok((rotations, RotationAccumulator { sum: Vec4::from_array(sum), product }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_equal_ticks_repaired() {
        let mut ticks = vec![5.0, 5.0];
        assert_eq!(repair_ticks(&mut ticks, DEFAULT_TICK_EPSILON), 1);
        assert_eq!(ticks[0], 5.0);
        assert!((ticks[1] - 5.001).abs() < 1e-6);
        assert!(ticks[1] > ticks[0]);
    }

    #[test]
    fn test_tick_repair_is_cumulative() {
        let mut ticks = vec![5.0, 5.0, 5.0, 3.0, 8.0, 9.0];
        assert_eq!(repair_ticks(&mut ticks, 0.5), 3);
        assert_eq!(ticks, vec![5.0, 5.5, 6.0, 6.5, 8.0, 9.0]);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_large_ticks_stay_increasing() {
        // 0.001 is below the f32 spacing at 100000
        let mut ticks = [100000.0f32, 100000.0, 100000.0, 99000.0];
        assert_eq!(repair_ticks(&mut ticks, DEFAULT_TICK_EPSILON), 3);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]), "{:?}", ticks);
        assert!(ticks[3] - ticks[0] < 0.1);
    }

    #[test]
    fn test_increasing_ticks_untouched() {
        let ticks = decode_ticks(&[0u16, 1, 2, 40], DEFAULT_TICK_EPSILON);
        assert_eq!(ticks, vec![0.0, 1.0, 2.0, 40.0]);
        assert!(decode_ticks::<u16>(&[], DEFAULT_TICK_EPSILON).is_empty());
    }

    #[test]
    fn test_linear_vec3_deinterleave_and_sum() {
        // 3 keyframes: X = 1,1,1  Y = 0,2,2  Z = 4,0,0
        let raw = [1i16, 1, 1, 0, 2, 2, 4, 0, 0];
        let out = decode_linear_vec3(&raw, Vec3::ZERO, Vec3::splat(0.5)).unwrap();
        assert_eq!(out, vec![
            Vec3::new(0.5, 0.0, 2.0),
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::new(1.5, 2.0, 2.0),
        ]);
    }

    #[test]
    fn test_linear_vec3_origin_applies_per_increment() {
        let raw = [0u8, 0];
        let out = decode_linear_vec3(&raw[..], Vec3::ONE, Vec3::ONE);
        assert!(out.is_err());

        let out = decode_linear_vec3(&[0u8, 0, 0, 0, 0, 0], Vec3::new(1.0, 0.0, -1.0), Vec3::ONE).unwrap();
        assert_eq!(out[1], Vec3::new(2.0, 0.0, -2.0));
    }

    #[test]
    fn test_quaternion_chain() {
        // one increment of a 90 degree turn about Z, then zero increments
        let (s, c) = (FRAC_PI_2 / 2.0).sin_cos();
        let quarter = [0.0, 0.0, s, c];
        let raw: Vec<f32> = (0..4).flat_map(|axis| [quarter[axis], 0.0]).collect();

        let (rots, acc) = decode_quaternion(&raw, Vec4::ZERO, Vec4::ONE, RotationAccumulator::default()).unwrap();
        assert_eq!(rots.len(), 2);
        // second sample repeats the relative turn: 180 degrees total
        let v = rots[1] * Vec3::X;
        assert!((v - Vec3::NEG_X).length() < 1e-5);
        assert_eq!(acc.product, rots[1]);

        // continuing the channel keeps turning
        let (more, _) = decode_quaternion(&[0.0f32, 0.0, 0.0, 0.0], Vec4::ZERO, Vec4::ONE, acc).unwrap();
        let v = more[0] * Vec3::X;
        assert!((v - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_quaternion_identity_stream() {
        let raw = [0u8, 0, 0, 0, 0, 0, 1, 0];
        let (rots, acc) = decode_quaternion(&raw, Vec4::ZERO, Vec4::ONE, RotationAccumulator::default()).unwrap();
        assert_eq!(rots, vec![Quat::IDENTITY, Quat::IDENTITY]);
        assert_eq!(acc.sum, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(decode_quaternion(&raw[..6], Vec4::ZERO, Vec4::ONE, acc).is_err());
    }
}
