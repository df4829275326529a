//! Direction-table rotation channels.
//!
//! Each keyframe stores three integers `(band, ring, twist)`. The sphere is
//! cut into `resolution + 1` latitude bands; band `b` sits at polar angle
//! `b * pi / resolution` and holds `max(1, floor(2 * resolution * sin(theta)
//! + epsilon))` evenly spaced rings. `(band, ring)` picks a unit axis and
//! `twist` a rotation angle about it.

use std::collections::HashMap;
use std::f32::consts::PI;

use crate::util::{Element, Error, Quat, Result, Vec3};

/// Default number of latitude steps between the poles.
pub const DEFAULT_TABLE_RESOLUTION: u32 = 720;

/// Default slack added before rounding ring counts down.
pub const DEFAULT_TABLE_EPSILON: f32 = 0.25;

/// Default radians per twist step.
pub const DEFAULT_TWIST_SCALE: f32 = PI / 4096.0;

/// Table geometry plus `(band, ring)`.
type AxisKey = (u32, u32, u32, u32);

/// Memo of decoded table axes keyed by `(band, ring)`.
///
/// Entries also carry the resolution and epsilon of the table that filled
/// them, so one cache can serve differently shaped tables.
#[derive(Debug, Default)]
pub struct DirectionCache {
    axes: HashMap<AxisKey, Vec3>,
    hits: u64,
}

impl DirectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Lookups answered without recomputing.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.axes.clear();
        self.hits = 0;
    }
}

/// Latitude/longitude direction table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionTable {
    resolution: u32,
    epsilon: f32,
    twist_scale: f32,
}

impl Default for DirectionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_RESOLUTION, DEFAULT_TABLE_EPSILON, DEFAULT_TWIST_SCALE)
    }
}

impl DirectionTable {
    /// A zero resolution is treated as 1.
    pub fn new(resolution: u32, epsilon: f32, twist_scale: f32) -> Self {
        Self { resolution: resolution.max(1), epsilon, twist_scale }
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[inline]
    fn polar_angle(&self, band: u32) -> f32 {
        band as f32 * PI / self.resolution as f32
    }

    /// Number of rings in `band`.
    pub fn ring_count(&self, band: u32) -> u32 {
        let theta = self.polar_angle(band);
        let rings = (2.0 * self.resolution as f32 * theta.sin() + self.epsilon).floor();
        (rings as u32).max(1)
    }

    /// Unit axis of `(band, ring)`, computed without the cache.
    pub fn axis(&self, band: u32, ring: u32) -> Result<Vec3> {
        if band > self.resolution {
            return Err(Error::out_of_bounds(format!(
                "band {} past table resolution {}",
                band, self.resolution
            )));
        }
        let count = self.ring_count(band);
        if ring >= count {
            return Err(Error::out_of_bounds(format!(
                "ring {} past {} rings of band {}",
                ring, count, band
            )));
        }
        let theta = self.polar_angle(band);
        let phi = ring as f32 * 2.0 * PI / count as f32;
        let (st, ct) = theta.sin_cos();
        let (sp, cp) = phi.sin_cos();
        Ok(Vec3::new(st * cp, st * sp, ct).normalize())
    }

    /// Unit axis of `(band, ring)`, memoized in `cache`.
    pub fn cached_axis(&self, band: u32, ring: u32, cache: &mut DirectionCache) -> Result<Vec3> {
        let key = (self.resolution, self.epsilon.to_bits(), band, ring);
        if let Some(&axis) = cache.axes.get(&key) {
            cache.hits += 1;
            return Ok(axis);
        }
        let axis = self.axis(band, ring)?;
        cache.axes.insert(key, axis);
        Ok(axis)
    }

    /// Rotation of one keyframe.
    pub fn rotation(&self, band: u32, ring: u32, twist: u32, cache: &mut DirectionCache) -> Result<Quat> {
        let axis = self.cached_axis(band, ring, cache)?;
        Ok(Quat::from_axis_angle(axis, twist as f32 * self.twist_scale))
    }

    /// Decode a stream of `(band, ring, twist)` triples.
    pub fn decode<T: Element>(&self, raw: &[T], cache: &mut DirectionCache) -> Result<Vec<Quat>> {
        if raw.len() % 3 != 0 {
            return Err(Error::out_of_bounds(format!(
                "direction stream of {} values is not made of triples",
                raw.len()
            )));
        }
        raw.chunks_exact(3)
            .map(|k| self.rotation(k[0].to_u32(), k[1].to_u32(), k[2].to_u32(), cache))
            .collect()
    }
}
