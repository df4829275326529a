//! Packed keyframe property records.
//!
//! All properties of a clip share one little-endian keyframe buffer, viewed
//! as 32-bit floats and 16-bit words. A property's keyframe `k` starts at
//! float `start_index + k * stride_float` and word
//! `2 * start_index + k * stride_word`.
//!
//! ## Keyframe Records
//!
//! ```text
//! full (16 bytes)     | value f32 | tick f32 | in f32 | out f32 |
//! reduced (8 bytes)   | value f32 | tick u16 | interp u8 | weight u8 |
//! minimal (4 bytes)   | value f32 |
//! ```
//!
//! Minimal keyframes use their ordinal as tick. Reduced weights are
//! fractions of 255.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::codec::keyframe::repair_ticks;
use crate::util::{ByteCursor, Error, Result};

/// Byte layout of one keyframe record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PackingType {
    Full = 0,
    Reduced = 1,
    Minimal = 2,
}

impl PackingType {
    /// Size in bytes of one keyframe record.
    #[inline]
    pub const fn record_size(self) -> usize {
        match self {
            Self::Full => 16,
            Self::Reduced => 8,
            Self::Minimal => 4,
        }
    }
}

impl TryFrom<u8> for PackingType {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Self::Full),
            1 => Ok(Self::Reduced),
            2 => Ok(Self::Minimal),
            other => Err(Error::metadata(format!("unknown keyframe packing type {}", other))),
        }
    }
}

/// Where and how one animated property's keyframes are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyframeProperty {
    pub packing_type: PackingType,
    pub interpolation_type: u8,
    pub start_index: usize,
    pub num_keyframes: u32,
    pub stride_float: u32,
    pub stride_word: u32,
}

impl KeyframeProperty {
    /// Property with keyframes packed back to back.
    pub fn new(packing_type: PackingType, interpolation_type: u8, start_index: usize, num_keyframes: u32) -> Self {
        let size = packing_type.record_size() as u32;
        Self {
            packing_type,
            interpolation_type,
            start_index,
            num_keyframes,
            stride_float: size / 4,
            stride_word: size / 2,
        }
    }

    /// Parse a property header: packing u8, interpolation u8, start u32,
    /// count u32.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let packing_type = PackingType::try_from(cursor.read_u8()?)?;
        let interpolation_type = cursor.read_u8()?;
        let start_index = cursor.read_u32()? as usize;
        let num_keyframes = cursor.read_u32()?;
        Ok(Self::new(packing_type, interpolation_type, start_index, num_keyframes))
    }

    #[inline]
    fn float_base(&self, k: u32) -> usize {
        self.start_index
            .saturating_add((k as usize).saturating_mul(self.stride_float as usize))
    }

    #[inline]
    fn word_base(&self, k: u32) -> usize {
        self.start_index
            .saturating_mul(2)
            .saturating_add((k as usize).saturating_mul(self.stride_word as usize))
    }
}

/// One decoded keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Keyframe {
    pub tick: f32,
    pub value: f32,
    pub in_weight: f32,
    pub out_weight: f32,
    pub interpolation: u8,
}

/// Read-only view of a shared keyframe buffer.
#[derive(Clone, Copy, Debug)]
pub struct KeyframeBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> KeyframeBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of whole floats in the buffer.
    #[inline]
    pub fn float_len(&self) -> usize {
        self.bytes.len() / 4
    }

    /// `width` bytes of element `index` of the buffer viewed as `width`-byte items.
    fn slice(&self, index: usize, width: usize) -> Result<&'a [u8]> {
        index
            .checked_mul(width)
            .and_then(|start| self.bytes.get(start..start.checked_add(width)?))
            .ok_or_else(|| {
                Error::out_of_bounds(format!(
                    "keyframe read of item {} ({} bytes) past buffer of {} bytes",
                    index,
                    width,
                    self.bytes.len()
                ))
            })
    }

    /// Float at float index `i`.
    pub fn float(&self, i: usize) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.slice(i, 4)?))
    }

    /// Word at word index `i`.
    pub fn word(&self, i: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.slice(i, 2)?))
    }

    fn byte(&self, i: usize) -> Result<u8> {
        Ok(self.slice(i, 1)?[0])
    }

    fn keyframe(&self, prop: &KeyframeProperty, k: u32) -> Result<Keyframe> {
        let f = prop.float_base(k);
        let w = prop.word_base(k);
        let value = self.float(f)?;
        Ok(match prop.packing_type {
            PackingType::Full => Keyframe {
                value,
                tick: self.float(f.saturating_add(1))?,
                in_weight: self.float(f.saturating_add(2))?,
                out_weight: self.float(f.saturating_add(3))?,
                interpolation: prop.interpolation_type,
            },
            PackingType::Reduced => {
                let tail = w.saturating_add(3).saturating_mul(2);
                let weight = self.byte(tail.saturating_add(1))? as f32 / 255.0;
                Keyframe {
                    value,
                    tick: self.word(w.saturating_add(2))? as f32,
                    in_weight: weight,
                    out_weight: weight,
                    interpolation: self.byte(tail)?,
                }
            }
            PackingType::Minimal => Keyframe {
                value,
                tick: k as f32,
                interpolation: prop.interpolation_type,
                ..Keyframe::default()
            },
        })
    }

    /// Decode every keyframe of `prop`, repairing non-increasing ticks.
    pub fn read(&self, prop: &KeyframeProperty, tick_epsilon: f32) -> Result<Vec<Keyframe>> {
        let mut keys = (0..prop.num_keyframes)
            .map(|k| self.keyframe(prop, k))
            .collect::<Result<Vec<_>>>()?;

        let mut ticks: Vec<f32> = keys.iter().map(|k| k.tick).collect();
        if repair_ticks(&mut ticks, tick_epsilon) > 0 {
            for (key, tick) in keys.iter_mut().zip(ticks) {
                key.tick = tick;
            }
        }
        Ok(keys)
    }
}
