//! Index stream reconstruction.
//!
//! Packed index streams go through up to three passes, in this order:
//!
//! 1. zig-zag delta decode
//! 2. implicit bitmask expansion (only new corners are stored explicitly)
//! 3. watermark decode (distance below a running high-water mark)
//!
//! Which passes apply is per-format configuration ([`IndexPasses`]), never
//! detected from the data.
//!
//! ## Implicit Stream Layout
//!
//! ```text
//! +--------------------+
//! | primitive_length   |  u32
//! +--------------------+
//! | mask_word_count    |  u32
//! +--------------------+
//! | expected_index     |  u32
//! +--------------------+
//! | mask words         |  mask_word_count * u32, bit i = slot i
//! +--------------------+
//! | explicit values    |  remaining u32
//! +--------------------+
//! ```

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Number of header words at the start of an implicit stream.
pub const CODEC_HEADER_WORDS: usize = 3;

/// Decode one zig-zag encoded value.
#[inline]
pub const fn zigzag_decode(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

/// Encode one signed value with zig-zag.
#[inline]
pub const fn zigzag_encode(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

/// Undo zig-zag delta coding in place.
///
/// `values[offset]` is kept as is; every later value becomes
/// `previous + zigzag_decode(value)` with 32-bit wrap.
pub fn decode_delta(values: &mut [u32], offset: usize) -> Result<()> {
    if offset > values.len() {
        return Err(Error::out_of_bounds(format!(
            "delta offset {} past stream of {} values",
            offset,
            values.len()
        )));
    }
    let Some((first, rest)) = values[offset..].split_first_mut() else {
        return Ok(());
    };
    let mut prev = *first;
    for v in rest {
        prev = prev.wrapping_add(zigzag_decode(*v) as u32);
        *v = prev;
    }
    Ok(())
}

/// Inverse of [`decode_delta`].
pub fn encode_delta(values: &[u32], offset: usize) -> Vec<u32> {
    let mut out = values.to_vec();
    if offset >= values.len() {
        return out;
    }
    for i in offset + 1..values.len() {
        let delta = values[i].wrapping_sub(values[i - 1]) as i32;
        out[i] = zigzag_encode(delta);
    }
    out
}

// ============================================================================
// Implicit expansion
// ============================================================================

/// Value synthesized for clear mask bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImplicitPolicy {
    /// Counter seeded at `expected_index`, incremented per implicit slot
    #[default]
    Increment,
    /// Always `expected_index` (high-watermark streams)
    Fixed,
}

/// Fixed header at the start of an implicit index stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecHeader {
    pub primitive_length: u32,
    pub mask_word_count: u32,
    pub expected_index: u32,
}

impl CodecHeader {
    /// Read and validate the header of `stream`.
    pub fn read(stream: &[u32]) -> Result<Self> {
        let &[primitive_length, mask_word_count, expected_index, ..] = stream else {
            return Err(Error::out_of_bounds(format!(
                "implicit stream of {} words has no header",
                stream.len()
            )));
        };
        let header = Self { primitive_length, mask_word_count, expected_index };
        if (mask_word_count as u64) * 32 < primitive_length as u64 {
            return Err(Error::out_of_bounds(format!(
                "{} mask words cannot cover {} slots",
                mask_word_count, primitive_length
            )));
        }
        if header.explicit_offset() > stream.len() {
            return Err(Error::out_of_bounds(format!(
                "{} mask words past stream of {} words",
                mask_word_count,
                stream.len()
            )));
        }
        Ok(header)
    }

    /// Word offset of the first explicit value.
    #[inline]
    pub fn explicit_offset(&self) -> usize {
        CODEC_HEADER_WORDS + self.mask_word_count as usize
    }
}

/// Expand an implicit index stream to one index per slot.
pub fn decode_implicit(stream: &[u32], policy: ImplicitPolicy) -> Result<Vec<u32>> {
    let header = CodecHeader::read(stream)?;
    let masks = &stream[CODEC_HEADER_WORDS..header.explicit_offset()];
    let mut explicit = stream[header.explicit_offset()..].iter().copied();

    let mut counter = header.expected_index;
    let mut out = Vec::with_capacity(header.primitive_length as usize);
    for slot in 0..header.primitive_length as usize {
        let word = masks[slot / 32];
        if (word >> (slot % 32)) & 1 != 0 {
            let value = explicit.next().ok_or_else(|| {
                Error::out_of_bounds(format!("explicit values exhausted at slot {}", slot))
            })?;
            out.push(value);
        } else {
            match policy {
                ImplicitPolicy::Fixed => out.push(header.expected_index),
                ImplicitPolicy::Increment => {
                    out.push(counter);
                    counter = counter.wrapping_add(1);
                }
            }
        }
    }
    Ok(out)
}

// ============================================================================
// Watermark
// ============================================================================

/// Running high-water mark shared by related watermark decodes.
///
/// `magic` never decreases. Arrays that were encoded against one counter
/// must be decoded by threading the returned state into the next call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatermarkState {
    magic: u32,
}

impl WatermarkState {
    #[inline]
    pub const fn new(magic: u32) -> Self {
        Self { magic }
    }

    #[inline]
    pub const fn magic(&self) -> u32 {
        self.magic
    }
}

/// Undo watermark coding.
///
/// Each value is a distance below `magic`. Distances past `magic` clamp the
/// output to 0, so outputs never exceed the watermark and `magic` only moves
/// on a zero distance.
pub fn decode_watermark(values: &[u32], state: WatermarkState) -> (Vec<u32>, WatermarkState) {
    let mut magic = state.magic;
    let out = values
        .iter()
        .map(|&e| {
            let v = magic.saturating_sub(e);
            if magic <= v {
                magic = v.saturating_add(1);
            }
            v
        })
        .collect();
    (out, WatermarkState { magic })
}

// ============================================================================
// Chained decode
// ============================================================================

/// Which index passes a format uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexPasses {
    pub delta: bool,
    pub implicit: bool,
    pub watermark: bool,
}

impl IndexPasses {
    /// Plain index list, no passes.
    pub const NONE: Self = Self { delta: false, implicit: false, watermark: false };
}

/// Run the enabled passes over `stream`.
///
/// With implicit expansion on, delta decoding covers only the explicit
/// values after the mask words. Any failure yields no indices at all.
pub fn decode_indices(
    stream: &[u32],
    passes: IndexPasses,
    policy: ImplicitPolicy,
    state: WatermarkState,
) -> Result<(Vec<u32>, WatermarkState)> {
    let mut values = stream.to_vec();

    if passes.delta {
        let offset = if passes.implicit {
            CodecHeader::read(&values)?.explicit_offset()
        } else {
            0
        };
        decode_delta(&mut values, offset)?;
    }

    if passes.implicit {
        values = decode_implicit(&values, policy)?;
    }

    if passes.watermark {
        return Ok(decode_watermark(&values, state));
    }
    Ok((values, state))
}
