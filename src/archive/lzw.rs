//! Self-building dictionary compression used by archive records.
//!
//! The stream is a sequence of 12-bit codes packed two per three bytes:
//! code `p` starts at byte `p + p / 2`, even codes take a full byte plus the
//! low nibble of the next one, odd codes take the high nibble plus a full
//! byte. Codes below 256 are literals; higher codes name an `(offset,
//! length)` run of earlier output. One dictionary entry is added per code
//! after the first, and the dictionary wraps back to 256 entries at 4096.

use std::collections::HashMap;

use super::format::{DICT_CAPACITY, FIRST_DICT_CODE};
use crate::util::{Error, Result};

/// Iterator over the packed 12-bit codes of a compressed stream.
struct Codes<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> Codes<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, index: 0 }
    }
}

impl Iterator for Codes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let p = self.index;
        let l = p + p / 2;
        if l + 1 >= self.data.len() {
            return None;
        }
        let (a, b) = (self.data[l] as usize, self.data[l + 1] as usize);
        self.index += 1;
        Some(if p % 2 == 0 {
            a | ((b & 0x0F) << 8)
        } else {
            (a >> 4) | (b << 4)
        })
    }
}

/// Decompress `input` into exactly `target` bytes.
///
/// Decoding stops when the output reaches `target`, the codes run out, or a
/// code lies beyond the current dictionary size. Anything other than exactly
/// `target` bytes is [`Error::DecompressionMismatch`]; partial output is
/// never returned because every later byte depends on the earlier ones.
pub fn decompress(input: &[u8], target: usize) -> Result<Vec<u8>> {
    if target == 0 {
        return Ok(Vec::new());
    }

    let mismatch = |actual: usize| Error::DecompressionMismatch { expected: target, actual };

    let mut codes = Codes::new(input);
    let first = match codes.next() {
        Some(code) if code < FIRST_DICT_CODE => code as u8,
        _ => return Err(mismatch(0)),
    };

    // declared size is untrusted, reserve from the input and grow
    let mut out = Vec::with_capacity(target.min(input.len().saturating_mul(8)));
    out.push(first);

    // (offset, length) runs into `out`
    let mut dict = vec![(0usize, 0usize); DICT_CAPACITY];
    let mut next = FIRST_DICT_CODE;
    let mut prev_start = 0usize;
    let mut prev_len = 1usize;

    while out.len() < target {
        let Some(code) = codes.next() else { break };
        let start = out.len();

        let len = if code < FIRST_DICT_CODE {
            out.push(code as u8);
            1
        } else if code < next {
            let (offset, len) = dict[code];
            out.extend_from_within(offset..offset + len);
            len
        } else if code == next {
            out.extend_from_within(prev_start..prev_start + prev_len);
            let first_byte = out[prev_start];
            out.push(first_byte);
            prev_len + 1
        } else {
            tracing::trace!(code, dict_size = next, "dictionary code out of range");
            break;
        };

        dict[next] = (prev_start, prev_len + 1);
        next += 1;
        if next >= DICT_CAPACITY {
            next = FIRST_DICT_CODE;
        }
        prev_start = start;
        prev_len = len;
    }

    if out.len() != target {
        return Err(mismatch(out.len()));
    }
    Ok(out)
}

/// Compress `input` into a stream accepted by [`decompress`].
///
/// The encoder drops its whole table when the dictionary wraps so it never
/// emits a code at or above the decoder's current dictionary size.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let Some((&head, tail)) = input.split_first() else {
        return Vec::new();
    };

    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next = FIRST_DICT_CODE;
    let mut codes = Vec::with_capacity(input.len() / 2 + 1);
    let mut w = head as u16;

    for &c in tail {
        if let Some(&code) = table.get(&(w, c)) {
            w = code;
            continue;
        }
        codes.push(w);
        table.insert((w, c), next as u16);
        next += 1;
        if next >= DICT_CAPACITY {
            next = FIRST_DICT_CODE;
            table.clear();
        }
        w = c as u16;
    }
    codes.push(w);

    pack_codes(&codes)
}

fn pack_codes(codes: &[u16]) -> Vec<u8> {
    let mut out = vec![0u8; codes.len() + codes.len().div_ceil(2)];
    for (p, &code) in codes.iter().enumerate() {
        let l = p + p / 2;
        if p % 2 == 0 {
            out[l] |= (code & 0xFF) as u8;
            out[l + 1] |= ((code >> 8) & 0x0F) as u8;
        } else {
            out[l] |= ((code & 0x0F) << 4) as u8;
            out[l + 1] |= (code >> 4) as u8;
        }
    }
    out
}
