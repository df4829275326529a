//! Base-65536 unsigned big integer.
//!
//! Just enough arbitrary-precision arithmetic to check RSA-style archive
//! signatures: comparison, subtraction, schoolbook multiplication, binary
//! long-division remainder and square-and-multiply modular exponentiation.
//!
//! Values are stored as 16-bit limbs, least significant first, with no
//! trailing zero limbs. Zero is the empty limb vector. Every operation
//! returns a new trimmed value; nothing is mutated in place.

use std::cmp::Ordering;
use std::fmt;

/// Unsigned big integer with 16-bit limbs.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BigInt {
    limbs: Vec<u16>,
}

impl BigInt {
    /// The value zero.
    #[inline]
    pub const fn zero() -> Self {
        Self { limbs: Vec::new() }
    }

    /// The value one.
    #[inline]
    pub fn one() -> Self {
        Self { limbs: vec![1] }
    }

    /// Build from raw limbs (least significant first). Trailing zeros are trimmed.
    pub fn from_limbs(limbs: Vec<u16>) -> Self {
        let mut v = Self { limbs };
        v.trim();
        v
    }

    /// Build from a machine integer.
    pub fn from_u64(mut value: u64) -> Self {
        let mut limbs = Vec::with_capacity(4);
        while value != 0 {
            limbs.push((value & 0xFFFF) as u16);
            value >>= 16;
        }
        Self { limbs }
    }

    /// Build from a byte string.
    ///
    /// With `big_endian` the first byte is the most significant one,
    /// otherwise the first byte is the least significant one. An odd
    /// number of bytes is allowed; the missing high byte counts as zero.
    pub fn from_bytes(bytes: &[u8], big_endian: bool) -> Self {
        let mut limbs = Vec::with_capacity(bytes.len().div_ceil(2));
        if big_endian {
            let mut i = bytes.len();
            while i > 0 {
                let lo = bytes[i - 1] as u16;
                let hi = if i >= 2 { bytes[i - 2] as u16 } else { 0 };
                limbs.push(lo | (hi << 8));
                i = i.saturating_sub(2);
            }
        } else {
            for pair in bytes.chunks(2) {
                let lo = pair[0] as u16;
                let hi = pair.get(1).copied().unwrap_or(0) as u16;
                limbs.push(lo | (hi << 8));
            }
        }
        Self::from_limbs(limbs)
    }

    /// Limbs, least significant first.
    #[inline]
    pub fn limbs(&self) -> &[u16] {
        &self.limbs
    }

    /// True for the value zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Number of significant bits (0 for zero).
    pub fn bit_len(&self) -> usize {
        match self.limbs.last() {
            None => 0,
            Some(&top) => (self.limbs.len() - 1) * 16 + (16 - top.leading_zeros() as usize),
        }
    }

    /// Test bit `index` (bit 0 is the least significant).
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        self.limbs
            .get(index / 16)
            .is_some_and(|limb| (limb >> (index % 16)) & 1 != 0)
    }

    /// Low 32 bits of the value.
    #[inline]
    pub fn to_u32(&self) -> u32 {
        let lo = self.limbs.first().copied().unwrap_or(0) as u32;
        let hi = self.limbs.get(1).copied().unwrap_or(0) as u32;
        lo | (hi << 16)
    }

    /// Minimal big-endian byte representation (empty for zero).
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.limbs.len() * 2);
        for limb in self.limbs.iter().rev() {
            out.extend_from_slice(&limb.to_be_bytes());
        }
        let first = out.iter().position(|&b| b != 0).unwrap_or(out.len());
        out.drain(..first);
        out
    }

    /// `self < other`.
    #[inline]
    pub fn less_than(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Less
    }

    /// Difference with borrow propagation.
    ///
    /// There are no negative values: when `other > self` the result wraps
    /// modulo `65536^n` where `n` is the limb count of the longer operand.
    pub fn sub(&self, other: &Self) -> Self {
        let n = self.limbs.len().max(other.limbs.len());
        let mut limbs = Vec::with_capacity(n);
        let mut borrow = 0i32;
        for i in 0..n {
            let a = self.limbs.get(i).copied().unwrap_or(0) as i32;
            let b = other.limbs.get(i).copied().unwrap_or(0) as i32;
            let mut d = a - b - borrow;
            if d < 0 {
                d += 0x1_0000;
                borrow = 1;
            } else {
                borrow = 0;
            }
            limbs.push(d as u16);
        }
        Self::from_limbs(limbs)
    }

    /// Sum.
    pub fn add(&self, other: &Self) -> Self {
        let n = self.limbs.len().max(other.limbs.len());
        let mut limbs = Vec::with_capacity(n + 1);
        let mut carry = 0u32;
        for i in 0..n {
            let a = self.limbs.get(i).copied().unwrap_or(0) as u32;
            let b = other.limbs.get(i).copied().unwrap_or(0) as u32;
            let s = a + b + carry;
            limbs.push((s & 0xFFFF) as u16);
            carry = s >> 16;
        }
        if carry != 0 {
            limbs.push(carry as u16);
        }
        Self::from_limbs(limbs)
    }

    /// Schoolbook product.
    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut acc = vec![0u16; self.limbs.len() + other.limbs.len()];
        for (i, &a) in self.limbs.iter().enumerate() {
            let mut carry = 0u64;
            for (j, &b) in other.limbs.iter().enumerate() {
                let t = acc[i + j] as u64 + a as u64 * b as u64 + carry;
                acc[i + j] = (t & 0xFFFF) as u16;
                carry = t >> 16;
            }
            let mut k = i + other.limbs.len();
            while carry != 0 {
                let t = acc[k] as u64 + carry;
                acc[k] = (t & 0xFFFF) as u16;
                carry = t >> 16;
                k += 1;
            }
        }
        Self::from_limbs(acc)
    }

    /// Shift left by `bits`.
    pub fn shl(&self, bits: usize) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let limb_shift = bits / 16;
        let bit_shift = bits % 16;
        let mut limbs = vec![0u16; limb_shift];
        limbs.reserve(self.limbs.len() + 1);
        let mut carry = 0u32;
        for &limb in &self.limbs {
            let v = ((limb as u32) << bit_shift) | carry;
            limbs.push((v & 0xFFFF) as u16);
            carry = v >> 16;
        }
        if carry != 0 {
            limbs.push(carry as u16);
        }
        Self::from_limbs(limbs)
    }

    /// Shift right by `bits`.
    pub fn shr(&self, bits: usize) -> Self {
        let limb_shift = bits / 16;
        if limb_shift >= self.limbs.len() {
            return Self::zero();
        }
        let bit_shift = bits % 16;
        let src = &self.limbs[limb_shift..];
        let mut limbs = Vec::with_capacity(src.len());
        for i in 0..src.len() {
            let lo = (src[i] as u32) >> bit_shift;
            let hi = if bit_shift == 0 {
                0
            } else {
                (src.get(i + 1).copied().unwrap_or(0) as u32) << (16 - bit_shift)
            };
            limbs.push(((lo | hi) & 0xFFFF) as u16);
        }
        Self::from_limbs(limbs)
    }

    /// Remainder of `self / modulus` by shift-and-subtract.
    ///
    /// A zero modulus has no remainder; `self` is returned unchanged.
    pub fn rem(&self, modulus: &Self) -> Self {
        if modulus.is_zero() || self.less_than(modulus) {
            return self.clone();
        }
        let shift = self.bit_len() - modulus.bit_len();
        let mut r = self.clone();
        let mut d = modulus.shl(shift);
        for _ in 0..=shift {
            if !r.less_than(&d) {
                r = r.sub(&d);
            }
            d = d.shr(1);
        }
        r
    }

    /// `self ^ exponent mod modulus`, square-and-multiply from the low bit.
    pub fn pow_mod(&self, exponent: &Self, modulus: &Self) -> Self {
        let mut result = Self::one().rem(modulus);
        let mut base = self.rem(modulus);
        for i in 0..exponent.bit_len() {
            if exponent.bit(i) {
                result = result.mul(&base).rem(modulus);
            }
            base = base.mul(&base).rem(modulus);
        }
        result
    }

    fn trim(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for BigInt {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::LowerHex for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut limbs = self.limbs.iter().rev();
        if let Some(top) = limbs.next() {
            write!(f, "{:x}", top)?;
        }
        for limb in limbs {
            write!(f, "{:04x}", limb)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt(0x{:x})", self)
    }
}
