//! Typed numeric arrays decoded from raw record bytes.
//!
//! Packed streams arrive as byte buffers tagged with an element type. A
//! [`TypedArray`] holds them as one of the small set of element widths the
//! codecs need, and every reinterpret/recast operation is written once over
//! the [`Element`] trait instead of once per concrete type.

use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Error, Result};

/// Element type of a packed numeric stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ElementType {
    Int8 = 0,
    Uint8 = 1,
    Int16 = 2,
    Uint16 = 3,
    Int32 = 4,
    Uint32 = 5,
    Float32 = 6,
}

impl ElementType {
    /// Size in bytes of one element.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Float32 => "float32",
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float32)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric element that can live in a [`TypedArray`].
///
/// Integer implementations use wrapping arithmetic in their own width, the
/// way the packed streams were produced.
pub trait Element: Pod + Copy + Default + PartialOrd + fmt::Debug {
    const ELEMENT_TYPE: ElementType;

    fn swap_bytes(self) -> Self;
    fn add_wrapping(self, other: Self) -> Self;
    fn sub_wrapping(self, other: Self) -> Self;
    fn to_f32(self) -> f32;
    fn to_f64(self) -> f64;
    fn to_u32(self) -> u32;
    fn to_i32(self) -> i32;
}

macro_rules! impl_int_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn swap_bytes(self) -> Self { <$t>::swap_bytes(self) }
                #[inline]
                fn add_wrapping(self, other: Self) -> Self { self.wrapping_add(other) }
                #[inline]
                fn sub_wrapping(self, other: Self) -> Self { self.wrapping_sub(other) }
                #[inline]
                fn to_f32(self) -> f32 { self as f32 }
                #[inline]
                fn to_f64(self) -> f64 { self as f64 }
                #[inline]
                fn to_u32(self) -> u32 { self as u32 }
                #[inline]
                fn to_i32(self) -> i32 { self as i32 }
            }
        )*
    };
}

impl_int_element! {
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
}

impl Element for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float32;

    #[inline]
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
    #[inline]
    fn add_wrapping(self, other: Self) -> Self {
        self + other
    }
    #[inline]
    fn sub_wrapping(self, other: Self) -> Self {
        self - other
    }
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }
    #[inline]
    fn to_i32(self) -> i32 {
        self as i32
    }
}

/// Reinterpret little-endian bytes as a vector of `T`.
///
/// The copy handles unaligned input; a trailing partial element is an error.
pub fn from_le_bytes<T: Element>(bytes: &[u8]) -> Result<Vec<T>> {
    let size = std::mem::size_of::<T>();
    if bytes.len() % size != 0 {
        return Err(Error::metadata(format!(
            "{} bytes is not a whole number of {} elements",
            bytes.len(),
            T::ELEMENT_TYPE
        )));
    }
    let mut values: Vec<T> = bytemuck::pod_collect_to_vec(bytes);
    if cfg!(target_endian = "big") {
        for v in &mut values {
            *v = v.swap_bytes();
        }
    }
    Ok(values)
}

/// Numeric array tagged with its element width.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
}

/// Run `$body` with `$v` bound to the inner vector, whatever its element type.
macro_rules! with_array {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            TypedArray::Int8($v) => $body,
            TypedArray::Uint8($v) => $body,
            TypedArray::Int16($v) => $body,
            TypedArray::Uint16($v) => $body,
            TypedArray::Int32($v) => $body,
            TypedArray::Uint32($v) => $body,
            TypedArray::Float32($v) => $body,
        }
    };
}
pub(crate) use with_array;

impl TypedArray {
    /// Reinterpret record bytes as an array of `ty`.
    pub fn from_le_bytes(ty: ElementType, bytes: &[u8]) -> Result<Self> {
        Ok(match ty {
            ElementType::Int8 => Self::Int8(from_le_bytes(bytes)?),
            ElementType::Uint8 => Self::Uint8(from_le_bytes(bytes)?),
            ElementType::Int16 => Self::Int16(from_le_bytes(bytes)?),
            ElementType::Uint16 => Self::Uint16(from_le_bytes(bytes)?),
            ElementType::Int32 => Self::Int32(from_le_bytes(bytes)?),
            ElementType::Uint32 => Self::Uint32(from_le_bytes(bytes)?),
            ElementType::Float32 => Self::Float32(from_le_bytes(bytes)?),
        })
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        with_array!(self, v => element_type_of(v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_array!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recast every element to `u32` (`as` semantics).
    pub fn to_u32_vec(&self) -> Vec<u32> {
        with_array!(self, v => v.iter().map(|x| x.to_u32()).collect())
    }

    /// Recast every element to `i32` (`as` semantics).
    pub fn to_i32_vec(&self) -> Vec<i32> {
        with_array!(self, v => v.iter().map(|x| x.to_i32()).collect())
    }

    /// Recast every element to `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        with_array!(self, v => v.iter().map(|x| x.to_f32()).collect())
    }
}

#[inline]
fn element_type_of<T: Element>(_: &[T]) -> ElementType {
    T::ELEMENT_TYPE
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for TypedArray {
                fn from(v: Vec<$t>) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_vec! {
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    f32 => Float32,
}
