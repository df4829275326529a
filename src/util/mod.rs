//! Utility types and functions shared across the crate.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`ByteCursor`] - Forward-only little-endian reader
//! - [`TypedArray`] / [`ElementType`] - Packed numeric arrays
//! - Math type re-exports from glam

mod cursor;
mod error;
mod math;
mod typed_array;

pub use cursor::*;
pub use error::*;
pub use math::*;
pub use typed_array::*;
