//! # scenepak
//!
//! Decoder for compressed scene archives.
//!
//! An archive is a flat container of named, typed byte records. Records may
//! be dictionary-compressed and signed. The packed geometry and animation
//! streams inside them are quantized and delta/predictively encoded; the
//! codecs here turn them back into flat numeric arrays for a scene
//! assembler to consume.
//!
//! ## Modules
//!
//! - [`util`] - Errors, byte cursor, typed arrays, math re-exports
//! - [`archive`] - Record container, decompression, signatures
//! - [`codec`] - Index, vertex, normal and keyframe codecs
//! - [`anim`] - Packed keyframe property records
//! - [`core`] - Decode configuration and session
//! - [`geom`] - Side-table driven mesh channel decoding
//!
//! ## Example
//!
//! ```ignore
//! use scenepak::prelude::*;
//!
//! let mut archive = Archive::open_path("level.pak")?;
//! let session = DecodeSession::new(DecodeConfig::load_default());
//! session.verify_archive(&mut archive);
//!
//! for name in archive.list_by_type_prefix("image/") {
//!     println!("{}", name);
//! }
//! ```

pub mod anim;
pub mod archive;
pub mod codec;
pub mod core;
pub mod geom;
pub mod util;

// Re-export commonly used types
pub use archive::{Archive, ArchiveRecord, ArchiveWriter};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::anim::{Keyframe, KeyframeBuffer, KeyframeProperty, PackingType};
    pub use crate::archive::{Archive, ArchiveRecord, ArchiveWriter, SignatureStatus, SignatureVerifier};
    pub use crate::codec::{ImplicitPolicy, IndexPasses, RotationAccumulator, WatermarkState};
    pub use crate::core::{DecodeConfig, DecodeSession};
    pub use crate::geom::{decode_geometry, DecodedGeometry, GeometryMeta};
    pub use crate::util::{ElementType, Error, Result, TypedArray};
}
