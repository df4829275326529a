//! Scene archive container.
//!
//! An archive is a flat sequence of named, typed byte records. Each record
//! may be dictionary-compressed and may have a `<name>.sig` companion
//! carrying its signature.
//!
//! ## Record Layout
//!
//! ```text
//! +----------------------+
//! | Name + NUL           |  variable
//! +----------------------+
//! | Type + NUL           |  variable
//! +----------------------+
//! | Flags                |  4 bytes (u32 LE, bit 0 = compressed)
//! +----------------------+
//! | Compressed length    |  4 bytes (u32 LE)
//! +----------------------+
//! | Decompressed length  |  4 bytes (u32 LE)
//! +----------------------+
//! | Bytes                |  compressed length
//! +----------------------+
//! ```
//!
//! Records repeat until the buffer ends.

mod format;
pub mod lzw;
mod reader;
mod record;
pub(crate) mod signature;
mod writer;

pub use format::*;
pub use reader::*;
pub use record::*;
pub use signature::{rolling_hash, SignatureStatus, SignatureVerifier};
pub use writer::*;
