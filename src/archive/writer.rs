//! Archive container writer.
//!
//! Produces the exact layout [`Archive::open`](super::Archive::open) parses,
//! optionally compressing each record with [`lzw::compress`].

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::format::*;
use super::lzw;
use crate::util::Result;

/// In-memory archive builder.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    buf: Vec<u8>,
    count: usize,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append a record, compressing it when `compress` is set.
    pub fn add(&mut self, name: &str, type_name: &str, bytes: &[u8], compress: bool) -> &mut Self {
        if compress {
            let packed = lzw::compress(bytes);
            self.add_raw(name, type_name, FLAG_COMPRESSED, packed.len() as u32, bytes.len() as u32, &packed)
        } else {
            let len = bytes.len() as u32;
            self.add_raw(name, type_name, 0, len, len, bytes)
        }
    }

    /// Append a companion signature record for `name`.
    pub fn add_signature(&mut self, name: &str, signature_be: &[u8]) -> &mut Self {
        let payload = format!(
            "[[{}]]",
            signature_be.iter().map(u8::to_string).collect::<Vec<_>>().join(",")
        );
        self.add(&signature_name(name), "application/json", payload.as_bytes(), false)
    }

    /// Append a record with caller-supplied header fields.
    ///
    /// No consistency check is made between the fields and `payload`.
    pub fn add_raw(
        &mut self,
        name: &str,
        type_name: &str,
        flags: u32,
        compressed_size: u32,
        decompressed_size: u32,
        payload: &[u8],
    ) -> &mut Self {
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(0);
        self.buf.extend_from_slice(type_name.as_bytes());
        self.buf.push(0);
        // writes into a Vec cannot fail
        let _ = self.buf.write_u32::<LittleEndian>(flags);
        let _ = self.buf.write_u32::<LittleEndian>(compressed_size);
        let _ = self.buf.write_u32::<LittleEndian>(decompressed_size);
        self.buf.extend_from_slice(payload);
        self.count += 1;
        tracing::trace!(name, type_name, flags, compressed_size, decompressed_size, "record written");
        self
    }

    /// Serialized archive bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the builder and return the archive bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Write the archive to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&self.buf)?;
        writer.flush()?;
        tracing::debug!(path = %path.as_ref().display(), records = self.count, bytes = self.buf.len(), "archive written");
        Ok(())
    }
}
