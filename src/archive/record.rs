//! Archive records.

use serde::de::DeserializeOwned;

use super::format::is_compressed;
use crate::util::Result;

/// One named, typed byte record of an archive.
///
/// `bytes` always holds the decompressed payload. The size fields keep the
/// values declared on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveRecord {
    name: String,
    type_name: String,
    flags: u32,
    compressed_size: u32,
    decompressed_size: u32,
    bytes: Vec<u8>,
}

impl ArchiveRecord {
    /// Create an uncompressed record.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u32;
        Self {
            name: name.into(),
            type_name: type_name.into(),
            flags: 0,
            compressed_size: len,
            decompressed_size: len,
            bytes,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        type_name: String,
        flags: u32,
        compressed_size: u32,
        decompressed_size: u32,
        bytes: Vec<u8>,
    ) -> Self {
        Self { name, type_name, flags, compressed_size, decompressed_size, bytes }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type string, usually a MIME type such as `image/png`.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        is_compressed(self.flags)
    }

    #[inline]
    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    #[inline]
    pub fn decompressed_size(&self) -> u32 {
        self.decompressed_size
    }

    /// Decompressed payload.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the payload, consuming the record.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parse the payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_sizes() {
        let r = ArchiveRecord::new("a.bin", "application/octet-stream", vec![1, 2, 3]);
        assert_eq!(r.compressed_size(), 3);
        assert_eq!(r.decompressed_size(), 3);
        assert!(!r.is_compressed());
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_json_payload() {
        let r = ArchiveRecord::new("meta.json", "application/json", br#"{"count": 4}"#.to_vec());
        let v: serde_json::Value = r.json().unwrap();
        assert_eq!(v["count"], 4);
    }
}
