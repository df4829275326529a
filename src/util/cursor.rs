//! Forward-only little-endian reader over a byte buffer.

use byteorder::{ByteOrder, LittleEndian};

use super::{Error, Result};

/// Mutable forward-only reader over a borrowed byte buffer.
///
/// All multi-byte reads are little-endian. Reads that need more bytes than
/// remain fail with [`Error::Truncated`] and leave the position unchanged.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True once every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Read up to `n` bytes, consuming whatever is left if fewer remain.
    ///
    /// Callers compare the returned length against `n` to detect truncation.
    pub fn read_available(&mut self, n: usize) -> &'a [u8] {
        let n = n.min(self.remaining());
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    /// Read a NUL-terminated string.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected. A string
    /// with no terminator consumes the rest of the buffer and fails.
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(len) => {
                let s = String::from_utf8_lossy(&rest[..len]).into_owned();
                self.pos += len + 1;
                Ok(s)
            }
            None => {
                let err = Error::Truncated {
                    offset: self.pos,
                    needed: rest.len() + 1,
                    available: rest.len(),
                };
                self.pos = self.data.len();
                Err(err)
            }
        }
    }

    /// Read a string prefixed by its u32 byte length.
    pub fn read_prefixed_string(&mut self) -> Result<String> {
        let start = self.pos;
        let len = self.read_u32()? as usize;
        match self.take(len) {
            Ok(bytes) => Ok(String::from_utf8(bytes.to_vec())?),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }
}
