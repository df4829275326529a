//! Archive container reader.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use rayon::prelude::*;

use super::format::*;
use super::lzw;
use super::record::ArchiveRecord;
use super::signature::{SignatureStatus, SignatureVerifier};
use crate::util::{ByteCursor, Error, Result};

/// A condition met while parsing that cost one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Declared length exceeds the available bytes. `name` is `None` when
    /// the record header itself was cut short.
    Truncated {
        name: Option<String>,
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Decompressed output did not match the declared length.
    DecompressionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Result of reading one record from the buffer.
enum RecordRead {
    Complete(ArchiveRecord),
    Dropped(Diagnostic),
}

/// Flat container of named, optionally compressed byte records.
///
/// The archive owns every record. [`get`](Self::get) borrows,
/// [`extract`](Self::extract) hands ownership to the caller.
#[derive(Debug, Default)]
pub struct Archive {
    records: BTreeMap<String, ArchiveRecord>,
    /// Signature results keyed by record name.
    signatures: HashMap<String, SignatureStatus>,
    diagnostics: Vec<Diagnostic>,
}

impl Archive {
    /// Parse an archive from an in-memory buffer.
    ///
    /// Truncated or undecompressable records are dropped and recorded in
    /// [`diagnostics`](Self::diagnostics). Fails with [`Error::Truncated`]
    /// only when the buffer is non-empty and truncation left no record at all.
    pub fn open(data: &[u8]) -> Result<Self> {
        let mut archive = Self::default();
        let mut cursor = ByteCursor::new(data);

        while !cursor.is_empty() {
            let offset = cursor.pos();
            match Self::read_record(&mut cursor) {
                Ok(RecordRead::Complete(record)) => {
                    tracing::trace!(
                        name = record.name(),
                        type_name = record.type_name(),
                        size = record.len(),
                        compressed = record.is_compressed(),
                        "record"
                    );
                    if archive.records.contains_key(record.name()) {
                        tracing::debug!(name = record.name(), "duplicate record name, overwriting");
                    }
                    archive.records.insert(record.name().to_string(), record);
                }
                Ok(RecordRead::Dropped(diag)) => {
                    tracing::warn!(?diag, "dropping archive record");
                    archive.diagnostics.push(diag);
                }
                Err(Error::Truncated { needed, available, .. }) => {
                    let diag = Diagnostic::Truncated { name: None, offset, needed, available };
                    tracing::warn!(?diag, "archive ends inside a record header");
                    archive.diagnostics.push(diag);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if archive.records.is_empty() {
            if let Some(Diagnostic::Truncated { offset, needed, available, .. }) =
                archive.diagnostics.iter().find(|d| matches!(d, Diagnostic::Truncated { .. }))
            {
                return Err(Error::Truncated { offset: *offset, needed: *needed, available: *available });
            }
        }

        tracing::debug!(
            records = archive.records.len(),
            dropped = archive.diagnostics.len(),
            "archive parsed"
        );
        Ok(archive)
    }

    /// Open an archive file, memory-mapped when the `mmap` feature is on.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        if file.metadata()?.len() == 0 {
            return Self::open(&[]);
        }

        #[cfg(feature = "mmap")]
        {
            // Safety: read-only mapping; records are copied out before it drops
            let mmap = unsafe { memmap2::Mmap::map(&file) }
                .map_err(|e| Error::MmapFailed(e.to_string()))?;
            Self::open(&mmap)
        }

        #[cfg(not(feature = "mmap"))]
        {
            use std::io::Read;
            let mut file = file;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            Self::open(&data)
        }
    }

    fn read_record(cursor: &mut ByteCursor<'_>) -> Result<RecordRead> {
        let offset = cursor.pos();
        let name = cursor.read_cstring()?;
        let type_name = cursor.read_cstring()?;
        if cursor.remaining() < RECORD_FIELDS_SIZE {
            return Err(Error::Truncated {
                offset: cursor.pos(),
                needed: RECORD_FIELDS_SIZE,
                available: cursor.remaining(),
            });
        }
        let flags = cursor.read_u32()?;
        let compressed_size = cursor.read_u32()?;
        let decompressed_size = cursor.read_u32()?;

        let raw = cursor.read_available(compressed_size as usize);
        if raw.len() < compressed_size as usize {
            return Ok(RecordRead::Dropped(Diagnostic::Truncated {
                name: Some(name),
                offset,
                needed: compressed_size as usize,
                available: raw.len(),
            }));
        }

        let bytes = if is_compressed(flags) {
            match lzw::decompress(raw, decompressed_size as usize) {
                Ok(bytes) => bytes,
                Err(Error::DecompressionMismatch { expected, actual }) => {
                    return Ok(RecordRead::Dropped(Diagnostic::DecompressionMismatch {
                        name,
                        expected,
                        actual,
                    }));
                }
                Err(e) => return Err(e),
            }
        } else {
            raw.to_vec()
        };

        Ok(RecordRead::Complete(ArchiveRecord::from_parts(
            name,
            type_name,
            flags,
            compressed_size,
            decompressed_size,
            bytes,
        )))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Conditions that dropped records while parsing.
    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True if any record was lost to truncation.
    pub fn is_truncated(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Truncated { .. }))
    }

    /// Record names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &ArchiveRecord> {
        self.records.values()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Borrow a record.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ArchiveRecord> {
        self.records.get(name)
    }

    /// Borrow a record or fail with [`Error::RecordNotFound`].
    pub fn require(&self, name: &str) -> Result<&ArchiveRecord> {
        self.get(name).ok_or_else(|| Error::RecordNotFound(name.to_string()))
    }

    /// Remove a record and hand it to the caller.
    pub fn extract(&mut self, name: &str) -> Option<ArchiveRecord> {
        let record = self.records.remove(name)?;
        self.signatures.remove(name);
        Some(record)
    }

    /// Rename a record.
    ///
    /// The signature table entry and a companion `old.sig` record follow the
    /// rename. An existing record called `new` is replaced. Returns `false`
    /// if `old` does not exist.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return self.contains(old);
        }
        if !self.rename_one(old, new) {
            return false;
        }
        if !is_signature_name(old) {
            let old_sig = signature_name(old);
            if self.contains(&old_sig) {
                self.rename_one(&old_sig, &signature_name(new));
            }
        }
        tracing::debug!(old, new, "record renamed");
        true
    }

    fn rename_one(&mut self, old: &str, new: &str) -> bool {
        let Some(mut record) = self.records.remove(old) else {
            return false;
        };
        record.set_name(new.to_string());
        self.records.insert(new.to_string(), record);
        self.signatures.remove(new);
        if let Some(status) = self.signatures.remove(old) {
            self.signatures.insert(new.to_string(), status);
        }
        true
    }

    /// Names of records whose type starts with `prefix`, e.g. `"image/"`.
    pub fn list_by_type_prefix(&self, prefix: &str) -> Vec<String> {
        self.records
            .values()
            .filter(|r| r.type_name().starts_with(prefix))
            .map(|r| r.name().to_string())
            .collect()
    }

    /// Last signature result for `name`, if it was checked.
    #[inline]
    pub fn signature_status(&self, name: &str) -> Option<SignatureStatus> {
        self.signatures.get(name).copied()
    }

    /// Check one record against its `.sig` companion.
    ///
    /// A failed check is logged and remembered; the record stays usable.
    pub fn verify(&mut self, name: &str, verifier: &SignatureVerifier) -> Result<SignatureStatus> {
        let record = self.require(name)?;
        let status = verifier.verify(record, self.get(&signature_name(name)));
        if !status.is_verified() {
            tracing::warn!(record = name, status = status.name(), "signature check failed, using record anyway");
        }
        self.signatures.insert(name.to_string(), status);
        Ok(status)
    }

    /// Get a record only if its signature verifies.
    ///
    /// The strict counterpart of [`get`](Self::get) + [`verify`](Self::verify)
    /// for callers that refuse unsigned content.
    pub fn require_verified(&mut self, name: &str, verifier: &SignatureVerifier) -> Result<&ArchiveRecord> {
        match self.verify(name, verifier)? {
            SignatureStatus::Verified => self.require(name),
            SignatureStatus::Mismatch => Err(Error::SignatureMismatch(name.to_string())),
            status => Err(Error::InvalidSignatureRecord {
                name: name.to_string(),
                reason: format!("signature {}", status.name()),
            }),
        }
    }

    /// Check every non-signature record in parallel.
    ///
    /// Returns the number of records that did not verify.
    pub fn verify_all(&mut self, verifier: &SignatureVerifier) -> usize {
        let results: Vec<(String, SignatureStatus)> = self
            .records
            .par_iter()
            .filter(|(name, _)| !is_signature_name(name))
            .map(|(name, record)| {
                let status = verifier.verify(record, self.records.get(&signature_name(name)));
                (name.clone(), status)
            })
            .collect();

        let mut failures = 0;
        for (name, status) in results {
            if !status.is_verified() {
                tracing::warn!(record = %name, status = status.name(), "signature check failed, using record anyway");
                failures += 1;
            }
            self.signatures.insert(name, status);
        }
        failures
    }
}
