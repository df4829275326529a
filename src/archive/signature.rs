//! Record signature verification.
//!
//! Each signed record `name` has a companion record `name.sig` holding a JSON
//! array whose single element is the big-endian byte string of the
//! signature. The record is authentic when
//! `signature ^ 65537 mod modulus` equals the 32-bit rolling hash of its bytes.
//! Archives are advisory-signed: a failed check is reported, never fatal.

use bigint16::BigInt;
use serde::Serialize;

use super::format::{DEFAULT_PUBLIC_MODULUS, HASH_SEED, SIGNATURE_EXPONENT};
use super::record::ArchiveRecord;
use crate::util::{Error, Result};

/// Rolling content hash `h = 33 * h + byte`, seeded with 5381, 32-bit wrap.
#[inline]
pub fn rolling_hash(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(HASH_SEED, |h, &b| h.wrapping_mul(33).wrapping_add(b as u32))
}

/// Outcome of a signature check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    /// Signature matches the content hash
    Verified,
    /// Signature present but does not match
    Mismatch,
    /// No companion `.sig` record
    Missing,
    /// Companion record is not a valid signature
    Malformed,
}

impl SignatureStatus {
    #[inline]
    pub fn is_verified(self) -> bool {
        self == Self::Verified
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Mismatch => "mismatch",
            Self::Missing => "missing",
            Self::Malformed => "malformed",
        }
    }
}

/// Checks record signatures against a public modulus.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    modulus: BigInt,
    exponent: BigInt,
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new(&DEFAULT_PUBLIC_MODULUS)
    }
}

impl SignatureVerifier {
    /// Create a verifier for a big-endian modulus.
    pub fn new(modulus_be: &[u8]) -> Self {
        Self {
            modulus: BigInt::from_bytes(modulus_be, true),
            exponent: BigInt::from_u64(SIGNATURE_EXPONENT),
        }
    }

    #[inline]
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// Parse the payload of a `.sig` record.
    pub fn parse_signature(name: &str, payload: &[u8]) -> Result<BigInt> {
        let invalid = |reason: String| Error::InvalidSignatureRecord { name: name.to_string(), reason };
        let parts: Vec<Vec<u8>> = serde_json::from_slice(payload).map_err(|e| invalid(e.to_string()))?;
        match parts.first() {
            Some(bytes) if !bytes.is_empty() => Ok(BigInt::from_bytes(bytes, true)),
            _ => Err(invalid("empty signature array".to_string())),
        }
    }

    /// True if `signature` authenticates `content`.
    pub fn check(&self, content: &[u8], signature: &BigInt) -> bool {
        let expected = rolling_hash(content);
        signature.pow_mod(&self.exponent, &self.modulus).to_u32() == expected
    }

    /// Check `record` against its companion signature record.
    pub fn verify(&self, record: &ArchiveRecord, signature: Option<&ArchiveRecord>) -> SignatureStatus {
        let Some(sig) = signature else {
            return SignatureStatus::Missing;
        };
        match Self::parse_signature(record.name(), sig.bytes()) {
            Ok(value) if self.check(record.bytes(), &value) => SignatureStatus::Verified,
            Ok(_) => SignatureStatus::Mismatch,
            Err(e) => {
                tracing::debug!(record = record.name(), error = %e, "unreadable signature record");
                SignatureStatus::Malformed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Signature of `b"hello world"` under the default modulus.
    pub(crate) const HELLO_WORLD_SIG: [u8; 128] = [
        162, 62, 140, 132, 5, 161, 200, 193, 121, 14, 147, 122, 129, 14, 183, 54, 24, 41, 97, 10,
        227, 72, 86, 215, 112, 201, 148, 110, 162, 96, 235, 241, 14, 19, 254, 186, 118, 153, 100,
        137, 124, 148, 185, 206, 3, 225, 220, 35, 180, 150, 224, 238, 246, 185, 249, 112, 182, 229,
        49, 68, 248, 178, 150, 176, 134, 126, 210, 60, 14, 231, 56, 50, 14, 238, 194, 208, 236, 31,
        37, 78, 93, 154, 84, 7, 136, 222, 118, 162, 150, 239, 50, 212, 50, 40, 21, 245, 96, 214, 31,
        179, 82, 67, 60, 210, 255, 179, 57, 137, 238, 178, 72, 107, 243, 97, 139, 226, 97, 195, 155,
        139, 53, 50, 111, 61, 25, 45, 137, 33,
    ];

    /// Signature of `b"scene payload"` under the default modulus.
    pub(crate) const SCENE_PAYLOAD_SIG: [u8; 128] = [
        249, 17, 222, 29, 201, 87, 2, 7, 19, 236, 75, 5, 134, 22, 208, 85, 234, 210, 77, 33, 186,
        13, 83, 124, 56, 98, 143, 145, 11, 118, 135, 197, 124, 185, 240, 19, 76, 130, 129, 162, 95,
        188, 162, 188, 49, 209, 133, 9, 163, 207, 158, 71, 93, 181, 113, 154, 66, 250, 220, 112,
        55, 124, 25, 231, 99, 166, 230, 155, 219, 103, 182, 249, 60, 20, 187, 42, 202, 9, 81, 178,
        232, 132, 103, 151, 231, 105, 242, 165, 132, 85, 128, 70, 67, 247, 11, 23, 223, 114, 81,
        58, 20, 13, 148, 250, 73, 67, 187, 8, 190, 184, 222, 171, 52, 106, 187, 224, 28, 189, 64,
        123, 6, 130, 102, 206, 125, 95, 228, 53,
    ];

    pub(crate) fn sig_json(bytes: &[u8]) -> Vec<u8> {
        serde_json::to_vec(&vec![bytes.to_vec()]).unwrap()
    }

    #[test]
    fn test_rolling_hash() {
        assert_eq!(rolling_hash(b""), 5381);
        assert_eq!(rolling_hash(b"a"), 5381 * 33 + 97);
        assert_eq!(rolling_hash(b"hello world"), 0x3551_c8c1);
        assert_eq!(rolling_hash(b"scene payload"), 0x72c4_735d);
    }

    #[test]
    fn test_known_rsa_triple() {
        let verifier = SignatureVerifier::default();
        let sig = BigInt::from_bytes(&HELLO_WORLD_SIG, true);
        let m = verifier.modulus();
        let e = BigInt::from_u64(SIGNATURE_EXPONENT);
        assert_eq!(sig.rem(m).pow_mod(&e, m).to_u32(), 0x3551_c8c1);
        assert!(verifier.check(b"hello world", &sig));
        assert!(!verifier.check(b"hello worle", &sig));
    }

    #[test]
    fn test_verify_record() {
        let verifier = SignatureVerifier::default();
        let record = ArchiveRecord::new("scene", "application/json", b"scene payload".to_vec());
        let good = ArchiveRecord::new("scene.sig", "application/json", sig_json(&SCENE_PAYLOAD_SIG));
        let wrong = ArchiveRecord::new("scene.sig", "application/json", sig_json(&HELLO_WORLD_SIG));
        let broken = ArchiveRecord::new("scene.sig", "application/json", b"{not json".to_vec());

        assert_eq!(verifier.verify(&record, Some(&good)), SignatureStatus::Verified);
        assert_eq!(verifier.verify(&record, Some(&wrong)), SignatureStatus::Mismatch);
        assert_eq!(verifier.verify(&record, Some(&broken)), SignatureStatus::Malformed);
        assert_eq!(verifier.verify(&record, None), SignatureStatus::Missing);
    }

    #[test]
    fn test_parse_signature_rejects_empty() {
        assert!(SignatureVerifier::parse_signature("x", b"[]").is_err());
        assert!(SignatureVerifier::parse_signature("x", b"[[]]").is_err());
        assert!(SignatureVerifier::parse_signature("x", b"[[1, 300]]").is_err());
        let v = SignatureVerifier::parse_signature("x", b"[[1, 2]]").unwrap();
        assert_eq!(v.to_u32(), 0x0102);
    }
}
