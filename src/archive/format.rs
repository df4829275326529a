//! Archive format constants.

/// Flag bit: record bytes are dictionary-compressed.
pub const FLAG_COMPRESSED: u32 = 1 << 0;

/// Size of the three u32 fields following the name and type strings.
pub const RECORD_FIELDS_SIZE: usize = 12;

/// Suffix of the companion record holding a record's signature.
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Public exponent of the signature check.
pub const SIGNATURE_EXPONENT: u64 = 65537;

/// Seed of the rolling content hash.
pub const HASH_SEED: u32 = 5381;

/// First dictionary code after the 256 literal codes.
pub const FIRST_DICT_CODE: usize = 256;

/// Dictionary size at which codes wrap back to [`FIRST_DICT_CODE`].
pub const DICT_CAPACITY: usize = 4096;

/// Embedded public modulus (128 bytes, big-endian).
pub const DEFAULT_PUBLIC_MODULUS: [u8; 128] = [
    0xfe, 0xa5, 0x35, 0x4f, 0xef, 0x87, 0xe9, 0x52, 0xd5, 0x0a, 0xf0, 0xe4, 0xa6, 0x35, 0xa0, 0x5b,
    0x10, 0xfd, 0x02, 0xc4, 0x2e, 0x05, 0xb4, 0xaa, 0x65, 0x0c, 0x1b, 0x4d, 0xb1, 0xab, 0x34, 0xed,
    0xee, 0xe4, 0x75, 0x6c, 0xb8, 0x9b, 0xc6, 0x20, 0xf7, 0x39, 0xe8, 0xf8, 0x6e, 0xfb, 0xb3, 0x9f,
    0x71, 0x52, 0xc5, 0x56, 0xb2, 0xfd, 0xde, 0x84, 0xeb, 0x1a, 0x74, 0xa5, 0x23, 0x73, 0x4b, 0xc4,
    0xfb, 0xfc, 0x06, 0x0d, 0x46, 0xac, 0xfc, 0x39, 0xf8, 0x82, 0x61, 0x5d, 0x47, 0xd0, 0x79, 0xbd,
    0x57, 0x78, 0x79, 0x47, 0x9a, 0x07, 0xe9, 0x82, 0x1c, 0x62, 0xea, 0x78, 0xfd, 0x40, 0x9f, 0x8b,
    0xe3, 0xe0, 0x6c, 0xee, 0x83, 0x24, 0xd5, 0xec, 0x6b, 0x71, 0xed, 0x68, 0x63, 0x6f, 0x27, 0xe1,
    0xc1, 0xfa, 0x72, 0x9d, 0xc8, 0xa7, 0x89, 0x27, 0x9c, 0x6d, 0x3d, 0x07, 0x8e, 0xc6, 0x19, 0x19,
];

/// Check the compressed flag.
#[inline]
pub const fn is_compressed(flags: u32) -> bool {
    flags & FLAG_COMPRESSED != 0
}

/// Name of the signature record for `name`.
#[inline]
pub fn signature_name(name: &str) -> String {
    format!("{}{}", name, SIGNATURE_SUFFIX)
}

/// True if `name` is itself a signature record.
#[inline]
pub fn is_signature_name(name: &str) -> bool {
    name.ends_with(SIGNATURE_SUFFIX)
}
