// RSA Errors
// Every failure the padding, digest and key layers can report

use thiserror::Error;

/// Errors that can occur in digest, padding and key operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Label or message exceeds the padding capacity of the modulus, or a
    /// digest length is zero or beyond the native output
    #[error("invalid {what} length: {len} bytes, at most {max} allowed")]
    Length {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// The modulus leaves no room for lHash, seed and separator
    #[error("modulus of {k} bytes is too small for padding, need at least {min}")]
    ModulusTooSmall { k: usize, min: usize },

    #[error("mask too long: {requested} bytes requested, at most {max} allowed")]
    MaskTooLong { requested: u128, max: u128 },

    #[error("key length {bits} is below the minimum of {min} bits")]
    InvalidKeyLength { bits: u64, min: u64 },

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("separator must not be empty")]
    InvalidSeparator,

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Result type for RSA operations
pub type Result<T> = std::result::Result<T, Error>;
