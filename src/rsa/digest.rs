// Message Digests
// Named hash functions with output truncated to a requested length

use std::fmt;
use std::str::FromStr;

use sha2::Digest as _;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};

use super::error::{Error, Result};

/// Hash functions available to the padding and signature layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
}

impl HashAlgorithm {
    /// Parse an algorithm identifier such as `SHA-512`, `sha256` or `SHA-512/256`
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "SHA224" => Ok(Self::Sha224),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            "SHA512/224" => Ok(Self::Sha512_224),
            "SHA512/256" => Ok(Self::Sha512_256),
            _ => Err(Error::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Canonical identifier
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha512_224 => "SHA-512/224",
            Self::Sha512_256 => "SHA-512/256",
        }
    }

    /// Native digest size in bytes
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha224 | Self::Sha512_224 => 28,
            Self::Sha256 | Self::Sha512_256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Full native digest of `data`
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
            Self::Sha512_224 => Sha512_224::digest(data).to_vec(),
            Self::Sha512_256 => Sha512_256::digest(data).to_vec(),
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha512
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Hash `data` with `algorithm` and keep the first `out_len` bytes.
///
/// Fails when `out_len` is zero or exceeds the native digest size; the digest
/// is only ever truncated, never extended.
pub fn hash(data: &[u8], algorithm: HashAlgorithm, out_len: usize) -> Result<Vec<u8>> {
    let digest = Digest::new(algorithm, out_len)?;
    Ok(digest.hash(data))
}

/// A hash algorithm bound to a fixed output length (`hLen`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digest {
    algorithm: HashAlgorithm,
    len: usize,
}

impl Digest {
    pub fn new(algorithm: HashAlgorithm, len: usize) -> Result<Self> {
        let native = algorithm.output_len();
        if len == 0 || len > native {
            return Err(Error::Length {
                what: "digest",
                len,
                max: native,
            });
        }
        Ok(Self { algorithm, len })
    }

    /// Digest using the algorithm's full output length
    pub fn native(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            len: algorithm.output_len(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Output length in bytes (`hLen`)
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        let mut out = self.algorithm.digest(data);
        out.truncate(self.len);
        out
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::native(HashAlgorithm::default())
    }
}
