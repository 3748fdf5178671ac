// RSA Configuration
// Parameters shared by key generation and the OAEP codec

use super::digest::{Digest, HashAlgorithm};
use super::error::Result;

/// Smallest modulus size accepted by key generation, in bits
pub const MIN_KEY_LENGTH: u64 = 2048;

/// Default public exponent (F4)
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65537;

/// Configuration for key generation and padding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaConfig {
    pub public_exponent: u64,
    pub algorithm: HashAlgorithm,
    /// Digest length used as `hLen`, at most the algorithm's native size
    pub hash_len: usize,
    pub separator: Vec<u8>,
    /// Miller-Rabin rounds per prime candidate
    pub prime_rounds: usize,
    /// Attempts with fresh primes before generation gives up
    pub max_attempts: usize,
}

impl Default for RsaConfig {
    fn default() -> Self {
        let algorithm = HashAlgorithm::default();
        Self {
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            algorithm,
            hash_len: algorithm.output_len(),
            separator: vec![0x01],
            prime_rounds: 40,
            max_attempts: 8,
        }
    }
}

impl RsaConfig {
    pub fn with_public_exponent(mut self, e: u64) -> Self {
        self.public_exponent = e;
        self
    }

    /// Switch algorithm; `hash_len` follows to the native output length
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self.hash_len = algorithm.output_len();
        self
    }

    pub fn with_hash_len(mut self, len: usize) -> Self {
        self.hash_len = len;
        self
    }

    pub fn with_separator(mut self, separator: &[u8]) -> Self {
        self.separator = separator.to_vec();
        self
    }

    pub fn with_prime_rounds(mut self, rounds: usize) -> Self {
        self.prime_rounds = rounds;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Digest configured by `algorithm` and `hash_len`
    pub fn digest(&self) -> Result<Digest> {
        Digest::new(self.algorithm, self.hash_len)
    }
}
