// RSA Module - Main module file
// Exports digests, OAEP padding, key generation and key operations

pub mod bigint;
pub mod config;
pub mod decrypt;
pub mod digest;
pub mod encrypt;
pub mod error;
pub mod keygen;
pub mod padding;

pub use config::{RsaConfig, DEFAULT_PUBLIC_EXPONENT, MIN_KEY_LENGTH};
pub use digest::{hash, Digest, HashAlgorithm};
pub use error::{Error, Result};
pub use keygen::{KeyGenerator, Keypair, PrivateKey, PublicKey};
pub use padding::{mgf1, Oaep};
