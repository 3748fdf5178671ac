//! RSA with OAEP padding, built from big-integer arithmetic and pluggable
//! SHA-2 digests.
//!
//! ```no_run
//! use rsa_oaep::rsa::{KeyGenerator, RsaConfig, MIN_KEY_LENGTH};
//!
//! let mut generator = KeyGenerator::from_entropy(RsaConfig::default())?;
//! let keypair = generator.generate(MIN_KEY_LENGTH)?;
//!
//! let c = keypair.public_key().encode(b"Hello World!")?;
//! assert_eq!(keypair.private_key().decode(&c)?, b"Hello World!");
//! # Ok::<(), rsa_oaep::rsa::Error>(())
//! ```

pub mod rsa;
