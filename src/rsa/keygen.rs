// RSA Key Generation
// Implements RSA key pair generation with post-generation self-checks

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use num_traits::One;
use rand::rngs::StdRng;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};

use super::bigint::{
    byte_length, from_u64, gcd, is_probable_prime, lcm, mod_inverse, random_prime, RsaBigInt,
};
use super::config::{RsaConfig, MIN_KEY_LENGTH};
use super::error::{Error, Result};
use super::padding::Oaep;

/// RSA Public Key
#[derive(Debug, Clone)]
pub struct PublicKey {
    pub(super) n: RsaBigInt,
    pub(super) e: RsaBigInt,
    pub(super) k: usize,
    pub(super) oaep: Arc<Oaep>,
}

/// RSA Private Key
#[derive(Debug, Clone)]
pub struct PrivateKey {
    pub(super) n: RsaBigInt,
    pub(super) e: RsaBigInt,
    pub(super) d: RsaBigInt,
    pub(super) p: RsaBigInt,
    pub(super) q: RsaBigInt,
    // Pre-computed values for faster decryption
    pub(super) d_p: RsaBigInt,
    pub(super) d_q: RsaBigInt,
    pub(super) q_inv: RsaBigInt,
    pub(super) k: usize,
    pub(super) oaep: Arc<Oaep>,
}

/// RSA Key Pair, from which the public and private views are derived
#[derive(Debug, Clone)]
pub struct Keypair {
    n: RsaBigInt,
    e: RsaBigInt,
    d: RsaBigInt,
    p: RsaBigInt,
    q: RsaBigInt,
    d_p: RsaBigInt,
    d_q: RsaBigInt,
    q_inv: RsaBigInt,
    oaep: Arc<Oaep>,
}

impl PublicKey {
    /// Modulus
    pub fn n(&self) -> &RsaBigInt {
        &self.n
    }

    /// Public exponent
    pub fn e(&self) -> &RsaBigInt {
        &self.e
    }

    /// Modulus length in bytes
    pub fn key_len(&self) -> usize {
        self.k
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    pub fn oaep(&self) -> &Oaep {
        &self.oaep
    }
}

impl PrivateKey {
    pub fn n(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn e(&self) -> &RsaBigInt {
        &self.e
    }

    pub fn d(&self) -> &RsaBigInt {
        &self.d
    }

    pub fn p(&self) -> &RsaBigInt {
        &self.p
    }

    pub fn q(&self) -> &RsaBigInt {
        &self.q
    }

    /// d mod (p-1)
    pub fn d_p(&self) -> &RsaBigInt {
        &self.d_p
    }

    /// d mod (q-1)
    pub fn d_q(&self) -> &RsaBigInt {
        &self.d_q
    }

    /// q^(-1) mod p
    pub fn q_inv(&self) -> &RsaBigInt {
        &self.q_inv
    }

    pub fn key_len(&self) -> usize {
        self.k
    }

    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    pub fn oaep(&self) -> &Oaep {
        &self.oaep
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
            k: self.k,
            oaep: Arc::clone(&self.oaep),
        }
    }
}

impl Keypair {
    /// Build a keypair from two caller-supplied primes.
    ///
    /// Runs the same self-checks as generation but applies no key-length
    /// floor, so small textbook keys can exercise the raw operations.
    /// `rng` drives the Miller-Rabin witnesses.
    pub fn from_primes<R: RngCore + CryptoRng + ?Sized>(
        p: RsaBigInt,
        q: RsaBigInt,
        config: &RsaConfig,
        oaep: Arc<Oaep>,
        rng: &mut R,
    ) -> Result<Self> {
        for (name, prime) in [("p", &p), ("q", &q)] {
            if !is_probable_prime(prime, config.prime_rounds, rng) {
                return Err(Error::KeyGeneration(format!("{} is not prime", name)));
            }
        }
        Self::assemble(p, q, &from_u64(config.public_exponent), oaep)
    }

    /// Derive exponents and CRT parameters, then run the self-checks.
    /// Nothing is returned unless every check passes.
    fn assemble(p: RsaBigInt, q: RsaBigInt, e: &RsaBigInt, oaep: Arc<Oaep>) -> Result<Self> {
        let fail = |reason: &str| Error::KeyGeneration(reason.to_string());
        let one = RsaBigInt::one();

        if p == q {
            return Err(fail("p and q are equal"));
        }

        // Step 1: Compute n = p * q
        let n = &p * &q;

        // Step 2: Compute φ(n) = (p-1)(q-1)
        let p_minus_1 = &p - 1u8;
        let q_minus_1 = &q - 1u8;
        let phi = &p_minus_1 * &q_minus_1;
        let phi_of_n = &phi % &n;

        // Step 3: Self-checks on e and d = e^(-1) mod φ(n)
        if gcd(&phi, e) != one {
            return Err(fail("gcd(phi, e) != 1"));
        }
        if *e <= one {
            return Err(fail("e must be greater than 1"));
        }
        if *e >= phi_of_n {
            return Err(fail("e must be less than phi mod n"));
        }
        let d = mod_inverse(e, &phi).ok_or_else(|| fail("e has no inverse modulo phi"))?;
        if (&d * e) % &phi_of_n != one {
            return Err(fail("d * e mod phi != 1"));
        }
        if (&d * e) % lcm(&p_minus_1, &q_minus_1) != one {
            return Err(fail("d * e mod lambda != 1"));
        }
        if gcd(e, &phi_of_n) != one {
            return Err(fail("gcd(e, phi mod n) != 1"));
        }

        // Step 4: Compute CRT parameters for faster decryption
        let d_p = &d % &p_minus_1;
        let d_q = &d % &q_minus_1;
        let q_inv = mod_inverse(&q, &p).ok_or_else(|| fail("q has no inverse modulo p"))?;

        let keypair = Keypair {
            n,
            e: e.clone(),
            d,
            p,
            q,
            d_p,
            d_q,
            q_inv,
            oaep,
        };
        keypair.check_crt()?;

        Ok(keypair)
    }

    /// Probe that CRT decoding agrees with the plain private exponent and
    /// that the public exponent inverts it.
    fn check_crt(&self) -> Result<()> {
        let public_key = self.public_key();
        let private_key = self.private_key();

        let probes = [from_u64(2), &self.n / 3u8 + 1u8, &self.n - 2u8];
        for c in probes.iter() {
            let raw = private_key.decode_raw(c);
            if private_key.decode_crt(c) != raw {
                return Err(Error::KeyGeneration("CRT decoding disagrees with d".to_string()));
            }
            if public_key.encode_raw(&raw) != *c {
                return Err(Error::KeyGeneration("e does not invert d".to_string()));
            }
        }
        Ok(())
    }

    /// Get public key (n, e)
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
            k: byte_length(&self.n),
            oaep: Arc::clone(&self.oaep),
        }
    }

    /// Get private key (n, e, d, p, q, dp, dq, qinv)
    pub fn private_key(&self) -> PrivateKey {
        PrivateKey {
            n: self.n.clone(),
            e: self.e.clone(),
            d: self.d.clone(),
            p: self.p.clone(),
            q: self.q.clone(),
            d_p: self.d_p.clone(),
            d_q: self.d_q.clone(),
            q_inv: self.q_inv.clone(),
            k: byte_length(&self.n),
            oaep: Arc::clone(&self.oaep),
        }
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    pub fn oaep(&self) -> &Oaep {
        &self.oaep
    }
}

/// Keypair generator owning its random source and the codec handed to
/// every keypair it produces
pub struct KeyGenerator {
    rng: Box<dyn RngCore + Send>,
    config: RsaConfig,
    oaep: Arc<Oaep>,
}

impl fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerator")
            .field("config", &self.config)
            .field("oaep", &self.oaep)
            .finish_non_exhaustive()
    }
}

impl KeyGenerator {
    /// The codec's random source is seeded from `rng`, so a seeded `rng`
    /// makes both keys and padding reproducible.
    pub fn new<R>(mut rng: R, config: RsaConfig) -> Result<Self>
    where
        R: RngCore + CryptoRng + Send + 'static,
    {
        let codec_rng = StdRng::from_rng(&mut rng)
            .map_err(|e| Error::KeyGeneration(format!("seeding codec: {}", e)))?;
        let oaep = Oaep::from_config(codec_rng, &config)?;
        Ok(Self::with_codec(rng, config, Arc::new(oaep)))
    }

    pub fn with_codec<R>(rng: R, config: RsaConfig, oaep: Arc<Oaep>) -> Self
    where
        R: RngCore + CryptoRng + Send + 'static,
    {
        Self {
            rng: Box::new(rng),
            config,
            oaep,
        }
    }

    /// Generator seeded from operating system entropy
    pub fn from_entropy(config: RsaConfig) -> Result<Self> {
        Self::new(StdRng::from_entropy(), config)
    }

    pub fn config(&self) -> &RsaConfig {
        &self.config
    }

    /// Generate a keypair of at least `bit_length` bits, retrying with fresh
    /// primes when a self-check fails
    pub fn generate(&mut self, bit_length: u64) -> Result<Keypair> {
        let attempts = self.config.max_attempts.max(1);
        let mut last = Error::KeyGeneration("no attempt made".to_string());

        for attempt in 1..=attempts {
            match self.try_generate(bit_length) {
                Ok(keypair) => return Ok(keypair),
                Err(Error::KeyGeneration(reason)) => {
                    warn!(
                        "key generation attempt {}/{} failed: {}",
                        attempt, attempts, reason
                    );
                    last = Error::KeyGeneration(reason);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last)
    }

    /// A single generation attempt
    pub fn try_generate(&mut self, bit_length: u64) -> Result<Keypair> {
        if bit_length < MIN_KEY_LENGTH {
            return Err(Error::InvalidKeyLength {
                bits: bit_length,
                min: MIN_KEY_LENGTH,
            });
        }

        // p deliberately gets 2 + jitter more bits than q
        let half = bit_length / 2;
        let jitter: u64 = self.rng.gen_range(0..64);
        let (p_bits, q_bits) = (half + 2 + jitter, half);
        debug!("generating primes of {} and {} bits", p_bits, q_bits);

        let rounds = self.config.prime_rounds;
        let p = random_prime(p_bits, rounds, &mut *self.rng);
        let q = random_prime(q_bits, rounds, &mut *self.rng);

        let e = from_u64(self.config.public_exponent);
        let keypair = Keypair::assemble(p, q, &e, Arc::clone(&self.oaep))?;
        debug!("generated {}-bit modulus", keypair.bit_length());
        Ok(keypair)
    }
}

/// 2048-bit keypair shared by the tests in this crate
#[cfg(test)]
pub(crate) fn test_keypair() -> &'static Keypair {
    use rand_chacha::ChaCha20Rng;
    use std::sync::OnceLock;

    static KEYPAIR: OnceLock<Keypair> = OnceLock::new();
    KEYPAIR.get_or_init(|| {
        let rng = ChaCha20Rng::seed_from_u64(2048);
        let mut generator = KeyGenerator::new(rng, RsaConfig::default()).unwrap();
        generator.generate(MIN_KEY_LENGTH).unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::digest::HashAlgorithm;
    use rand_chacha::ChaCha20Rng;

    fn small_config() -> RsaConfig {
        RsaConfig::default()
            .with_algorithm(HashAlgorithm::Sha256)
            .with_public_exponent(17)
    }

    fn small_codec(config: &RsaConfig) -> Arc<Oaep> {
        Arc::new(Oaep::from_config(ChaCha20Rng::seed_from_u64(3), config).unwrap())
    }

    fn textbook(config: &RsaConfig, p: u64, q: u64) -> Result<Keypair> {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let codec = small_codec(config);
        Keypair::from_primes(from_u64(p), from_u64(q), config, codec, &mut rng)
    }

    #[test]
    fn test_key_generation() {
        let keypair = test_keypair();
        assert!(keypair.bit_length() >= MIN_KEY_LENGTH);

        let public_key = keypair.public_key();
        let private_key = keypair.private_key();
        assert_eq!(public_key.n(), private_key.n());
        assert_eq!(public_key.e(), &from_u64(65537));
        assert_eq!(public_key.key_len(), byte_length(public_key.n()));
    }

    #[test]
    fn test_key_properties() {
        let key = test_keypair().private_key();
        let one = from_u64(1);

        // Verify n = p * q
        assert_eq!(key.n(), &(key.p() * key.q()));

        // Verify e * d ≡ 1 (mod φ(n)), and so also mod λ(n)
        let p_minus_1 = key.p() - 1u8;
        let q_minus_1 = key.q() - 1u8;
        let phi = &p_minus_1 * &q_minus_1;
        assert_eq!((key.e() * key.d()) % &phi, one);
        assert_eq!((key.e() * key.d()) % lcm(&p_minus_1, &q_minus_1), one);

        // CRT parameters
        assert_eq!(key.d_p(), &(key.d() % &p_minus_1));
        assert_eq!(key.d_q(), &(key.d() % &q_minus_1));
        assert_eq!((key.q_inv() * key.q()) % key.p(), one);
    }

    #[test]
    fn test_asymmetric_prime_lengths() {
        let key = test_keypair().private_key();
        let q_bits = key.q().bits();
        let p_bits = key.p().bits();
        assert_eq!(q_bits, MIN_KEY_LENGTH / 2);
        assert!(p_bits >= q_bits + 2 && p_bits < q_bits + 2 + 64);
    }

    #[test]
    fn test_key_length_floor() {
        let rng = ChaCha20Rng::seed_from_u64(1);
        let mut generator = KeyGenerator::new(rng, RsaConfig::default()).unwrap();
        assert_eq!(
            generator.generate(2047).unwrap_err(),
            Error::InvalidKeyLength {
                bits: 2047,
                min: 2048
            }
        );
        assert!(generator.try_generate(512).is_err());
    }

    #[test]
    fn test_generate_gives_up_after_max_attempts() {
        let config = RsaConfig::default()
            .with_public_exponent(1)
            .with_max_attempts(2)
            .with_prime_rounds(8);
        let mut generator = KeyGenerator::new(ChaCha20Rng::seed_from_u64(7), config).unwrap();
        assert_eq!(
            generator.generate(2048).unwrap_err(),
            Error::KeyGeneration("e must be greater than 1".to_string())
        );
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = RsaConfig::default().with_prime_rounds(8);
        let mut a = KeyGenerator::new(ChaCha20Rng::seed_from_u64(9), config.clone()).unwrap();
        let mut b = KeyGenerator::new(ChaCha20Rng::seed_from_u64(9), config).unwrap();
        assert_eq!(
            a.generate(2048).unwrap().public_key().n(),
            b.generate(2048).unwrap().public_key().n()
        );
    }

    #[test]
    fn test_from_primes_textbook() {
        let keypair = textbook(&small_config(), 61, 53).unwrap();
        let key = keypair.private_key();
        assert_eq!(key.n(), &from_u64(3233));
        assert_eq!(key.d(), &from_u64(2753));
        assert_eq!(key.d_p(), &from_u64(53));
        assert_eq!(key.d_q(), &from_u64(49));
        assert_eq!(key.q_inv(), &from_u64(38));
    }

    #[test]
    fn test_from_primes_self_checks() {
        let config = small_config();

        // Not prime
        assert!(matches!(textbook(&config, 62, 53), Err(Error::KeyGeneration(_))));

        // Equal primes
        assert_eq!(
            textbook(&config, 61, 61).unwrap_err(),
            Error::KeyGeneration("p and q are equal".to_string())
        );

        // e = 3 divides (p-1)(q-1) = 60 * 52
        let config = config.with_public_exponent(3);
        assert_eq!(
            textbook(&config, 61, 53).unwrap_err(),
            Error::KeyGeneration("gcd(phi, e) != 1".to_string())
        );

        // e = 1 has an inverse but is rejected
        let config = config.with_public_exponent(1);
        assert_eq!(
            textbook(&config, 61, 53).unwrap_err(),
            Error::KeyGeneration("e must be greater than 1".to_string())
        );
    }

    #[test]
    fn test_from_primes_rejects_carmichael() {
        // 561 = 3 * 11 * 17 passes the Fermat test for every coprime base
        let config = small_config();
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let result = Keypair::from_primes(
            from_u64(53),
            from_u64(561),
            &config,
            small_codec(&config),
            &mut rng,
        );
        assert_eq!(result.unwrap_err(), Error::KeyGeneration("q is not prime".to_string()));
    }

    #[test]
    fn test_e_larger_than_phi() {
        let config = small_config().with_public_exponent(65537);
        assert_eq!(
            textbook(&config, 61, 53).unwrap_err(),
            Error::KeyGeneration("e must be less than phi mod n".to_string())
        );
    }
}
