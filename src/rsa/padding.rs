// OAEP Padding
// EME-OAEP encoding with an MGF1 mask generator
//
// EM = 0x00 || maskedSeed || maskedDB
// DB = lHash || PS (zero bytes) || separator || M

use std::fmt;
use std::sync::{Mutex, PoisonError};

use log::trace;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};

use super::config::RsaConfig;
use super::digest::Digest;
use super::error::{Error, Result};

/// MGF1 mask generation.
///
/// Block `i` is `Hash(seed || BigEndian32(i))`; blocks are concatenated in
/// counter order and the result is cut to `mask_len` bytes.
pub fn mgf1(seed: &[u8], mask_len: usize, digest: &Digest) -> Result<Vec<u8>> {
    let h_len = digest.size();

    // A 4-byte counter bounds the mask at 2^32 blocks
    let max = (1u128 << 32) * h_len as u128;
    if mask_len as u128 > max {
        return Err(Error::MaskTooLong {
            requested: mask_len as u128,
            max,
        });
    }

    let blocks = (mask_len + h_len - 1) / h_len;
    let mut mask = Vec::with_capacity(blocks * h_len);

    let mut input = Vec::with_capacity(seed.len() + 4);
    input.extend_from_slice(seed);
    input.extend_from_slice(&[0u8; 4]);

    for counter in 0..blocks {
        input[seed.len()..].copy_from_slice(&(counter as u32).to_be_bytes());
        mask.extend_from_slice(&digest.hash(&input));
    }

    mask.truncate(mask_len);
    Ok(mask)
}

fn xor_in_place(data: &mut [u8], mask: &[u8]) {
    data.iter_mut().zip(mask.iter()).for_each(|(a, &b)| *a ^= b);
}

/// Slice following the last occurrence of `separator`, or all of `data` if
/// it never occurs.
fn after_last_separator<'a>(data: &'a [u8], separator: &[u8]) -> &'a [u8] {
    data.windows(separator.len())
        .rposition(|w| w == separator)
        .map_or(data, |pos| &data[pos + separator.len()..])
}

/// OAEP codec.
///
/// Owns its random source behind a lock so a single codec can be shared by
/// the public and private halves of a keypair.
pub struct Oaep {
    rng: Mutex<Box<dyn RngCore + Send>>,
    separator: Vec<u8>,
    digest: Digest,
}

impl fmt::Debug for Oaep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oaep")
            .field("separator", &self.separator)
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl Oaep {
    pub fn new<R>(rng: R, digest: Digest, separator: &[u8]) -> Result<Self>
    where
        R: RngCore + CryptoRng + Send + 'static,
    {
        if separator.is_empty() {
            return Err(Error::InvalidSeparator);
        }

        Ok(Self {
            rng: Mutex::new(Box::new(rng)),
            separator: separator.to_vec(),
            digest,
        })
    }

    /// Codec using the digest and separator named by `config`
    pub fn from_config<R>(rng: R, config: &RsaConfig) -> Result<Self>
    where
        R: RngCore + CryptoRng + Send + 'static,
    {
        Self::new(rng, config.digest()?, &config.separator)
    }

    /// Codec seeded from operating system entropy
    pub fn from_entropy(config: &RsaConfig) -> Result<Self> {
        Self::from_config(StdRng::from_entropy(), config)
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// `hLen`
    pub fn hash_len(&self) -> usize {
        self.digest.size()
    }

    pub fn separator(&self) -> &[u8] {
        &self.separator
    }

    /// Largest message (and label) that fits a `k`-byte modulus
    pub fn max_message_len(&self, k: usize) -> Result<usize> {
        let min = 2 * self.hash_len() + 1 + self.separator.len();
        k.checked_sub(min).ok_or(Error::ModulusTooSmall { k, min })
    }

    fn fill_seed(&self, seed: &mut [u8]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.fill_bytes(seed);
    }

    /// Pad `message` with `label` into a `k`-byte encoded message
    pub fn pad(&self, message: &[u8], label: &[u8], k: usize) -> Result<Vec<u8>> {
        let max = self.max_message_len(k)?;
        if label.len() > max {
            return Err(Error::Length {
                what: "label",
                len: label.len(),
                max,
            });
        }
        if message.len() > max {
            return Err(Error::Length {
                what: "message",
                len: message.len(),
                max,
            });
        }

        let h_len = self.hash_len();
        let db_len = k - h_len - 1;

        let mut db = Vec::with_capacity(db_len);
        db.extend_from_slice(&self.digest.hash(label));
        db.resize(h_len + max - message.len(), 0x00);
        db.extend_from_slice(&self.separator);
        db.extend_from_slice(message);
        debug_assert_eq!(db.len(), db_len);

        let mut seed = vec![0u8; h_len];
        self.fill_seed(&mut seed);

        let db_mask = mgf1(&seed, db_len, &self.digest)?;
        xor_in_place(&mut db, &db_mask);

        let seed_mask = mgf1(&db, h_len, &self.digest)?;
        xor_in_place(&mut seed, &seed_mask);

        let mut em = Vec::with_capacity(k);
        em.push(0x00);
        em.extend_from_slice(&seed);
        em.extend_from_slice(&db);

        trace!("oaep: padded {} bytes into {} bytes", message.len(), em.len());
        Ok(em)
    }

    /// Restore the leading zeros of a short encoded message and remove both
    /// masks. The returned buffer is `0x00 || seed || DB` in layout.
    fn unmask(&self, encoded: &[u8], k: usize) -> Result<Vec<u8>> {
        self.max_message_len(k)?;
        if encoded.len() > k {
            return Err(Error::Decoding(format!(
                "encoded message is {} bytes, modulus is {}",
                encoded.len(),
                k
            )));
        }

        let mut em = vec![0u8; k - encoded.len()];
        em.extend_from_slice(encoded);

        let h_len = self.hash_len();
        let (masked_seed, masked_db) = em[1..].split_at_mut(h_len);

        let seed_mask = mgf1(masked_db, h_len, &self.digest)?;
        xor_in_place(masked_seed, &seed_mask);

        let db_mask = mgf1(masked_seed, masked_db.len(), &self.digest)?;
        xor_in_place(masked_db, &db_mask);

        Ok(em)
    }

    /// Remove padding, recovering the message as the bytes after the last
    /// separator in DB.
    ///
    /// The label hash is not compared and a message containing the separator
    /// is returned truncated; use [`Oaep::unpad_strict`] where either matters.
    pub fn unpad(&self, encoded: &[u8], _label: &[u8], k: usize) -> Result<Vec<u8>> {
        let em = self.unmask(encoded, k)?;
        let db = &em[1 + self.hash_len()..];
        let message = after_last_separator(db, &self.separator);

        trace!("oaep: unpadded {} bytes from {} bytes", message.len(), k);
        Ok(message.to_vec())
    }

    /// Remove padding and validate the leading zero byte, `lHash` and the
    /// zero run before the separator. The message is everything after the
    /// first separator, so it may itself contain separator bytes.
    pub fn unpad_strict(&self, encoded: &[u8], label: &[u8], k: usize) -> Result<Vec<u8>> {
        let em = self.unmask(encoded, k)?;
        let h_len = self.hash_len();
        let invalid = || Error::Decoding("invalid OAEP encoding".to_string());

        let l_hash = self.digest.hash(label);
        let db = &em[1 + h_len..];
        if em[0] != 0x00 || db[..h_len] != l_hash[..] {
            return Err(invalid());
        }

        let rest = &db[h_len..];
        let mut i = 0;
        loop {
            if rest[i..].starts_with(&self.separator) {
                return Ok(rest[i + self.separator.len()..].to_vec());
            }
            match rest.get(i) {
                Some(0x00) => i += 1,
                _ => return Err(invalid()),
            }
        }
    }
}
