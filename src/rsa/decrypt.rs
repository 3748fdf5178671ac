// RSA Decryption Implementation
// Private key operations with Chinese Remainder Theorem (CRT) optimization

use super::bigint::{from_bytes, mod_pow, to_bytes_padded, RsaBigInt};
use super::error::{Error, Result};
use super::keygen::PrivateKey;

impl PrivateKey {
    /// Decode the cipher without removing padding.
    /// M = C^d mod n
    pub fn decode_raw(&self, c: &RsaBigInt) -> RsaBigInt {
        mod_pow(c, &self.d, &self.n)
    }

    /// Same result as [`PrivateKey::decode_raw`], computed with two half-size
    /// exponentiations
    pub fn decode_crt(&self, c: &RsaBigInt) -> RsaBigInt {
        // m1 = c^d_p mod p
        let m1 = mod_pow(c, &self.d_p, &self.p);

        // m2 = c^d_q mod q
        let m2 = mod_pow(c, &self.d_q, &self.q);

        // h = (m1 - m2) * q_inv mod p
        let m2_mod_p = &m2 % &self.p;
        let diff = if m1 >= m2_mod_p {
            m1 - m2_mod_p
        } else {
            m1 + &self.p - m2_mod_p
        };
        let h = (diff * &self.q_inv) % &self.p;

        // m = m2 + q * h, always below n
        m2 + &self.q * h
    }

    /// Decrypt an OAEP ciphertext with an empty label
    pub fn decode(&self, c: &RsaBigInt) -> Result<Vec<u8>> {
        self.decode_with_label(c, b"")
    }

    pub fn decode_with_label(&self, c: &RsaBigInt, label: &[u8]) -> Result<Vec<u8>> {
        let em = self.encoded_message(c)?;
        self.oaep.unpad(&em, label, self.k)
    }

    /// Decrypt and validate the label hash and padding structure
    pub fn decode_strict(&self, c: &RsaBigInt, label: &[u8]) -> Result<Vec<u8>> {
        let em = self.encoded_message(c)?;
        self.oaep.unpad_strict(&em, label, self.k)
    }

    /// Fixed-width `k`-byte encoded message behind ciphertext `c`
    fn encoded_message(&self, c: &RsaBigInt) -> Result<Vec<u8>> {
        if c >= &self.n {
            return Err(Error::Decoding(
                "ciphertext representative out of range".to_string(),
            ));
        }
        to_bytes_padded(&self.decode_crt(c), self.k)
    }

    /// Decrypt a `key_len()`-byte ciphertext buffer
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() != self.k {
            return Err(Error::Decoding(format!(
                "invalid ciphertext length: expected {} bytes, got {}",
                self.k,
                ciphertext.len()
            )));
        }
        self.decode(&from_bytes(ciphertext))
    }

    fn message_digest(&self, message: &[u8]) -> RsaBigInt {
        from_bytes(&self.oaep.digest().hash(message))
    }

    /// Raw hash signature: the digest of `message`, read as an integer and
    /// raised to d. Not a standardized signature scheme and not resistant to
    /// forgery.
    pub fn sign_raw(&self, message: &[u8]) -> RsaBigInt {
        self.decode_raw(&self.message_digest(message))
    }

    pub fn sign_crt(&self, message: &[u8]) -> RsaBigInt {
        self.decode_crt(&self.message_digest(message))
    }

    pub fn sign(&self, message: &[u8]) -> RsaBigInt {
        self.sign_crt(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::rsa::bigint::{from_u64, RsaBigInt};
    use crate::rsa::config::RsaConfig;
    use crate::rsa::keygen::{test_keypair, Keypair};
    use crate::rsa::padding::Oaep;
    use num_bigint::RandBigInt;

    fn textbook_key() -> PrivateKey {
        let config = RsaConfig::default().with_public_exponent(17);
        let codec = Arc::new(Oaep::from_config(ChaCha20Rng::seed_from_u64(4), &config).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        Keypair::from_primes(from_u64(61), from_u64(53), &config, codec, &mut rng)
            .unwrap()
            .private_key()
    }

    #[test]
    fn test_textbook_values() {
        let key = textbook_key();
        let c = key.public_key().encode_raw(&from_u64(65));
        assert_eq!(c, from_u64(2790));
        assert_eq!(key.decode_raw(&c), from_u64(65));
        assert_eq!(key.decode_crt(&c), from_u64(65));
    }

    #[test]
    fn test_crt_equivalence_exhaustive_small() {
        let key = textbook_key();
        for c in 0..3233u64 {
            let c = from_u64(c);
            assert_eq!(key.decode_crt(&c), key.decode_raw(&c));
        }
    }

    #[test]
    fn test_crt_equivalence_random() {
        let key = test_keypair().private_key();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        for _ in 0..16 {
            let c = rng.gen_biguint_below(key.n());
            assert_eq!(key.decode_crt(&c), key.decode_raw(&c));
        }
        let edge = key.n() - 1u8;
        assert_eq!(key.decode_crt(&edge), key.decode_raw(&edge));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let keypair = test_keypair();
        let (public_key, private_key) = (keypair.public_key(), keypair.private_key());

        let messages: Vec<&[u8]> = vec![
            b"",
            b"A",
            b"Hello World!",
            b"Hello World! ABCDEFGHIJKLMNOPQRSTUVWXYZ abcdefghijklmnopqrstuvwxyz 0123456789",
            &[0xFF; 100],
        ];
        for message in messages {
            for _ in 0..3 {
                let c = public_key.encode(message).unwrap();
                assert_eq!(private_key.decode(&c).unwrap(), message);
            }
        }
    }

    #[test]
    fn test_decode_with_label() {
        let keypair = test_keypair();
        let c = keypair.public_key().encode_with_label(b"Hello World!", b"context").unwrap();

        let private_key = keypair.private_key();
        assert_eq!(private_key.decode_strict(&c, b"context").unwrap(), b"Hello World!");
        assert!(private_key.decode_strict(&c, b"other").is_err());
        assert_eq!(private_key.decode_with_label(&c, b"context").unwrap(), b"Hello World!");
    }

    #[test]
    fn test_decode_strict_message_with_separator() {
        let keypair = test_keypair();
        let message = [0x01u8, 0x00, 0x01, 0x02];
        let c = keypair.public_key().encode(&message).unwrap();
        assert_eq!(keypair.private_key().decode_strict(&c, b"").unwrap(), message.to_vec());
    }

    #[test]
    fn test_decode_out_of_range() {
        let key = test_keypair().private_key();
        assert!(matches!(key.decode(key.n()), Err(Error::Decoding(_))));
    }

    #[test]
    fn test_encrypt_decrypt_bytes() {
        let keypair = test_keypair();
        let ciphertext = keypair.public_key().encrypt(b"Hello, RSA!").unwrap();
        let decrypted = keypair.private_key().decrypt(&ciphertext).unwrap();
        assert_eq!(decrypted, b"Hello, RSA!");
    }

    #[test]
    fn test_decrypt_invalid_size() {
        let key = test_keypair().private_key();
        assert!(key.decrypt(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_sign_verify() {
        let keypair = test_keypair();
        let (public_key, private_key) = (keypair.public_key(), keypair.private_key());

        let signature = private_key.sign(b"Hello World!");
        assert_eq!(signature, private_key.sign_raw(b"Hello World!"));
        assert_eq!(signature, private_key.sign_crt(b"Hello World!"));

        assert!(public_key.verify(&signature, b"Hello World!"));
        assert!(!public_key.verify(&signature, b"Test"));
        assert!(!public_key.verify(&RsaBigInt::from(0u8), b"Hello World!"));
    }

    #[test]
    fn test_hello_world() {
        let keypair = test_keypair();
        let (public_key, private_key) = (keypair.public_key(), keypair.private_key());

        let c = public_key.encode(b"Hello World!").unwrap();
        assert_eq!(private_key.decode(&c).unwrap(), b"Hello World!".to_vec());

        let signature = private_key.sign(b"Hello World!");
        assert!(public_key.verify(&signature, b"Hello World!"));
        assert!(!public_key.verify(&signature, b"Test"));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let key = test_keypair().private_key();
        assert_eq!(key.sign(b"m"), key.sign(b"m"));
        assert_ne!(key.sign(b"m1"), key.sign(b"m2"));
    }
}
