// RSA Encryption Implementation
// Public key operations: OAEP encoding and signature verification

use super::bigint::{from_bytes, mod_pow, to_bytes_padded, RsaBigInt};
use super::error::Result;
use super::keygen::PublicKey;

impl PublicKey {
    /// Encode the message without padding.
    /// C = M^e mod n
    ///
    /// Unpadded RSA is deterministic and malleable; prefer [`PublicKey::encode`].
    pub fn encode_raw(&self, m: &RsaBigInt) -> RsaBigInt {
        mod_pow(m, &self.e, &self.n)
    }

    /// OAEP-pad `message` with an empty label and encrypt it
    pub fn encode(&self, message: &[u8]) -> Result<RsaBigInt> {
        self.encode_with_label(message, b"")
    }

    pub fn encode_with_label(&self, message: &[u8], label: &[u8]) -> Result<RsaBigInt> {
        let em = self.oaep.pad(message, label, self.k)?;
        Ok(self.encode_raw(&from_bytes(&em)))
    }

    /// Encrypt bytes into a ciphertext of exactly `key_len()` bytes
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let c = self.encode(plaintext)?;
        to_bytes_padded(&c, self.k)
    }

    /// Verify a raw hash signature: `s^e mod n` must equal the digest of
    /// `message` read as an integer. Signatures outside `[0, n)` never verify.
    pub fn verify(&self, signature: &RsaBigInt, message: &[u8]) -> bool {
        if signature >= &self.n {
            return false;
        }
        let expected = from_bytes(&self.oaep.digest().hash(message));
        self.encode_raw(signature) == expected
    }
}
