//! AES-128-GCM and PBKDF2-HMAC-SHA1 wrappers: a thin typed wrapper over
//! the `aead`/RustCrypto traits rather than hand-rolled CTR and GHASH.
//!
//! The raw level/language salts double as GCM ivs directly instead of
//! the usual 96-bit nonce: 16 bytes for level encryption, 32 bytes
//! (`LanguageSalt ∥ LevelSalt`) for hint encryption. GCM's generic IV
//! setup (NIST SP 800-38D §7.1) supports any length, and `aes-gcm`
//! exposes it via `AesGcm<Aes128, NonceSize>` for a non-default
//! `NonceSize` rather than the 96-bit `Aes128Gcm` alias.

use aes::Aes128;
use aes_gcm::aead::consts::{U16, U32};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{AesGcm, Key};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha1::Sha1;

use crate::error::{ForgeError, Result};

type Aes128Gcm16 = AesGcm<Aes128, U16>;
type Aes128Gcm32 = AesGcm<Aes128, U32>;

const PBKDF2_ITERATIONS: u32 = 10_000;

/// PBKDF2-HMAC-SHA-1(password, salt, 10000 iterations) -> 16-byte key.
pub fn pbkdf2_hmac_sha1_16(password: &[u8], salt: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    pbkdf2::<Hmac<Sha1>>(password, salt, PBKDF2_ITERATIONS, &mut out)
        .expect("pbkdf2 output length is a valid HMAC-SHA1 block multiple bound");
    out
}

/// Encrypt with a 16-byte iv (level key wrap, level secret blob).
/// Returns ciphertext ∥ 16-byte tag.
///
/// Callers must never reuse a (key, iv) pair across distinct plaintexts;
/// this module does not enforce that globally, only documents it, since the
/// pipeline's key derivation already guarantees distinctness by construction.
pub fn encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128Gcm16::new(Key::<Aes128Gcm16>::from_slice(key));
    cipher
        .encrypt(iv.into(), plaintext)
        .map_err(|e| ForgeError::Crypto(format!("AES-GCM encrypt failed: {e}")))
}

pub fn decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128Gcm16::new(Key::<Aes128Gcm16>::from_slice(key));
    cipher
        .decrypt(iv.into(), ciphertext)
        .map_err(|e| ForgeError::Crypto(format!("AES-GCM decrypt failed: {e}")))
}

/// Encrypt with a 32-byte iv (`LanguageSalt ∥ LevelSalt`).
pub fn encrypt_hint(key: &[u8; 16], iv: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128Gcm32::new(Key::<Aes128Gcm32>::from_slice(key));
    cipher
        .encrypt(iv.into(), plaintext)
        .map_err(|e| ForgeError::Crypto(format!("AES-GCM hint encrypt failed: {e}")))
}

pub fn decrypt_hint(key: &[u8; 16], iv: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128Gcm32::new(Key::<Aes128Gcm32>::from_slice(key));
    cipher
        .decrypt(iv.into(), ciphertext)
        .map_err(|e| ForgeError::Crypto(format!("AES-GCM hint decrypt failed: {e}")))
}

/// Build the 32-byte hint iv `LanguageSalt ∥ LevelSalt`.
pub fn hint_iv(language_salt: &[u8; 16], level_salt: &[u8; 16]) -> [u8; 32] {
    let mut iv = [0u8; 32];
    iv[..16].copy_from_slice(language_salt);
    iv[16..].copy_from_slice(level_salt);
    iv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pbkdf2_known_vector_is_stable() {
        let out = pbkdf2_hmac_sha1_16(&[0u8; 16], &[0u8; 16]);
        // Stability check: re-deriving with the same inputs matches.
        assert_eq!(out, pbkdf2_hmac_sha1_16(&[0u8; 16], &[0u8; 16]));
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn gcm_round_trips() {
        let key = [7u8; 16];
        let iv = [9u8; 16];
        let pt = b"level-key-material";
        let ct = encrypt(&key, &iv, pt).unwrap();
        assert_eq!(decrypt(&key, &iv, &ct).unwrap(), pt);
    }

    #[test]
    fn gcm_rejects_wrong_key() {
        let iv = [1u8; 16];
        let ct = encrypt(&[1u8; 16], &iv, b"secret").unwrap();
        assert!(decrypt(&[2u8; 16], &iv, &ct).is_err());
    }

    #[test]
    fn hint_gcm_round_trips_with_32_byte_iv() {
        let key = [3u8; 16];
        let iv = hint_iv(&[1u8; 16], &[2u8; 16]);
        let pt = b"find the hidden waterfall";
        let ct = encrypt_hint(&key, &iv, pt).unwrap();
        assert_eq!(decrypt_hint(&key, &iv, &ct).unwrap(), pt);
    }
}
