//! ECDSA P-256 key-pair packaging: loading precomputed verification keys
//! and exporting private keys in the canonical 206-byte JWK layout the
//! client decryptor expects.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use p256::ecdsa::SigningKey;
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use serde::Serialize;

use crate::error::{ForgeError, Result};

/// One level's verification key pair, as loaded from `data-keys.json`.
pub struct VerificationKey {
    /// SPKI bytes, re-emitted in the bundle unchanged.
    pub public_key_spki: Vec<u8>,
    signing_key: SigningKey,
}

/// The exact field order/whitespace the client's JWK importer expects.
/// Relies on `serde_json`'s compact serializer preserving struct
/// declaration order (the result must be exactly 206 bytes).
#[derive(Serialize)]
struct PrivateJwk<'a> {
    crv: &'static str,
    d: &'a str,
    ext: bool,
    key_ops: [&'static str; 1],
    kty: &'static str,
    x: &'a str,
    y: &'a str,
}

impl VerificationKey {
    /// Decode a base64 SPKI public key / PKCS#8 private key pair.
    pub fn from_base64(level: usize, public_b64: &str, private_b64: &str) -> Result<Self> {
        let public_key_spki = base64::engine::general_purpose::STANDARD
            .decode(public_b64)
            .map_err(|e| ForgeError::Crypto(format!("level {level}: bad public key base64: {e}")))?;
        let private_der = base64::engine::general_purpose::STANDARD
            .decode(private_b64)
            .map_err(|e| ForgeError::Crypto(format!("level {level}: bad private key base64: {e}")))?;

        // Round-trip through the SPKI parser purely to validate the bytes
        // decode as a P-256 public key before we emit them verbatim.
        PublicKey::from_public_key_der(&public_key_spki)
            .map_err(|e| ForgeError::Crypto(format!("level {level}: invalid SPKI public key: {e}")))?;

        let signing_key = SigningKey::from_pkcs8_der(&private_der)
            .map_err(|e| ForgeError::Crypto(format!("level {level}: invalid PKCS#8 private key: {e}")))?;

        Ok(VerificationKey {
            public_key_spki,
            signing_key,
        })
    }

    /// Export the private key as the canonical compact JWK byte string.
    /// Fatal (`ForgeError::KeyShape`) if the result isn't exactly 206 bytes.
    pub fn export_jwk_bytes(&self, level: usize) -> Result<Vec<u8>> {
        let public = self.signing_key.verifying_key();
        let encoded_point = public.to_encoded_point(false);
        let x = encoded_point
            .x()
            .ok_or_else(|| ForgeError::Crypto(format!("level {level}: public point missing x")))?;
        let y = encoded_point
            .y()
            .ok_or_else(|| ForgeError::Crypto(format!("level {level}: public point missing y")))?;

        let mut d_bytes = self.signing_key.to_bytes();
        let d = URL_SAFE_NO_PAD.encode(d_bytes.as_slice());
        let x = URL_SAFE_NO_PAD.encode(x);
        let y = URL_SAFE_NO_PAD.encode(y);
        d_bytes.as_mut_slice().fill(0);

        let jwk = PrivateJwk {
            crv: "P-256",
            d: &d,
            ext: true,
            key_ops: ["sign"],
            kty: "EC",
            x: &x,
            y: &y,
        };

        let bytes = serde_json::to_vec(&jwk)
            .map_err(|e| ForgeError::Crypto(format!("level {level}: JWK serialization failed: {e}")))?;

        if bytes.len() != 206 {
            return Err(ForgeError::KeyShape {
                level,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

/// Load `count` verification keys, requiring at least `level_count` entries.
pub fn load_verification_keys(
    records: &[crate::config::KeyRecord],
    level_count: usize,
) -> Result<Vec<VerificationKey>> {
    if records.len() < level_count {
        return Err(ForgeError::MissingKey {
            level: records.len(),
            available: records.len(),
            needed: level_count,
        });
    }
    records
        .iter()
        .take(level_count)
        .enumerate()
        .map(|(i, rec)| VerificationKey::from_base64(i, &rec.public_key, &rec.private_key))
        .collect()
}

/// One generated key pair, in the shape `--generate-keys` emits on stdout.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Generate `count` independent ECDSA P-256 key pairs from a CSPRNG.
pub fn generate_key_pairs(count: u32) -> Vec<GeneratedKeyPair> {
    use rand::rngs::OsRng;
    (0..count)
        .map(|_| {
            let signing_key = SigningKey::random(&mut OsRng);
            let public_key = PublicKey::from(*signing_key.verifying_key());
            let public_der = public_key
                .to_public_key_der()
                .expect("SPKI encoding of a freshly generated key cannot fail");
            let private_der = signing_key
                .to_pkcs8_der()
                .expect("PKCS#8 encoding of a freshly generated key cannot fail");
            GeneratedKeyPair {
                public_key: base64::engine::general_purpose::STANDARD.encode(public_der.as_bytes()),
                private_key: base64::engine::general_purpose::STANDARD.encode(private_der.as_bytes()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_round_trip_through_jwk_export() {
        let pairs = generate_key_pairs(3);
        assert_eq!(pairs.len(), 3);
        for (i, pair) in pairs.iter().enumerate() {
            let vk = VerificationKey::from_base64(i, &pair.public_key, &pair.private_key).unwrap();
            let jwk = vk.export_jwk_bytes(i).unwrap();
            assert_eq!(jwk.len(), 206);
            let parsed: serde_json::Value = serde_json::from_slice(&jwk).unwrap();
            assert_eq!(parsed["kty"], "EC");
            assert_eq!(parsed["crv"], "P-256");
        }
    }

    #[test]
    fn missing_keys_is_fatal() {
        let records: Vec<crate::config::KeyRecord> = vec![];
        let err = load_verification_keys(&records, 2).unwrap_err();
        matches!(err, ForgeError::MissingKey { .. });
    }
}
