//! Per-level key hierarchy and secret assembly (spec.md §4.5).

use crate::aead;
use crate::collaborators::ImageSource;
use crate::derive;
use crate::error::Result;
use crate::keys::VerificationKey;
use crate::phash::perceptual_hash;
use crate::shamir::Share;
use crate::thumbnail;

/// Everything computed for one level before hint shares are known.
pub struct LevelMaterial {
    pub level_salt: [u8; 16],
    pub level_key: [u8; 16],
    pub encrypted_level_key: Vec<u8>,
    pub private_jwk: Vec<u8>,
    pub thumbnail: Vec<u8>,
}

/// Steps 1-6 of spec.md §4.5, for a single level. Stage-local: callers
/// fan this out across levels with `futures::future::join_all` and
/// collect by index (spec.md §5).
pub fn build_level_material(
    game_random_salt: &str,
    level: usize,
    vk: &VerificationKey,
    images: &dyn ImageSource,
) -> Result<LevelMaterial> {
    let level_salt = derive::level_salt(game_random_salt, level);
    let level_key = derive::level_key(game_random_salt, level);

    let image = images.load_level_image(level)?;
    let image_hash = perceptual_hash(&image);
    let encryption_key = aead::pbkdf2_hmac_sha1_16(&image_hash, &level_salt);

    let encrypted_level_key = aead::encrypt(&encryption_key, &level_salt, &level_key)?;

    let private_jwk = vk.export_jwk_bytes(level)?;

    let thumb_source = images.load_thumbnail_source(level)?;
    let thumbnail = thumbnail::make_thumbnail(&thumb_source)
        .map_err(|reason| crate::error::ForgeError::Image { level, reason })?;

    Ok(LevelMaterial {
        level_salt,
        level_key,
        encrypted_level_key,
        private_jwk,
        thumbnail,
    })
}

/// Step 7 of spec.md §4.5: LevelSecret = privateKeyJWK ∥ hint shares (h
/// ascending, one byte each) ∥ stripped thumbnail tail, encrypted under
/// LevelKey with iv = LevelSalt. `hint_shares_for_level[h]` is level `i`'s
/// share of hint key `h` (spec.md §8 P5/S6: exactly `|hintThresholds|`
/// bytes total, produced by `shamir::share_byte`).
pub fn encrypt_level_secret(
    material: &LevelMaterial,
    hint_shares_for_level: &[Share],
    thumbnail_header: &[u8],
) -> Result<Vec<u8>> {
    let mut plaintext = Vec::with_capacity(
        material.private_jwk.len() + hint_shares_for_level.len() + material.thumbnail.len(),
    );
    plaintext.extend_from_slice(&material.private_jwk);
    for share in hint_shares_for_level {
        // Only the y-value for this level's share belongs in the blob (one
        // byte, per spec.md §8 P5); the x-coordinate (the level index) is
        // implicit from position.
        debug_assert_eq!(share.ys.len(), 1, "hint shares must be exactly one byte");
        plaintext.extend_from_slice(&share.ys);
    }
    plaintext.extend_from_slice(&material.thumbnail[thumbnail_header.len()..]);

    let ciphertext = aead::encrypt(&material.level_key, &material.level_salt, &plaintext)?;

    let mut data = Vec::with_capacity(16 + ciphertext.len());
    data.extend_from_slice(&material.level_salt);
    data.extend_from_slice(&ciphertext);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shamir;
    use image::{Rgba, RgbaImage};
    use rand::rngs::OsRng;

    struct FixedImageSource {
        image: RgbaImage,
    }

    impl ImageSource for FixedImageSource {
        fn load_level_image(&self, _level: usize) -> Result<RgbaImage> {
            Ok(self.image.clone())
        }
        fn load_thumbnail_source(&self, _level: usize) -> Result<RgbaImage> {
            Ok(self.image.clone())
        }
    }

    fn test_key() -> VerificationKey {
        let pair = crate::keys::generate_key_pairs(1).pop().unwrap();
        VerificationKey::from_base64(0, &pair.public_key, &pair.private_key).unwrap()
    }

    #[test]
    fn level_secret_round_trips_through_decrypt() {
        let image = RgbaImage::from_fn(640, 360, |x, y| Rgba([(x % 255) as u8, (y % 255) as u8, 50, 255]));
        let images = FixedImageSource { image };
        let vk = test_key();

        let material = build_level_material("seed", 0, &vk, &images).unwrap();

        let shares = shamir::share_byte(5u8, 3, 2, &mut OsRng).unwrap();
        let header = thumbnail::common_prefix(&[material.thumbnail.clone()]);

        let data = encrypt_level_secret(&material, &[shares[0].clone()], &header).unwrap();

        let (salt, rest) = data.split_at(16);
        assert_eq!(salt, material.level_salt);
        let plaintext = aead::decrypt(&material.level_key, &material.level_salt, rest).unwrap();

        assert_eq!(&plaintext[..206], &material.private_jwk[..]);
        let share_end = 206 + 1;
        assert_eq!(plaintext[206], shares[0].ys[0]);
        let tail = &plaintext[share_end..];
        let mut recombined = header.clone();
        recombined.extend_from_slice(tail);
        assert_eq!(recombined, material.thumbnail);
    }

    #[test]
    fn encrypted_level_key_decrypts_back_under_pbkdf2_key() {
        let image = RgbaImage::from_fn(640, 360, |x, y| Rgba([(x % 255) as u8, (y % 255) as u8, 50, 255]));
        let images = FixedImageSource { image };
        let vk = test_key();

        let material = build_level_material("seed", 0, &vk, &images).unwrap();
        let image_hash = perceptual_hash(&images.image);
        let encryption_key = aead::pbkdf2_hmac_sha1_16(&image_hash, &material.level_salt);
        let decrypted = aead::decrypt(
            &encryption_key,
            &material.level_salt,
            &material.encrypted_level_key,
        )
        .unwrap();
        assert_eq!(decrypted, material.level_key);
    }
}
