//! Hint crypto pipeline: hint-key setup, Shamir distribution across
//! levels, and per-(language, level) AES-GCM encryption of hint strings,
//! with the first three hints always clear.

use std::collections::HashMap;

use rand::rngs::OsRng;

use crate::aead;
use crate::csv;
use crate::derive;
use crate::error::{ForgeError, Result};
use crate::shamir::{self, Share};

const CLEAR_HINT_COUNT: usize = 3;

/// One hint key's setup: the key itself (never emitted) and its n=levelCount shares.
pub struct HintKeySetup {
    pub threshold: usize,
    shares: Vec<Share>,
}

/// Build the `|hintThresholds|` hint keys and their Shamir shares.
/// `shares_by_level(i)` returns level `i`'s share of every hint key,
/// ascending by hint index, matching the order LevelSecret needs them in.
pub fn setup_hint_keys(game_random_salt: &str, hint_thresholds: &[usize], level_count: usize) -> Vec<HintKeySetup> {
    hint_thresholds
        .iter()
        .enumerate()
        .map(|(h, &k)| {
            let key = derive::hint_key(game_random_salt, h);
            // Only the key's first byte is Shamir-shared (spec.md §8 P5/S6
            // require exactly one embedded byte per hint threshold); the
            // remaining 15 bytes aren't reconstructable from shares alone.
            let shares = shamir::share_byte(key[0], level_count, k, &mut OsRng)
                .expect("hint threshold k was already validated against level_count <= 255");
            HintKeySetup { threshold: k, shares }
        })
        .collect()
}

impl HintKeySetup {
    pub fn share_for_level(&self, level: usize) -> &Share {
        &self.shares[level]
    }
}

/// Shares owned by level `i`, ascending by hint index — the exact layout
/// `LevelSecret[i]` needs.
pub fn shares_for_level<'a>(setups: &'a [HintKeySetup], level: usize) -> Vec<Share> {
    setups.iter().map(|s| s.share_for_level(level).clone()).collect()
}

/// One language's encrypted hints for one level: first `CLEAR_HINT_COUNT`
/// plaintext, the rest AES-GCM ciphertext keyed by hint-key index.
pub struct LevelHints {
    pub clear: Vec<String>,
    pub encrypted: Vec<Vec<u8>>,
}

/// Encrypt level `i`'s hint row (1-indexed `level_id` lookup into the CSV
/// map) for one language. Truncates if fewer hint keys exist than
/// encrypted hints remain (a warning, not fatal).
pub fn encrypt_level_hints(
    hint_keys: &[[u8; 16]],
    language_salt: &[u8; 16],
    level_salt: &[u8; 16],
    hint_strings: &[String],
    lang: &str,
    level_id: usize,
) -> Result<LevelHints> {
    if hint_strings.len() < CLEAR_HINT_COUNT {
        return Err(ForgeError::CsvShape {
            lang: lang.to_string(),
            level: level_id,
            reason: format!(
                "row has {} hint fields, need at least {CLEAR_HINT_COUNT}",
                hint_strings.len()
            ),
        });
    }

    let clear = hint_strings[..CLEAR_HINT_COUNT].to_vec();
    let remaining = &hint_strings[CLEAR_HINT_COUNT..];

    let usable = remaining.len().min(hint_keys.len());
    if usable < remaining.len() {
        tracing::warn!(
            target: "pipeline::hints",
            lang,
            level_id,
            available_keys = hint_keys.len(),
            hints_to_encrypt = remaining.len(),
            "fewer hint keys than encrypted hints, truncating"
        );
    }

    let iv = aead::hint_iv(language_salt, level_salt);
    let encrypted = remaining[..usable]
        .iter()
        .enumerate()
        .map(|(h, text)| aead::encrypt_hint(&hint_keys[h], &iv, text.as_bytes()))
        .collect::<Result<Vec<_>>>()?;

    Ok(LevelHints { clear, encrypted })
}

/// Fetch + parse a language's CSV and build `levelId -> hint strings`.
pub fn parse_csv_for_language(raw_csv: &str) -> HashMap<usize, Vec<String>> {
    csv::parse_hint_sheet(raw_csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shamir::combine_byte;

    #[test]
    fn shares_reconstruct_hint_key_first_byte() {
        let thresholds = vec![2, 3];
        let setups = setup_hint_keys("seed", &thresholds, 5);
        for (h, &k) in thresholds.iter().enumerate() {
            let key = derive::hint_key("seed", h);
            let shares: Vec<Share> = (0..5).map(|i| setups[h].share_for_level(i).clone()).collect();
            let combined = combine_byte(&shares[..k], k).unwrap();
            assert_eq!(combined, key[0]);
            for share in &shares {
                assert_eq!(share.ys.len(), 1);
            }
        }
    }

    #[test]
    fn hint_round_trip_and_clear_prefix() {
        let hints = vec![
            "free hint 1".to_string(),
            "free hint 2".to_string(),
            "free hint 3".to_string(),
            "secret hint".to_string(),
        ];
        let hint_keys = [[1u8; 16]];
        let lang_salt = [2u8; 16];
        let level_salt = [3u8; 16];

        let result = encrypt_level_hints(&hint_keys, &lang_salt, &level_salt, &hints, "en", 1).unwrap();
        assert_eq!(result.clear, &hints[..3]);
        assert_eq!(result.encrypted.len(), 1);

        let iv = aead::hint_iv(&lang_salt, &level_salt);
        let plaintext = aead::decrypt_hint(&hint_keys[0], &iv, &result.encrypted[0]).unwrap();
        assert_eq!(plaintext, hints[3].as_bytes());
    }

    #[test]
    fn truncates_when_fewer_keys_than_hints() {
        let hints: Vec<String> = (0..6).map(|i| format!("hint{i}")).collect();
        let hint_keys = [[1u8; 16]];
        let result = encrypt_level_hints(&hint_keys, &[0u8; 16], &[0u8; 16], &hints, "en", 1).unwrap();
        assert_eq!(result.encrypted.len(), 1);
    }

    #[test]
    fn rejects_rows_with_too_few_hints() {
        let hints = vec!["only one".to_string()];
        let err = encrypt_level_hints(&[[1u8; 16]], &[0u8; 16], &[0u8; 16], &hints, "en", 1).unwrap_err();
        matches!(err, ForgeError::CsvShape { .. });
    }
}
