//! Bundle assembly: `GameData` JSON plus template placeholder
//! substitution, using a small base64 serde-helper module for embedding
//! raw bytes in JSON.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::error::{ForgeError, Result};

const GAME_DATA_TAG_OPEN: &str = r#"<script id="game-data" type="application/json">"#;
const GAME_DATA_TAG_CLOSE: &str = "</script>";

/// Bytes that serialize to JSON as a standard base64 string, the encoding
/// every binary field in `GameData` uses on the wire.
mod base64_bytes {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }
}

#[derive(Serialize)]
struct LevelEntry {
    #[serde(serialize_with = "base64_bytes::serialize")]
    key: Vec<u8>,
    #[serde(serialize_with = "base64_bytes::serialize")]
    data: Vec<u8>,
    hints: HintEntry,
    #[serde(rename = "publicKey", serialize_with = "base64_bytes::serialize")]
    public_key: Vec<u8>,
}

#[derive(Serialize)]
struct HintEntry {
    clear: Vec<String>,
    #[serde(serialize_with = "serialize_ciphertexts")]
    encrypted: Vec<Vec<u8>>,
}

fn serialize_ciphertexts<S: serde::Serializer>(
    ciphertexts: &[Vec<u8>],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(ciphertexts.len()))?;
    for ct in ciphertexts {
        seq.serialize_element(&STANDARD.encode(ct))?;
    }
    seq.end()
}

/// One level's worth of material handed to `GameData::new`: encrypted
/// level key, encrypted level secret, SPKI public key, and this
/// language's hints for the level.
pub struct LevelBundle {
    pub key: Vec<u8>,
    pub data: Vec<u8>,
    pub public_key: Vec<u8>,
    pub hints_clear: Vec<String>,
    pub hints_encrypted: Vec<Vec<u8>>,
}

/// The JSON object embedded in every per-language HTML bundle
/// (spec.md §3 `GameData[lang]`).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    levels: Vec<LevelEntry>,
    hint_thresholds: Vec<usize>,
    #[serde(serialize_with = "base64_bytes::serialize")]
    hint_salt: Vec<u8>,
    #[serde(serialize_with = "base64_bytes::serialize")]
    thumbnail_header: Vec<u8>,
    unlocked_levels: usize,
}

impl GameData {
    pub fn new(
        levels: Vec<LevelBundle>,
        hint_thresholds: Vec<usize>,
        hint_salt: Vec<u8>,
        thumbnail_header: Vec<u8>,
        unlocked_levels: usize,
    ) -> Self {
        GameData {
            levels: levels
                .into_iter()
                .map(|l| LevelEntry {
                    key: l.key,
                    data: l.data,
                    public_key: l.public_key,
                    hints: HintEntry {
                        clear: l.hints_clear,
                        encrypted: l.hints_encrypted,
                    },
                })
                .collect(),
            hint_thresholds,
            hint_salt,
            thumbnail_header,
            unlocked_levels,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ForgeError::Crypto(format!("GameData serialization failed: {e}")))
    }
}

/// Substitute the `<script id="game-data">` placeholder's body with
/// `json`. Fatal if the tag is absent or appears more than once.
pub fn render_bundle(template: &str, lang: &str, json: &str) -> Result<String> {
    let open_at = find_unique(template, GAME_DATA_TAG_OPEN, lang)?;
    let body_start = open_at + GAME_DATA_TAG_OPEN.len();
    let close_at = template[body_start..]
        .find(GAME_DATA_TAG_CLOSE)
        .map(|i| body_start + i)
        .ok_or_else(|| ForgeError::Template {
            lang: lang.to_string(),
            reason: "game-data script tag has no closing </script>".to_string(),
        })?;

    let mut rendered = String::with_capacity(template.len() + json.len());
    rendered.push_str(&template[..body_start]);
    rendered.push_str(json);
    rendered.push_str(&template[close_at..]);
    Ok(rendered)
}

fn find_unique(haystack: &str, needle: &str, lang: &str) -> Result<usize> {
    let first = haystack.find(needle).ok_or_else(|| ForgeError::Template {
        lang: lang.to_string(),
        reason: "template has no game-data script tag".to_string(),
    })?;
    if haystack[first + needle.len()..].contains(needle) {
        return Err(ForgeError::Template {
            lang: lang.to_string(),
            reason: "template has more than one game-data script tag".to_string(),
        });
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game_data() -> GameData {
        GameData::new(
            vec![LevelBundle {
                key: vec![1, 2, 3],
                data: vec![4, 5, 6],
                public_key: vec![7, 7, 7],
                hints_clear: vec!["a".into(), "b".into(), "c".into()],
                hints_encrypted: vec![vec![1, 2]],
            }],
            vec![2],
            vec![5, 5],
            vec![9, 9],
            1,
        )
    }

    #[test]
    fn game_data_round_trips_through_json() {
        let data = sample_game_data();
        let json = data.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["unlockedLevels"], 1);
        assert_eq!(parsed["hintThresholds"][0], 2);
        assert_eq!(parsed["hintSalt"], STANDARD.encode([5, 5]));
        assert_eq!(parsed["levels"][0]["key"], STANDARD.encode([1, 2, 3]));
        assert_eq!(parsed["levels"][0]["data"], STANDARD.encode([4, 5, 6]));
        assert_eq!(parsed["levels"][0]["publicKey"], STANDARD.encode([7, 7, 7]));
        assert_eq!(parsed["levels"][0]["hints"]["clear"][0], "a");
    }

    #[test]
    fn renders_into_unique_placeholder() {
        let template = format!(
            "<html><body>{}{{}}{}</body></html>",
            GAME_DATA_TAG_OPEN, GAME_DATA_TAG_CLOSE
        );
        let rendered = render_bundle(&template, "en", r#"{"a":1}"#).unwrap();
        assert!(rendered.contains(r#"{"a":1}"#));
        assert!(!rendered.contains("{}"));
    }

    #[test]
    fn rejects_missing_placeholder() {
        let err = render_bundle("<html></html>", "en", "{}").unwrap_err();
        matches!(err, ForgeError::Template { .. });
    }

    #[test]
    fn rejects_duplicate_placeholder() {
        let template = format!(
            "{}{{}}{} ... {}{{}}{}",
            GAME_DATA_TAG_OPEN, GAME_DATA_TAG_CLOSE, GAME_DATA_TAG_OPEN, GAME_DATA_TAG_CLOSE
        );
        let err = render_bundle(&template, "en", "{}").unwrap_err();
        matches!(err, ForgeError::Template { .. });
    }
}
