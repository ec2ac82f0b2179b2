use thiserror::Error;

/// Every fatal condition the build pipeline can hit, with enough context
/// to locate the offending level/language without re-deriving it from logs.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("level {level}: missing verification key ({available} keys available, need {needed})")]
    MissingKey {
        level: usize,
        available: usize,
        needed: usize,
    },

    #[error("level {level}: private key JWK serialized to {actual} bytes, expected 206")]
    KeyShape { level: usize, actual: usize },

    #[error("level {level}: image error: {reason}")]
    Image { level: usize, reason: String },

    #[error("crypto primitive failure: {0}")]
    Crypto(String),

    #[error("fetch failed for language {lang}")]
    Fetch {
        lang: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("language {lang}, level {level}: {reason}")]
    CsvShape {
        lang: String,
        level: usize,
        reason: String,
    },

    #[error("template error for language {lang}: {reason}")]
    Template { lang: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ForgeError>;
