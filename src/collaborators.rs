//! External collaborator traits: the pipeline depends only on these,
//! never on `std::fs` or `reqwest` directly, so the build can be driven
//! against fixtures in tests without touching the filesystem or network.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::{ForgeError, Result};

pub trait ImageSource: Send + Sync {
    fn load_level_image(&self, level: usize) -> Result<RgbaImage>;
    fn load_thumbnail_source(&self, level: usize) -> Result<RgbaImage>;
}

#[async_trait]
pub trait HintCsvFetcher: Send + Sync {
    async fn fetch(&self, lang: &str) -> Result<String>;
}

pub trait TemplateSource: Send + Sync {
    fn load(&self, lang: &str) -> Result<String>;
}

pub trait BundleSink: Send + Sync {
    fn write(&self, lang: &str, html: &str) -> Result<()>;
}

/// Reads `data/<i>.png` and `data/<i>_thumb.png`, 1-indexed.
pub struct FsImageSource {
    pub data_dir: PathBuf,
}

impl FsImageSource {
    fn load(&self, path: &Path, level: usize) -> Result<RgbaImage> {
        let bytes = std::fs::read(path).map_err(|e| ForgeError::Image {
            level,
            reason: format!("reading {}: {e}", path.display()),
        })?;
        image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|e| ForgeError::Image {
                level,
                reason: format!("decoding {}: {e}", path.display()),
            })
    }
}

impl ImageSource for FsImageSource {
    fn load_level_image(&self, level: usize) -> Result<RgbaImage> {
        let path = self.data_dir.join(format!("{}.png", level + 1));
        self.load(&path, level)
    }

    fn load_thumbnail_source(&self, level: usize) -> Result<RgbaImage> {
        let path = self.data_dir.join(format!("{}_thumb.png", level + 1));
        self.load(&path, level)
    }
}

/// Fetches a language's hint CSV over HTTPS, keyed by a per-language sheet id.
pub struct HttpHintCsvFetcher {
    pub client: reqwest::Client,
    pub base_url: String,
}

#[async_trait]
impl HintCsvFetcher for HttpHintCsvFetcher {
    async fn fetch(&self, lang: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, lang);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ForgeError::Fetch {
                lang: lang.to_string(),
                source: anyhow::Error::new(e),
            })?;

        if !response.status().is_success() {
            return Err(ForgeError::Fetch {
                lang: lang.to_string(),
                source: anyhow::anyhow!("non-OK status: {}", response.status()),
            });
        }

        response.text().await.map_err(|e| ForgeError::Fetch {
            lang: lang.to_string(),
            source: anyhow::Error::new(e),
        })
    }
}

/// An in-memory CSV source, for tests and the mini end-to-end fixture.
pub struct StaticHintCsvFetcher {
    pub rows: std::collections::HashMap<String, String>,
}

#[async_trait]
impl HintCsvFetcher for StaticHintCsvFetcher {
    async fn fetch(&self, lang: &str) -> Result<String> {
        self.rows.get(lang).cloned().ok_or_else(|| ForgeError::Fetch {
            lang: lang.to_string(),
            source: anyhow::anyhow!("no fixture CSV registered for language {lang}"),
        })
    }
}

/// Reads `base-html/index-<lang>.html`.
pub struct FsTemplateSource {
    pub template_dir: PathBuf,
}

impl TemplateSource for FsTemplateSource {
    fn load(&self, lang: &str) -> Result<String> {
        let path = self.template_dir.join(format!("index-{lang}.html"));
        std::fs::read_to_string(&path).map_err(|e| ForgeError::Template {
            lang: lang.to_string(),
            reason: format!("reading {}: {e}", path.display()),
        })
    }
}

/// Writes `generated-html/index-<lang>.html`, creating the directory if needed.
pub struct FsBundleSink {
    pub output_dir: PathBuf,
}

impl BundleSink for FsBundleSink {
    fn write(&self, lang: &str, html: &str) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| ForgeError::Template {
            lang: lang.to_string(),
            reason: format!("creating {}: {e}", self.output_dir.display()),
        })?;
        let path = self.output_dir.join(format!("index-{lang}.html"));
        std::fs::write(&path, html).map_err(|e| ForgeError::Template {
            lang: lang.to_string(),
            reason: format!("writing {}: {e}", path.display()),
        })
    }
}
