//! Top-level build orchestration (spec.md §5): stages run in sequence,
//! per-level and per-language work within a stage fans out with
//! `futures::future::join_all` and is collected back by index, mirroring
//! the teacher's `shuffler_service` round pipeline.

use std::sync::Arc;

use futures::future::join_all;

use crate::bundle::{GameData, LevelBundle};
use crate::collaborators::{BundleSink, HintCsvFetcher, ImageSource, TemplateSource};
use crate::config::{BuildSettings, GlobalConfig};
use crate::derive;
use crate::error::Result;
use crate::hints::{self, HintKeySetup};
use crate::keys::VerificationKey;
use crate::level::{self, LevelMaterial};
use crate::thumbnail;

const LOG_TARGET: &str = "pipeline::build";

pub struct Pipeline {
    pub config: GlobalConfig,
    pub settings: BuildSettings,
    pub images: Arc<dyn ImageSource>,
    pub hint_csv: Arc<dyn HintCsvFetcher>,
    pub templates: Arc<dyn TemplateSource>,
    pub sink: Arc<dyn BundleSink>,
}

impl Pipeline {
    /// Run the whole build: per-level key/secret material, hint setup,
    /// and one bundle per configured language.
    pub async fn run(&self, verification_keys: Vec<VerificationKey>) -> Result<()> {
        tracing::info!(
            target: LOG_TARGET,
            level_count = self.config.level_count,
            languages = ?self.config.languages,
            "starting build"
        );

        let materials = self.build_level_materials(&verification_keys).await?;

        let thumbnails: Vec<Vec<u8>> = materials.iter().map(|m| m.thumbnail.clone()).collect();
        let thumbnail_header = thumbnail::common_prefix(&thumbnails);

        let hint_setups = hints::setup_hint_keys(
            &self.config.game_random_salt,
            &self.config.hint_thresholds,
            self.config.level_count,
        );

        let level_secrets = self.encrypt_level_secrets(&materials, &hint_setups, &thumbnail_header)?;

        for lang in &self.config.languages {
            self.build_language_bundle(
                lang,
                &verification_keys,
                &materials,
                &hint_setups,
                &level_secrets,
                &thumbnail_header,
            )
            .await?;
        }

        tracing::info!(target: LOG_TARGET, "build complete");
        Ok(())
    }

    async fn build_level_materials(&self, verification_keys: &[VerificationKey]) -> Result<Vec<LevelMaterial>> {
        let tasks = verification_keys.iter().enumerate().map(|(level, vk)| {
            let salt = self.config.game_random_salt.clone();
            let images = Arc::clone(&self.images);
            async move {
                tracing::info!(target: LOG_TARGET, level, "building level material");
                level::build_level_material(&salt, level, vk, images.as_ref())
            }
        });
        join_all(tasks).await.into_iter().collect()
    }

    fn encrypt_level_secrets(
        &self,
        materials: &[LevelMaterial],
        hint_setups: &[HintKeySetup],
        thumbnail_header: &[u8],
    ) -> Result<Vec<Vec<u8>>> {
        materials
            .iter()
            .enumerate()
            .map(|(level, material)| {
                let shares = hints::shares_for_level(hint_setups, level);
                level::encrypt_level_secret(material, &shares, thumbnail_header)
            })
            .collect()
    }

    async fn build_language_bundle(
        &self,
        lang: &str,
        verification_keys: &[VerificationKey],
        materials: &[LevelMaterial],
        hint_setups: &[HintKeySetup],
        level_secrets: &[Vec<u8>],
        thumbnail_header: &[u8],
    ) -> Result<()> {
        tracing::info!(target: LOG_TARGET, lang, "assembling bundle");

        let raw_csv = self.hint_csv.fetch(lang).await?;
        let hint_rows = hints::parse_csv_for_language(&raw_csv);
        let language_salt = derive::language_salt(&self.config.game_random_salt, lang);
        let hint_keys: Vec<[u8; 16]> = (0..hint_setups.len())
            .map(|h| derive::hint_key(&self.config.game_random_salt, h))
            .collect();

        let mut levels = Vec::with_capacity(materials.len());
        for (level, (material, vk)) in materials.iter().zip(verification_keys).enumerate() {
            let level_id = level + 1;
            let hint_strings = hint_rows.get(&level_id).cloned().unwrap_or_default();
            let encrypted = hints::encrypt_level_hints(
                &hint_keys,
                &language_salt,
                &material.level_salt,
                &hint_strings,
                lang,
                level_id,
            )?;
            levels.push(LevelBundle {
                key: material.encrypted_level_key.clone(),
                data: level_secrets[level].clone(),
                public_key: vk.public_key_spki.clone(),
                hints_clear: encrypted.clear,
                hints_encrypted: encrypted.encrypted,
            });
        }

        let game_data = GameData::new(
            levels,
            self.config.hint_thresholds.clone(),
            language_salt.to_vec(),
            thumbnail_header.to_vec(),
            self.config.unlocked_levels,
        );
        let json = game_data.to_json()?;

        let template = self.templates.load(lang)?;
        let rendered = crate::bundle::render_bundle(&template, lang, &json)?;
        self.sink.write(lang, &rendered)
    }
}
