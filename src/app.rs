//! Per-request orchestration: settings, assembly, upstream call,
//! normalization, storage and history.

use crate::gemini::{self, GeminiClient, GenerationService};
use crate::history::{HistoryStore, JsonlHistoryStore};
use crate::models::{
    AspectRatio, Config, DeliveredItem, HistoryRecord, ImageSize, ResultItem, StorageMode,
    UploadedImage,
};
use crate::settings::{FileSettingsStore, Settings, SettingsOverride, SettingsStore, SettingsView};
use crate::storage::{CdnImageStore, DataUrlStore, FileImageStore, ImageStore};
use crate::{Error, Result};
use serde_json::Value;
use tracing::{info, warn};

const CONNECTION_TEST_PROMPT: &str = "Test API connection";

/// Everything the front end collected for one generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateInput {
    pub prompt: String,
    pub images: Vec<UploadedImage>,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub overrides: SettingsOverride,
}

/// Relays generation requests to the remote API and delivers the results.
pub struct Relay {
    generator: Box<dyn GenerationService>,
    settings: Box<dyn SettingsStore>,
    images: Box<dyn ImageStore>,
    history: Option<Box<dyn HistoryStore>>,
    max_upload_bytes: usize,
}

/// Injectable service bundle used to construct [`Relay`] in tests/harnesses.
pub struct RelayServices {
    pub generator: Box<dyn GenerationService>,
    pub settings: Box<dyn SettingsStore>,
    pub images: Box<dyn ImageStore>,
    pub history: Option<Box<dyn HistoryStore>>,
}

impl Relay {
    /// Build a relay from concrete service dependencies.
    pub fn with_services(services: RelayServices, max_upload_bytes: usize) -> Self {
        Self {
            generator: services.generator,
            settings: services.settings,
            images: services.images,
            history: services.history,
            max_upload_bytes,
        }
    }

    /// Construct a relay from environment configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let generator = Box::new(GeminiClient::new(config.timeout)?);
        let settings = Box::new(FileSettingsStore::new(
            &config.settings_file,
            Settings::from_config(config),
        ));

        let images: Box<dyn ImageStore> = match config.storage {
            StorageMode::File => {
                info!("Storing images under {}", config.output_dir.display());
                Box::new(FileImageStore::new(&config.output_dir, &config.public_prefix)?)
            }
            StorageMode::DataUrl => {
                info!("Returning images inline as data URLs");
                Box::new(DataUrlStore::new())
            }
            StorageMode::Cdn => {
                info!("Uploading images to CDN bucket {}", config.cdn_bucket);
                let (Some(access_key_id), Some(secret_access_key)) = (
                    config.cdn_access_key_id.clone(),
                    config.cdn_secret_access_key.clone(),
                ) else {
                    return Err(Error::Validation(
                        "CDN storage requires CDN_ACCESS_KEY_ID and CDN_SECRET_ACCESS_KEY"
                            .to_string(),
                    ));
                };
                Box::new(
                    CdnImageStore::new(
                        access_key_id,
                        secret_access_key,
                        config.cdn_endpoint.clone(),
                        config.cdn_bucket.clone(),
                        config.cdn_base_url.clone(),
                    )
                    .await?,
                )
            }
        };

        let history = config.history_file.as_deref().map(|path| {
            info!("Recording history in {}", path.display());
            Box::new(JsonlHistoryStore::new(path)) as Box<dyn HistoryStore>
        });

        Ok(Self::with_services(
            RelayServices {
                generator,
                settings,
                images,
                history,
            },
            config.max_upload_bytes,
        ))
    }

    /// Runs one generation and returns the delivered results in response
    /// order.
    pub async fn generate(&self, input: &GenerateInput) -> Result<Vec<DeliveredItem>> {
        let upload_bytes: usize = input.images.iter().map(|i| i.bytes.len()).sum();
        if upload_bytes > self.max_upload_bytes {
            return Err(Error::Validation(format!(
                "Uploaded images total {} bytes, above the {} byte limit",
                upload_bytes, self.max_upload_bytes
            )));
        }

        let request = gemini::assemble(
            &input.prompt,
            &input.images,
            input.aspect_ratio,
            input.image_size,
        )?;
        let skipped = input.images.len() - request.image_count();
        if skipped > 0 {
            info!("Skipped {} uploads with unsupported file types", skipped);
        }

        let endpoint = self.settings.load().await?.resolve(&input.overrides)?;

        info!(
            "Requesting generation with {} reference images (aspect {}, size {})",
            request.image_count(),
            request.aspect_ratio,
            request.image_size
        );
        let body = self
            .generator
            .generate_content(&endpoint, &gemini::to_wire(&request))
            .await?;

        let items = gemini::normalize(&body)?;
        info!("Generation returned {} result items", items.len());

        let delivered = self.deliver(items).await?;

        if let Some(history) = &self.history {
            let record = HistoryRecord::new(&request, &input.prompt, delivered.clone());
            if let Err(e) = history.append(&record).await {
                warn!("Failed to record history: {}", e);
            }
        }

        Ok(delivered)
    }

    async fn deliver(&self, items: Vec<ResultItem>) -> Result<Vec<DeliveredItem>> {
        let mut delivered = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let item = match item {
                ResultItem::Text { content } => DeliveredItem::Text { content },
                ResultItem::Image { bytes, mime_type } => {
                    match self.images.store_image(index, &bytes, &mime_type).await {
                        Ok(url) => DeliveredItem::Image { url },
                        Err(e) => {
                            warn_unreferenced(index, &delivered);
                            return Err(e);
                        }
                    }
                }
            };
            delivered.push(item);
        }
        Ok(delivered)
    }

    /// Sends a text-only probe and returns the raw response body.
    pub async fn ping(&self, overrides: &SettingsOverride) -> Result<Value> {
        let endpoint = self.settings.load().await?.resolve(overrides)?;
        info!("Testing API connection to {}", endpoint.api_url);

        self.generator
            .generate_content(&endpoint, &gemini::connection_test(CONNECTION_TEST_PROMPT))
            .await
    }

    pub async fn settings_view(&self) -> Result<SettingsView> {
        Ok(self.settings.load().await?.view())
    }

    pub async fn update_settings(&self, update: &SettingsOverride) -> Result<SettingsView> {
        Ok(self.settings.update(update).await?.view())
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        match &self.history {
            Some(history) => history.list(limit).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn clear_history(&self) -> Result<()> {
        match &self.history {
            Some(history) => history.clear().await,
            None => Ok(()),
        }
    }
}

/// Images stored before a later storage failure are left in place.
fn warn_unreferenced(failed_index: usize, delivered: &[DeliveredItem]) {
    let stored: Vec<&str> = delivered
        .iter()
        .filter_map(|item| match item {
            DeliveredItem::Image { url } => Some(url.as_str()),
            DeliveredItem::Text { .. } => None,
        })
        .collect();
    if !stored.is_empty() {
        warn!(
            "Storing result {} failed, leaving {} stored images unreferenced: {}",
            failed_index,
            stored.len(),
            stored.join(", ")
        );
    }
}
