//! Data models and structures
//!
//! Defines the request and result shapes that flow through the relay, the
//! history record written after each generation, and environment
//! configuration.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// One unit of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text { text: String },
    Image { bytes: Vec<u8>, mime_type: String },
}

/// A reference image as received from the front end.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide21x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 10] = [
        AspectRatio::Square,
        AspectRatio::Portrait2x3,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait4x5,
        AspectRatio::Landscape5x4,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
        AspectRatio::Ultrawide21x9,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Landscape5x4 => "5:4",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Ultrawide21x9 => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| Error::Validation(format!("Unsupported aspect ratio '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ImageSize::OneK),
            "2K" => Ok(ImageSize::TwoK),
            "4K" => Ok(ImageSize::FourK),
            _ => Err(Error::Validation(format!("Unsupported image size '{}'", s))),
        }
    }
}

/// Ordered content parts plus image options for one `generateContent` call.
///
/// Built only through [`crate::gemini::assemble`], which guarantees the
/// first part is the non-empty prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub parts: Vec<ContentPart>,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
}

impl GenerationRequest {
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, ContentPart::Image { .. }))
            .count()
    }
}

/// One normalized output unit, in the order it was found in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultItem {
    Text { content: String },
    Image { bytes: Vec<u8>, mime_type: String },
}

/// Caller-facing result once image bytes have been handed to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeliveredItem {
    Text { content: String },
    Image { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub reference_images: usize,
    pub results: Vec<DeliveredItem>,
}

impl HistoryRecord {
    pub fn new(request: &GenerationRequest, prompt: &str, results: Vec<DeliveredItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            prompt: prompt.to_string(),
            aspect_ratio: request.aspect_ratio,
            image_size: request.image_size,
            reference_images: request.image_count(),
            results,
        }
    }
}

/// Gateway endpoint used when neither the settings file nor the environment
/// names one.
pub const DEFAULT_API_URL: &str =
    "https://api.laozhang.ai/v1beta/models/gemini-3-pro-image-preview:generateContent";

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    File,
    DataUrl,
    Cdn,
}

impl FromStr for StorageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageMode::File),
            "data-url" | "data_url" | "inline" => Ok(StorageMode::DataUrl),
            "cdn" | "s3" => Ok(StorageMode::Cdn),
            other => Err(Error::Validation(format!(
                "Unknown RELAY_STORAGE '{}'. Expected file, data-url or cdn",
                other
            ))),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub settings_file: PathBuf,
    pub output_dir: PathBuf,
    pub public_prefix: String,
    pub storage: StorageMode,
    pub history_file: Option<PathBuf>,
    pub timeout: Duration,
    pub max_upload_bytes: usize,
    pub cdn_access_key_id: Option<String>,
    pub cdn_secret_access_key: Option<String>,
    pub cdn_endpoint: String,
    pub cdn_bucket: String,
    pub cdn_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            settings_file: PathBuf::from("config.json"),
            output_dir: PathBuf::from("static/outputs"),
            public_prefix: "/static/outputs".to_string(),
            storage: StorageMode::File,
            history_file: Some(PathBuf::from("history.jsonl")),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cdn_access_key_id: None,
            cdn_secret_access_key: None,
            cdn_endpoint: "https://nyc3.digitaloceanspaces.com".to_string(),
            cdn_bucket: "image-relay".to_string(),
            cdn_base_url: "https://cdn.example.com".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let history_disabled = var("RELAY_HISTORY_DISABLED")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            api_key: var("RELAY_API_KEY"),
            api_url: var("RELAY_API_URL").unwrap_or(defaults.api_url),
            settings_file: var("RELAY_SETTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_file),
            output_dir: var("RELAY_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            public_prefix: var("RELAY_PUBLIC_PREFIX").unwrap_or(defaults.public_prefix),
            storage: match var("RELAY_STORAGE") {
                Some(mode) => mode.parse()?,
                None => defaults.storage,
            },
            history_file: if history_disabled {
                None
            } else {
                var("RELAY_HISTORY_FILE")
                    .map(PathBuf::from)
                    .or(defaults.history_file)
            },
            timeout: match var("RELAY_TIMEOUT_SECS") {
                Some(secs) => Duration::from_secs(parse_number("RELAY_TIMEOUT_SECS", &secs)?),
                None => defaults.timeout,
            },
            max_upload_bytes: match var("RELAY_MAX_UPLOAD_BYTES") {
                Some(bytes) => parse_number("RELAY_MAX_UPLOAD_BYTES", &bytes)?,
                None => defaults.max_upload_bytes,
            },
            cdn_access_key_id: var("CDN_ACCESS_KEY_ID"),
            cdn_secret_access_key: var("CDN_SECRET_ACCESS_KEY"),
            cdn_endpoint: var("CDN_ENDPOINT").unwrap_or(defaults.cdn_endpoint),
            cdn_bucket: var("CDN_BUCKET").unwrap_or(defaults.cdn_bucket),
            cdn_base_url: var("CDN_BASE_URL").unwrap_or(defaults.cdn_base_url),
        };

        if config.storage == StorageMode::Cdn
            && (config.cdn_access_key_id.is_none() || config.cdn_secret_access_key.is_none())
        {
            return Err(Error::Validation(
                "RELAY_STORAGE=cdn requires CDN_ACCESS_KEY_ID and CDN_SECRET_ACCESS_KEY"
                    .to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{} must be a whole number, got '{}'", key, value)))
}
