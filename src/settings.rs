//! API key and endpoint settings
//!
//! Settings persist as a small JSON document (`{"api_key", "api_url"}`) that
//! is layered over the process-wide defaults from [`Config`]. A request may
//! override either value; the resolved pair is an [`Endpoint`].

use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MASK_CHAR: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_url: String,
}

/// Partial settings: a stored file, a CLI update, or a per-request override.
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverride {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Fully resolved credentials for one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub api_key: String,
    pub api_url: String,
}

/// What the front end may display. Never carries the raw key.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub api_key_masked: Option<String>,
    pub api_url: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
        }
    }

    /// Returns a copy with every non-empty field of `layer` applied.
    pub fn merged(&self, layer: &SettingsOverride) -> Self {
        Self {
            api_key: non_empty(&layer.api_key)
                .map(str::to_string)
                .or_else(|| self.api_key.clone()),
            api_url: non_empty(&layer.api_url)
                .map(str::to_string)
                .unwrap_or_else(|| self.api_url.clone()),
        }
    }

    /// Applies a per-request override and checks that a key is available.
    pub fn resolve(&self, request: &SettingsOverride) -> Result<Endpoint> {
        let merged = self.merged(request);
        let api_key = merged
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Validation(
                    "API key is not configured. Run `settings set --api-key ...`".to_string(),
                )
            })?;

        Ok(Endpoint {
            api_key,
            api_url: merged.api_url,
        })
    }

    pub fn masked_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_key)
    }

    pub fn view(&self) -> SettingsView {
        SettingsView {
            api_key_masked: self.masked_key(),
            api_url: self.api_url.clone(),
        }
    }
}

/// Keeps the first and last four characters; short keys are masked entirely.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return MASK_CHAR.to_string().repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!(
        "{}{}{}",
        head,
        MASK_CHAR.to_string().repeat(chars.len() - 8),
        tail
    )
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings>;
    /// Applies the non-empty fields of `update`, persists, and returns the
    /// new settings.
    async fn update(&self, update: &SettingsOverride) -> Result<Settings>;
}

/// Settings persisted to a JSON file on top of process-wide defaults.
pub struct FileSettingsStore {
    path: PathBuf,
    defaults: Settings,
}

impl FileSettingsStore {
    pub fn new(path: &Path, defaults: Settings) -> Self {
        Self {
            path: path.to_path_buf(),
            defaults,
        }
    }

    async fn read_stored(&self) -> SettingsOverride {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SettingsOverride::default(),
            Err(e) => {
                tracing::warn!(
                    "Could not read settings file {}: {}. Using defaults.",
                    self.path.display(),
                    e
                );
                return SettingsOverride::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                "Ignoring malformed settings file {}: {}",
                self.path.display(),
                e
            );
            SettingsOverride::default()
        })
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Settings> {
        let stored = self.read_stored().await;
        Ok(self.defaults.merged(&stored))
    }

    async fn update(&self, update: &SettingsOverride) -> Result<Settings> {
        let settings = self.load().await?.merged(update);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&settings)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::info!("Saved settings to {}", self.path.display());
        Ok(settings)
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Clone)]
pub struct MemorySettingsStore {
    settings: Arc<Mutex<Settings>>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(Mutex::new(settings)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn update(&self, update: &SettingsOverride) -> Result<Settings> {
        let mut settings = self.settings.lock().unwrap();
        let merged = settings.merged(update);
        *settings = merged.clone();
        Ok(merged)
    }
}
