//! Wire payloads for the `generateContent` request body.
//!
//! Responses are deliberately not typed here; see [`super::normalize`].

use serde::Serialize;

pub const MODALITY_TEXT: &str = "TEXT";
pub const MODALITY_IMAGE: &str = "IMAGE";

/// Top-level `generateContent` request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct WireRequest {
    pub contents: Vec<WireContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: WireGenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireContent {
    pub parts: Vec<WirePart>,
}

/// Untagged union of text and inline media content parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WirePart {
    Text { text: String },
    InlineData { inline_data: WireBlob },
}

/// Base64 inline payload. Requests use the snake_case spelling.
#[derive(Debug, Clone, Serialize)]
pub struct WireBlob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGenerationConfig {
    pub response_modalities: Vec<String>,
    pub image_config: WireImageConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImageConfig {
    pub aspect_ratio: String,
    pub image_size: String,
}
