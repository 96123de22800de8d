//! Gemini `generateContent` protocol: request assembly, response
//! normalization and the HTTP client that carries them.

pub mod assemble;
pub mod client;
pub mod mock;
pub mod normalize;
pub mod types;

pub use assemble::{assemble, connection_test, to_wire};
pub use client::GeminiClient;
pub use mock::MockGenerationClient;
pub use normalize::normalize;

use crate::settings::Endpoint;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use types::WireRequest;

/// One round trip to the remote generation API.
///
/// Returns the raw JSON body; interpretation is left to [`normalize`].
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_content(&self, endpoint: &Endpoint, request: &WireRequest) -> Result<Value>;
}
