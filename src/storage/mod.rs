//! Storage for generated images
//!
//! Turns normalized image bytes into something a client can fetch: a path
//! under a public directory, an S3-compatible CDN URL, or an inline data URL.

pub mod cdn;
pub mod data_url;
pub mod file;
pub mod mock;

pub use cdn::CdnImageStore;
pub use data_url::DataUrlStore;
pub use file::FileImageStore;
pub use mock::MockImageStore;

use crate::mime::extension_for_mime;
use crate::Result;
use async_trait::async_trait;
use chrono::Local;
use uuid::Uuid;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists one image and returns the URL it can be served from.
    ///
    /// `index` is the position of the item in the normalized result list.
    async fn store_image(&self, index: usize, data: &[u8], mime_type: &str) -> Result<String>;
}

/// `output_<timestamp>_<index>_<suffix>.<ext>`; unique even within one second.
pub fn output_filename(index: usize, mime_type: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "output_{}_{}_{}.{}",
        timestamp,
        index,
        &suffix[..8],
        extension_for_mime(mime_type)
    )
}
