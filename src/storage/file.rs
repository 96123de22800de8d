use super::{output_filename, ImageStore};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes images into a directory that a web server exposes under
/// `public_prefix`.
pub struct FileImageStore {
    output_dir: PathBuf,
    public_prefix: String,
}

impl FileImageStore {
    pub fn new(output_dir: &Path, public_prefix: &str) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    async fn store_image(&self, index: usize, data: &[u8], mime_type: &str) -> Result<String> {
        let filename = output_filename(index, mime_type);
        let path = self.output_dir.join(&filename);

        tokio::fs::write(&path, data).await?;
        tracing::info!("Saved generated image to {}", path.display());

        Ok(format!("{}/{}", self.public_prefix, filename))
    }
}
