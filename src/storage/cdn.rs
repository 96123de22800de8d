use super::{output_filename, ImageStore};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

const KEY_PREFIX: &str = "outputs";

/// Uploads images to an S3-compatible bucket (DigitalOcean Spaces, MinIO, …)
/// with a public-read ACL.
pub struct CdnImageStore {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl CdnImageStore {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        bucket: String,
        base_url: String,
    ) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "image-relay-cdn",
        );

        // Spaces ignores the region, but the SDK requires one
        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .load()
            .await;

        Ok(Self {
            client: S3Client::new(&config),
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_key(filename: &str) -> String {
        format!("{}/{}", KEY_PREFIX, filename)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ImageStore for CdnImageStore {
    async fn store_image(&self, index: usize, data: &[u8], mime_type: &str) -> Result<String> {
        let key = Self::object_key(&output_filename(index, mime_type));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(mime_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to upload {}: {}", key, e)))?;

        tracing::info!("Uploaded generated image to {}", key);
        Ok(self.public_url(&key))
    }
}
