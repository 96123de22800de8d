use super::ImageStore;
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;

/// Returns images inline as `data:` URLs; nothing touches disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlStore;

impl DataUrlStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageStore for DataUrlStore {
    async fn store_image(&self, _index: usize, data: &[u8], mime_type: &str) -> Result<String> {
        Ok(format!(
            "data:{};base64,{}",
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(data)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_data_url_encoding() {
        let url = DataUrlStore::new()
            .store_image(0, b"A", "image/webp")
            .await
            .unwrap();
        assert_eq!(url, "data:image/webp;base64,QQ==");
    }
}
