use super::ImageStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockImageStore {
    files: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    fail_after: Option<usize>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-cdn.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            fail_after: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Every upload fails with a storage error.
    pub fn failing(self) -> Self {
        self.failing_after(0)
    }

    /// The first `successes` uploads succeed, every later one fails.
    pub fn failing_after(mut self, successes: usize) -> Self {
        self.fail_after = Some(successes);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    /// Stored bytes and MIME type keyed by returned URL.
    pub fn get_files(&self) -> HashMap<String, (Vec<u8>, String)> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn store_image(&self, index: usize, data: &[u8], mime_type: &str) -> Result<String> {
        let mut count = self.upload_count.lock().unwrap();
        *count += 1;

        if self.fail_after.is_some_and(|successes| *count > successes) {
            return Err(Error::Storage("mock storage unavailable".to_string()));
        }

        let url = format!("{}/image_{}", self.base_url, index);
        self.files
            .lock()
            .unwrap()
            .insert(url.clone(), (data.to_vec(), mime_type.to_string()));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_records_uploads() {
        let store = MockImageStore::new().with_base_url("https://cdn.test".to_string());

        let url = store.store_image(2, b"data", "image/png").await.unwrap();

        assert_eq!(url, "https://cdn.test/image_2");
        assert_eq!(store.get_upload_count(), 1);
        assert_eq!(
            store.get_files().get(&url),
            Some(&(b"data".to_vec(), "image/png".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failing_mock_store() {
        let store = MockImageStore::new().failing();
        let err = store.store_image(0, b"x", "image/png").await.unwrap_err();
        assert!(err.to_string().contains("mock storage unavailable"));
    }

    #[tokio::test]
    async fn test_mock_store_fails_after_successes() {
        let store = MockImageStore::new().failing_after(1);
        assert!(store.store_image(0, b"a", "image/png").await.is_ok());
        assert!(store.store_image(1, b"b", "image/png").await.is_err());
        assert_eq!(store.get_upload_count(), 2);
        assert_eq!(store.get_files().len(), 1);
    }
}
