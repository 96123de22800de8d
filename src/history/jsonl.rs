use super::HistoryStore;
use crate::models::HistoryRecord;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only JSON lines file, one [`HistoryRecord`] per line.
pub struct JsonlHistoryStore {
    path: PathBuf,
    // Serializes appends and clears from concurrent requests
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Appended history record {}", record.id);
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<HistoryRecord> = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable history line: {}", e);
                    None
                }
            })
            .collect();

        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Cleared history at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
