use super::HistoryStore;
use crate::models::HistoryRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockHistoryStore {
    records: Arc<Mutex<Vec<HistoryRecord>>>,
    fail_writes: bool,
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            fail_writes: false,
        }
    }

    /// Every `append` fails, as an unavailable database would.
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get_records(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for MockHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MockHistoryStore {
    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage("mock history unavailable".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}
