//! Generation history sink
//!
//! Records each completed generation (prompt, options and delivered results).
//! Writes are best effort from the relay's point of view.

pub mod jsonl;
pub mod mock;

pub use jsonl::JsonlHistoryStore;
pub use mock::MockHistoryStore;

use crate::models::HistoryRecord;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: &HistoryRecord) -> Result<()>;
    /// Most recent records first, at most `limit` of them.
    async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>>;
    async fn clear(&self) -> Result<()>;
}
