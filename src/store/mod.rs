//! Document store consumed by the pipeline and the query API.
//!
//! Documents are JSON values keyed by string within named collections.
//! Implementations must accept concurrent writers to disjoint keys.

pub mod file;
pub mod memory;
pub mod query;
pub mod repository;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use query::{Filter, FilterOp, Query};
pub use repository::{IntentQuery, IntentStats, INTENTS, JOBS, LISTINGS};

use crate::error::PersistenceResult;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Insert or overwrite the document at `key`.
    async fn upsert(&self, collection: &str, key: &str, document: Value) -> PersistenceResult<()>;

    async fn get(&self, collection: &str, key: &str) -> PersistenceResult<Option<Value>>;

    /// Documents matching every filter, ordered and limited per `query`.
    async fn query(&self, collection: &str, query: &Query) -> PersistenceResult<Vec<Value>>;
}
