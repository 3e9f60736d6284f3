//! Keyed record storage for users, groups and expenses.
//!
//! The service only needs get, put, delete and a full scan. Two backends
//! exist: [`MemoryRepository`] for local runs and tests, and
//! [`MongoRepository`] for MongoDB.

pub mod memory;
pub mod mongo;

use crate::error::Result;
use async_trait::async_trait;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

#[async_trait]
pub trait Repository<T: Send + Sync>: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<T>>;
    /// Inserts or fully replaces the record stored under `key`.
    async fn put(&self, key: &str, record: &T) -> Result<()>;
    /// Returns whether a record was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn scan(&self) -> Result<Vec<T>>;
}
