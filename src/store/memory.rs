use super::Repository;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct MemoryRepository<T> {
    records: RwLock<HashMap<String, T>>,
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Repository<T> for MemoryRepository<T>
where
    T: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<T>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, record: &T) -> Result<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn scan(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_put_get_delete() {
        let repo: MemoryRepository<String> = MemoryRepository::new();
        repo.put("a", &"first".to_string()).await.unwrap();
        repo.put("a", &"second".to_string()).await.unwrap();
        assert_eq!(repo.get("a").await.unwrap(), Some("second".to_string()));
        assert_eq!(repo.scan().await.unwrap().len(), 1);
        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        assert_eq!(repo.get("a").await.unwrap(), None);
    }
}
