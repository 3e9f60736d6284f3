use super::Repository;
use crate::error::Result;
use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::ReplaceOptions;
use mongodb::{Client, Collection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// A MongoDB collection whose documents are looked up by one string field.
pub struct MongoRepository<T: Send + Sync> {
    collection: Collection<T>,
    key_field: &'static str,
}

impl<T: Send + Sync> MongoRepository<T> {
    pub fn new(client: &Client, database: &str, collection: &str, key_field: &'static str) -> Self {
        info!(database, collection, key_field, "using MongoDB collection");
        Self {
            collection: client.database(database).collection(collection),
            key_field,
        }
    }

    fn filter(&self, key: &str) -> Document {
        let mut filter = Document::new();
        filter.insert(self.key_field, key);
        filter
    }
}

#[async_trait]
impl<T> Repository<T> for MongoRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<T>> {
        Ok(self.collection.find_one(self.filter(key), None).await?)
    }

    async fn put(&self, key: &str, record: &T) -> Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(self.filter(key), record, options)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = self.collection.delete_one(self.filter(key), None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn scan(&self) -> Result<Vec<T>> {
        let cursor = self.collection.find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }
}
