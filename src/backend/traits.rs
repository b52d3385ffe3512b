//! The document backend boundary (spec.md §1, §5): the gateway's own
//! persistence is out of scope, so every backend call goes through this
//! trait and the concrete database client is swappable.

use crate::domain::request::FilterOptions;
use crate::errors::Result;
use async_trait::async_trait;
use bson::Document as BsonDocument;

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        options: &FilterOptions,
    ) -> Result<(Vec<BsonDocument>, Option<u64>)>;

    async fn insert(&self, collection: &str, document: BsonDocument) -> Result<BsonDocument>;

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: BsonDocument,
    ) -> Result<Option<BsonDocument>>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<BsonDocument>>;

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        document: BsonDocument,
    ) -> Result<BsonDocument>;
}
