//! Production `DocumentBackend` backed by the MongoDB driver. The gateway's
//! own persistence is out of scope (spec.md §1 Non-goals), but the document
//! model (ordered fields, `_id`, embedded sub-entity arrays) maps directly
//! onto MongoDB collections, so this is the default production backend.

use crate::backend::traits::DocumentBackend;
use crate::domain::document::ID_FIELD;
use crate::domain::request::{FilterOptions, SortDirection};
use crate::errors::Result;
use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::Database;

#[derive(Debug, Clone)]
pub struct MongoBackend {
    database: Database,
}

impl MongoBackend {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn find_options(options: &FilterOptions) -> FindOptions {
        let sort = if options.sort.is_empty() {
            None
        } else {
            let mut sort_doc = BsonDocument::new();
            for (field, direction) in &options.sort {
                sort_doc.insert(field, if *direction == SortDirection::Descending { -1 } else { 1 });
            }
            Some(sort_doc)
        };

        FindOptions::builder()
            .sort(sort)
            .limit(options.limit.map(|l| l as i64))
            .skip(options.skip)
            .build()
    }
}

#[async_trait]
impl DocumentBackend for MongoBackend {
    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        options: &FilterOptions,
    ) -> Result<(Vec<BsonDocument>, Option<u64>)> {
        let coll = self.database.collection::<BsonDocument>(collection);
        let total = coll.count_documents(filter.clone()).await?;
        let mut cursor = coll.find(filter).with_options(Self::find_options(options)).await?;

        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }

        Ok((documents, Some(total)))
    }

    async fn insert(&self, collection: &str, document: BsonDocument) -> Result<BsonDocument> {
        let coll = self.database.collection::<BsonDocument>(collection);
        let result = coll.insert_one(document.clone()).await?;
        let mut document = document;
        if !document.contains_key(ID_FIELD) {
            document.insert(ID_FIELD, result.inserted_id);
        }
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: BsonDocument,
    ) -> Result<Option<BsonDocument>> {
        let coll = self.database.collection::<BsonDocument>(collection);
        let filter = id_filter(id);
        coll.update_one(filter.clone(), doc! { "$set": patch }).await?;
        Ok(coll.find_one(filter).await?)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let coll = self.database.collection::<BsonDocument>(collection);
        let result = coll.delete_one(id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<BsonDocument>> {
        let coll = self.database.collection::<BsonDocument>(collection);
        Ok(coll.find_one(id_filter(id)).await?)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        document: BsonDocument,
    ) -> Result<BsonDocument> {
        match id {
            Some(id) => {
                let coll = self.database.collection::<BsonDocument>(collection);
                let filter = id_filter(id);
                coll.update_one(filter.clone(), doc! { "$set": document.clone() })
                    .upsert(true)
                    .await?;
                Ok(coll.find_one(filter).await?.unwrap_or(document))
            }
            None => self.insert(collection, document).await,
        }
    }
}

fn id_filter(id: &str) -> BsonDocument {
    match bson::oid::ObjectId::parse_str(id) {
        Ok(oid) => doc! { ID_FIELD: oid },
        Err(_) => doc! { ID_FIELD: Bson::String(id.to_string()) },
    }
}
