//! In-memory document backend: the test/dev double the test suite and
//! local runs exercise end to end (spec.md §5 supplement).

use crate::backend::traits::DocumentBackend;
use crate::domain::document::{value_as_comparable, ID_FIELD};
use crate::domain::request::{FilterOptions, SortDirection};
use crate::errors::Result;
use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    collections: DashMap<String, Vec<BsonDocument>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(doc: &BsonDocument, filter: &BsonDocument) -> bool {
        filter.iter().all(|(field, predicate)| eval_predicate(doc.get(field), predicate))
    }
}

fn eval_predicate(actual: Option<&Bson>, predicate: &Bson) -> bool {
    match predicate {
        Bson::Document(ops) if ops.keys().all(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, operand)| eval_operator(actual, op, operand))
        }
        other => actual == Some(other),
    }
}

fn eval_operator(actual: Option<&Bson>, op: &str, operand: &Bson) -> bool {
    match op {
        "$ne" => actual != Some(operand),
        "$gt" => compare(actual, operand).is_some_and(|o| o == std::cmp::Ordering::Greater),
        "$gte" => compare(actual, operand).is_some_and(|o| o != std::cmp::Ordering::Less),
        "$lt" => compare(actual, operand).is_some_and(|o| o == std::cmp::Ordering::Less),
        "$lte" => compare(actual, operand).is_some_and(|o| o != std::cmp::Ordering::Greater),
        "$in" => operand.as_array().is_some_and(|a| actual.is_some_and(|v| a.contains(v))),
        "$nin" => operand.as_array().is_some_and(|a| !actual.is_some_and(|v| a.contains(v))),
        "$exists" => operand.as_bool().unwrap_or(true) == actual.is_some(),
        "$regex" => match (actual.and_then(Bson::as_str), operand.as_str()) {
            (Some(value), Some(pattern)) => {
                regex::Regex::new(pattern).is_ok_and(|re| re.is_match(value))
            }
            _ => false,
        },
        "$not" => !eval_predicate(actual, operand),
        "$type" => operand.as_i64().is_some_and(|code| actual.is_some_and(|v| bson_type_code(v) == code)),
        "$size" => match (actual.and_then(Bson::as_array), operand.as_i64()) {
            (Some(array), Some(len)) => array.len() as i64 == len,
            _ => false,
        },
        "$all" => match (actual.and_then(Bson::as_array), operand.as_array()) {
            (Some(array), Some(wanted)) => wanted.iter().all(|w| array.contains(w)),
            _ => false,
        },
        "$elemMatch" => match (actual.and_then(Bson::as_array), operand.as_document()) {
            (Some(array), Some(sub_filter)) => array.iter().any(|element| {
                element.as_document().is_some_and(|sub_doc| {
                    sub_filter.iter().all(|(field, predicate)| eval_predicate(sub_doc.get(field), predicate))
                })
            }),
            _ => false,
        },
        _ => false,
    }
}

/// The BSON type code a value reports for `$type` (spec.md §4.3), matching
/// MongoDB's numeric type codes.
fn bson_type_code(value: &Bson) -> i64 {
    match value {
        Bson::Double(_) => 1,
        Bson::String(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::Binary(_) => 5,
        Bson::Undefined => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Null => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) => 12,
        Bson::JavaScriptCode(_) => 13,
        Bson::Symbol(_) => 14,
        Bson::JavaScriptCodeWithScope(_) => 15,
        Bson::Int32(_) => 16,
        Bson::Timestamp(_) => 17,
        Bson::Int64(_) => 18,
        Bson::Decimal128(_) => 19,
        Bson::MinKey => -1,
        Bson::MaxKey => 127,
    }
}

fn compare(actual: Option<&Bson>, operand: &Bson) -> Option<std::cmp::Ordering> {
    match (actual?, operand) {
        (Bson::Int32(a), Bson::Int32(b)) => a.partial_cmp(b),
        (Bson::Int64(a), Bson::Int64(b)) => a.partial_cmp(b),
        (Bson::Double(a), Bson::Double(b)) => a.partial_cmp(b),
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (a, b) => a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b)),
    }
}

fn sort_documents(docs: &mut [BsonDocument], sort: &[(String, SortDirection)]) {
    docs.sort_by(|a, b| {
        for (field, direction) in sort {
            let ordering = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => compare_bson(x, y),
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (None, None) => std::cmp::Ordering::Equal,
            };
            let ordering =
                if *direction == SortDirection::Descending { ordering.reverse() } else { ordering };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

fn compare_bson(a: &Bson, b: &Bson) -> std::cmp::Ordering {
    a.as_f64()
        .zip(b.as_f64())
        .and_then(|(a, b)| a.partial_cmp(&b))
        .unwrap_or_else(|| value_as_comparable(&a.clone().into_relaxed_extjson()).cmp(&value_as_comparable(&b.clone().into_relaxed_extjson())))
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        options: &FilterOptions,
    ) -> Result<(Vec<BsonDocument>, Option<u64>)> {
        let docs = self.collections.get(collection).map(|e| e.value().clone()).unwrap_or_default();
        let mut matched: Vec<BsonDocument> =
            docs.into_iter().filter(|doc| Self::matches(doc, &filter)).collect();

        let total = matched.len() as u64;
        sort_documents(&mut matched, &options.sort);

        let skip = options.skip.unwrap_or(0) as usize;
        let page: Vec<BsonDocument> = matched.into_iter().skip(skip).collect();
        let page = match options.limit {
            Some(limit) => page.into_iter().take(limit as usize).collect(),
            None => page,
        };

        Ok((page, Some(total)))
    }

    async fn insert(&self, collection: &str, mut document: BsonDocument) -> Result<BsonDocument> {
        if !document.contains_key(ID_FIELD) {
            document.insert(ID_FIELD, Bson::String(Uuid::now_v7().to_string()));
        }
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        entries.push(document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: BsonDocument,
    ) -> Result<Option<BsonDocument>> {
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        let found = entries.iter_mut().find(|doc| id_matches(doc, id));
        match found {
            Some(doc) => {
                for (key, value) in patch {
                    doc.insert(key, value);
                }
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        let before = entries.len();
        entries.retain(|doc| !id_matches(doc, id));
        Ok(entries.len() != before)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<BsonDocument>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|entries| entries.iter().find(|doc| id_matches(doc, id)).cloned()))
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        mut document: BsonDocument,
    ) -> Result<BsonDocument> {
        match id {
            Some(id) => {
                if let Some(updated) = self.update(collection, id, document.clone()).await? {
                    Ok(updated)
                } else {
                    document.insert(ID_FIELD, Bson::String(id.to_string()));
                    self.insert(collection, document).await
                }
            }
            None => self.insert(collection, document).await,
        }
    }
}

fn id_matches(doc: &BsonDocument, id: &str) -> bool {
    match doc.get(ID_FIELD) {
        Some(Bson::String(s)) => s == id,
        Some(other) => value_as_comparable(&other.clone().into_relaxed_extjson()) == id,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn insert_assigns_id_when_missing() {
        let backend = InMemoryBackend::new();
        let inserted = backend.insert("widgets", doc! { "name": "gizmo" }).await.unwrap();
        assert!(inserted.contains_key(ID_FIELD));
    }

    #[tokio::test]
    async fn find_by_filter_and_sort() {
        let backend = InMemoryBackend::new();
        backend.insert("widgets", doc! { "_id": "a", "price": 30 }).await.unwrap();
        backend.insert("widgets", doc! { "_id": "b", "price": 10 }).await.unwrap();
        backend.insert("widgets", doc! { "_id": "c", "price": 20 }).await.unwrap();

        let options = FilterOptions {
            sort: vec![("price".to_string(), SortDirection::Ascending)],
            ..Default::default()
        };
        let (docs, total) = backend.find("widgets", doc! {}, &options).await.unwrap();
        assert_eq!(total, Some(3));
        assert_eq!(docs[0].get_str("_id").unwrap(), "b");
        assert_eq!(docs[2].get_str("_id").unwrap(), "a");
    }

    #[tokio::test]
    async fn update_then_delete() {
        let backend = InMemoryBackend::new();
        backend.insert("widgets", doc! { "_id": "a", "price": 10 }).await.unwrap();

        let updated = backend.update("widgets", "a", doc! { "price": 15 }).await.unwrap().unwrap();
        assert_eq!(updated.get_i32("price").unwrap(), 15);

        assert!(backend.delete("widgets", "a").await.unwrap());
        assert!(backend.find_by_id("widgets", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn type_operator_matches_bson_type_code() {
        let backend = InMemoryBackend::new();
        backend.insert("widgets", doc! {"_id": "a", "price": 10i32}).await.unwrap();
        backend.insert("widgets", doc! {"_id": "b", "price": "free"}).await.unwrap();

        let (docs, _) =
            backend.find("widgets", doc! {"price": {"$type": 16}}, &FilterOptions::default()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("_id").unwrap(), "a");
    }

    #[tokio::test]
    async fn size_operator_matches_array_length() {
        let backend = InMemoryBackend::new();
        backend.insert("widgets", doc! {"_id": "a", "tags": ["x", "y"]}).await.unwrap();
        backend.insert("widgets", doc! {"_id": "b", "tags": ["x"]}).await.unwrap();

        let (docs, _) =
            backend.find("widgets", doc! {"tags": {"$size": 2}}, &FilterOptions::default()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("_id").unwrap(), "a");
    }

    #[tokio::test]
    async fn all_operator_requires_every_element_present() {
        let backend = InMemoryBackend::new();
        backend.insert("widgets", doc! {"_id": "a", "tags": ["x", "y", "z"]}).await.unwrap();
        backend.insert("widgets", doc! {"_id": "b", "tags": ["x"]}).await.unwrap();

        let (docs, _) = backend
            .find("widgets", doc! {"tags": {"$all": ["x", "y"]}}, &FilterOptions::default())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("_id").unwrap(), "a");
    }

    #[tokio::test]
    async fn elem_match_finds_array_element_satisfying_sub_filter() {
        let backend = InMemoryBackend::new();
        backend
            .insert("widgets", doc! {"_id": "a", "items": [{"qty": 1}, {"qty": 5}]})
            .await
            .unwrap();
        backend.insert("widgets", doc! {"_id": "b", "items": [{"qty": 1}]}).await.unwrap();

        let (docs, _) = backend
            .find("widgets", doc! {"items": {"$elemMatch": {"qty": {"$gte": 5}}}}, &FilterOptions::default())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("_id").unwrap(), "a");
    }

    #[tokio::test]
    async fn upsert_creates_when_absent_and_updates_when_present() {
        let backend = InMemoryBackend::new();
        let created = backend.upsert("widgets", Some("x"), doc! { "price": 5 }).await.unwrap();
        assert_eq!(created.get_str("_id").unwrap(), "x");

        let updated = backend.upsert("widgets", Some("x"), doc! { "price": 6 }).await.unwrap();
        assert_eq!(updated.get_i32("price").unwrap(), 6);
    }
}
