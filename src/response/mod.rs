//! Response builder (spec.md §4.7): maps orchestrator outcomes to HTTP
//! status codes and JSON bodies.

use crate::domain::response::{QueryOutcome, WriteOutcome};
use axum::http::StatusCode;
use serde_json::{json, Value};

pub fn query_response(outcome: QueryOutcome) -> (StatusCode, Value) {
    match outcome {
        QueryOutcome::Found { documents, total, page } => {
            let mut body = match total {
                Some(total) => json!({ "data": documents, "total": total }),
                None => json!({ "data": documents }),
            };
            if let Some(page) = page {
                body["hasMore"] = json!(page.has_more);
                body["nextCursor"] = json!(page.next_cursor);
            }
            (StatusCode::OK, body)
        }
        QueryOutcome::Rejected(error) => error_response(&error),
    }
}

pub fn write_response(outcome: WriteOutcome) -> (StatusCode, Value) {
    match outcome {
        WriteOutcome::Created { documents, inserted_ids } => (
            StatusCode::CREATED,
            json!({
                "data": documents,
                "affectedCount": inserted_ids.len(),
                "insertedCount": inserted_ids.len(),
                "insertedIds": inserted_ids,
            }),
        ),
        WriteOutcome::Updated { documents, matched_count, modified_count } => (
            StatusCode::OK,
            json!({
                "data": documents,
                "affectedCount": modified_count,
                "matchedCount": matched_count,
                "modifiedCount": modified_count,
            }),
        ),
        WriteOutcome::Deleted { deleted_count } => (
            StatusCode::OK,
            json!({ "affectedCount": deleted_count, "deletedCount": deleted_count }),
        ),
        WriteOutcome::Upserted { was_inserted, document, document_id, matched_count, modified_count } => {
            let status = if was_inserted { StatusCode::CREATED } else { StatusCode::OK };
            let mut body = json!({
                "data": document,
                "wasInserted": was_inserted,
            });
            if let Some(id) = document_id {
                body["documentId"] = id;
            }
            if let Some(matched_count) = matched_count {
                body["matchedCount"] = json!(matched_count);
            }
            if let Some(modified_count) = modified_count {
                body["modifiedCount"] = json!(modified_count);
            }
            (status, body)
        }
        WriteOutcome::Rejected(error) => error_response(&error),
    }
}

fn error_response(error: &crate::errors::GatewayError) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = json!({ "error": error.to_string() });
    if let Some(details) = error.details() {
        body["details"] = json!(details);
    }
    (status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GatewayError;

    #[test]
    fn found_becomes_200_with_data_and_total() {
        let (status, body) =
            query_response(QueryOutcome::Found { documents: vec![], total: Some(0), page: None });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert!(body.get("hasMore").is_none());
    }

    #[test]
    fn sequence_page_includes_has_more_and_next_cursor() {
        let (status, body) = query_response(QueryOutcome::Found {
            documents: vec![],
            total: None,
            page: Some(crate::domain::response::SequencePageResult { has_more: true, next_cursor: Some(5) }),
        });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasMore"], true);
        assert_eq!(body["nextCursor"], 5);
    }

    #[test]
    fn rejected_query_carries_details() {
        let (status, body) = query_response(QueryOutcome::Rejected(GatewayError::filter_validation(
            vec!["bad field".to_string()],
        )));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0], "bad field");
    }

    #[test]
    fn created_is_201() {
        let (status, body) = write_response(WriteOutcome::Created { documents: vec![], inserted_ids: vec![] });
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["insertedCount"], 0);
    }

    #[test]
    fn updated_carries_matched_and_modified_counts() {
        let (status, body) =
            write_response(WriteOutcome::Updated { documents: vec![], matched_count: 3, modified_count: 2 });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matchedCount"], 3);
        assert_eq!(body["modifiedCount"], 2);
    }

    #[test]
    fn upsert_that_inserted_is_201_with_document_id() {
        let (status, body) = write_response(WriteOutcome::Upserted {
            was_inserted: true,
            document: Default::default(),
            document_id: Some(json!("abc")),
            matched_count: None,
            modified_count: None,
        });
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["wasInserted"], true);
        assert_eq!(body["documentId"], "abc");
    }

    #[test]
    fn upsert_that_matched_is_200_with_matched_count() {
        let (status, body) = write_response(WriteOutcome::Upserted {
            was_inserted: false,
            document: Default::default(),
            document_id: None,
            matched_count: Some(1),
            modified_count: Some(1),
        });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["wasInserted"], false);
        assert_eq!(body["matchedCount"], 1);
        assert!(body.get("documentId").is_none());
    }

    #[test]
    fn rejected_write_without_details_has_no_details_key() {
        let (_, body) = write_response(WriteOutcome::Rejected(GatewayError::internal("boom")));
        assert!(body.get("details").is_none());
    }
}
