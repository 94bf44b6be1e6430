use crate::core::error::StoreError;
use crate::core::ports::PatternLookupGateway;
use crate::models::{ConsumptionPatternSummary, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<AppwriteError> for StoreError {
    fn from(value: AppwriteError) -> Self {
        match value {
            AppwriteError::InvalidResponse(message) => StoreError::InvalidData {
                backend: "appwrite",
                message,
            },
            other => StoreError::Backend {
                backend: "appwrite",
                message: other.to_string(),
            },
        }
    }
}

/// Appwrite client for consumption pattern documents
///
/// Each document holds one analysis period for one user. The lookup keeps the
/// document with the latest `endDate` per user.
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    collection_id: String,
    concurrency: usize,
    client: Client,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collection_id: String,
        concurrency: usize,
        timeout: Duration,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            collection_id,
            concurrency: concurrency.max(1),
            client,
        })
    }

    /// Fetch the newest pattern document of one user
    ///
    /// Every user gets its own `limit(1)` query, so a long history of one user
    /// never hides the latest document of another.
    async fn fetch_latest(&self, user_id: UserId) -> Result<Vec<Value>, AppwriteError> {
        let url = format!(
            "{}/databases/{}/collections/{}/documents?{}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collection_id,
            latest_document_query(user_id)
        );

        tracing::debug!("Fetching latest consumption pattern for user {}", user_id);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(AppwriteError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppwriteError::ApiError(format!(
                "Failed to fetch consumption patterns: {} {}",
                status, body
            )));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents.clone())
    }
}

/// Query string selecting the newest pattern document of one user
pub fn latest_document_query(user_id: UserId) -> String {
    let queries = [
        json!({ "method": "equal", "attribute": "userId", "values": [user_id.0] }),
        json!({ "method": "orderDesc", "attribute": "endDate" }),
        json!({ "method": "limit", "values": [1] }),
    ];

    queries
        .iter()
        .map(|q| format!("queries[]={}", urlencoding::encode(&q.to_string())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Convert an Appwrite document into a pattern summary.
///
/// List attributes are accepted either as native arrays or as JSON encoded
/// strings, since Appwrite has no nested object attributes.
pub fn parse_pattern_document(doc: &Value) -> Result<ConsumptionPatternSummary, AppwriteError> {
    let user_id = doc
        .get("userId")
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .map(UserId)
        .ok_or_else(|| AppwriteError::InvalidResponse("Missing userId".into()))?;

    let end_date = parse_date(doc.get("endDate"))
        .ok_or_else(|| AppwriteError::InvalidResponse(format!("Missing endDate for user {}", user_id)))?;

    Ok(ConsumptionPatternSummary {
        user_id,
        main_type: decode_items(doc.get("mainType"))?,
        keyword: decode_items(doc.get("keyword"))?,
        food: decode_items(doc.get("food"))?,
        start_date: parse_date(doc.get("startDate")),
        end_date,
    })
}

fn parse_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn decode_items<T: DeserializeOwned>(value: Option<&Value>) -> Result<Vec<T>, AppwriteError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(raw)) => serde_json::from_str(raw),
        Some(other) => serde_json::from_value(other.clone()),
    };

    parsed.map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse pattern items: {}", e)))
}

/// Fold documents into the latest summary per user; unreadable documents are skipped
pub fn latest_per_user(documents: Vec<Value>) -> HashMap<UserId, ConsumptionPatternSummary> {
    let mut latest: HashMap<UserId, ConsumptionPatternSummary> = HashMap::new();

    for doc in &documents {
        let summary = match parse_pattern_document(doc) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Skipping consumption pattern document: {}", e);
                continue;
            }
        };

        match latest.get(&summary.user_id) {
            Some(existing) if existing.end_date >= summary.end_date => {}
            _ => {
                latest.insert(summary.user_id, summary);
            }
        }
    }

    latest
}

#[async_trait]
impl PatternLookupGateway for AppwriteClient {
    async fn latest_for_many(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ConsumptionPatternSummary>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Completion order does not matter, the merge is keyed
        let pages: Vec<Vec<Value>> = stream::iter(user_ids.iter().copied())
            .map(|user_id| async move { self.fetch_latest(user_id).await })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let documents: Vec<Value> = pages.into_iter().flatten().collect();
        let latest = latest_per_user(documents);

        tracing::debug!(
            "Found consumption patterns for {} of {} users",
            latest.len(),
            user_ids.len()
        );

        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: &str) -> AppwriteClient {
        AppwriteClient::new(
            url.to_string(),
            "test-key".to_string(),
            "test-project".to_string(),
            "mango".to_string(),
            "consumption_patterns".to_string(),
            2,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn document(user_id: i64, main_type: &str, end_date: &str) -> Value {
        json!({
            "$id": format!("doc-{}-{}", user_id, end_date),
            "userId": user_id,
            "mainType": format!(r#"[{{"name":"{}","prob":0.7}}]"#, main_type),
            "keyword": [{ "name": "커피", "score": 1.5 }],
            "food": null,
            "startDate": "2025-01-01T00:00:00.000+00:00",
            "endDate": end_date,
        })
    }

    #[test]
    fn test_parse_document_accepts_strings_and_arrays() {
        let summary = parse_pattern_document(&document(3, "카페", "2025-02-01T00:00:00.000+00:00")).unwrap();

        assert_eq!(summary.user_id, UserId(3));
        assert_eq!(summary.best_main_type(), "카페");
        assert_eq!(summary.top_keywords(3), vec!["커피"]);
        assert_eq!(summary.best_food(), "기타");
        assert!(summary.start_date.is_some());
    }

    #[test]
    fn test_parse_document_requires_end_date() {
        let doc = json!({ "userId": 3, "mainType": [] });
        assert!(matches!(parse_pattern_document(&doc), Err(AppwriteError::InvalidResponse(_))));
    }

    #[test]
    fn test_latest_per_user_keeps_max_end_date() {
        let docs = vec![
            document(1, "여행", "2025-01-31T00:00:00.000+00:00"),
            document(1, "카페", "2025-03-31T00:00:00.000+00:00"),
            document(1, "쇼핑", "2025-02-28T00:00:00.000+00:00"),
            json!({ "userId": "broken" }),
            document(2, "문화", "2024-12-31T00:00:00.000+00:00"),
        ];

        let latest = latest_per_user(docs);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&UserId(1)].best_main_type(), "카페");
        assert_eq!(latest[&UserId(2)].best_main_type(), "문화");
    }

    const DOCUMENTS_PATH: &str = r"^/databases/mango/collections/consumption_patterns/documents$";

    fn user_filter(user_id: i64) -> Matcher {
        let equal = json!({ "method": "equal", "attribute": "userId", "values": [user_id] });
        Matcher::Regex(urlencoding::encode(&equal.to_string()).into_owned())
    }

    fn latest_only() -> Matcher {
        let limit = json!({ "method": "limit", "values": [1] });
        Matcher::Regex(urlencoding::encode(&limit.to_string()).into_owned())
    }

    #[test]
    fn test_latest_document_query_shape() {
        let query = latest_document_query(UserId(42));
        let decoded: Vec<Value> = query
            .split('&')
            .map(|part| {
                let raw = part.strip_prefix("queries[]=").unwrap();
                serde_json::from_str(&urlencoding::decode(raw).unwrap()).unwrap()
            })
            .collect();

        assert_eq!(
            decoded,
            vec![
                json!({ "method": "equal", "attribute": "userId", "values": [42] }),
                json!({ "method": "orderDesc", "attribute": "endDate" }),
                json!({ "method": "limit", "values": [1] }),
            ]
        );
    }

    #[tokio::test]
    async fn test_latest_for_many_omits_users_without_documents() {
        let mut server = mockito::Server::new_async().await;
        let with_pattern = server
            .mock("GET", Matcher::Regex(DOCUMENTS_PATH.to_string()))
            .match_query(Matcher::AllOf(vec![user_filter(5), latest_only()]))
            .match_header("x-appwrite-key", "test-key")
            .match_header("x-appwrite-project", "test-project")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "total": 2, "documents": [document(5, "카페", "2025-03-31T00:00:00.000+00:00")] }).to_string())
            .create_async()
            .await;
        let without_pattern = server
            .mock("GET", Matcher::Regex(DOCUMENTS_PATH.to_string()))
            .match_query(Matcher::AllOf(vec![user_filter(6), latest_only()]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total":0,"documents":[]}"#)
            .create_async()
            .await;

        let found = client(&server.url())
            .latest_for_many(&[UserId(5), UserId(6)])
            .await
            .unwrap();

        with_pattern.assert_async().await;
        without_pattern.assert_async().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[&UserId(5)].best_main_type(), "카페");
        assert!(!found.contains_key(&UserId(6)));
    }

    #[tokio::test]
    async fn test_long_history_does_not_hide_other_users() {
        let mut server = mockito::Server::new_async().await;
        // User 1 has 30 periods, all newer than user 2's only period
        let busy = server
            .mock("GET", Matcher::Regex(DOCUMENTS_PATH.to_string()))
            .match_query(Matcher::AllOf(vec![user_filter(1), latest_only()]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "total": 30, "documents": [document(1, "여행", "2025-06-30T00:00:00.000+00:00")] }).to_string())
            .create_async()
            .await;
        let quiet = server
            .mock("GET", Matcher::Regex(DOCUMENTS_PATH.to_string()))
            .match_query(Matcher::AllOf(vec![user_filter(2), latest_only()]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "total": 1, "documents": [document(2, "문화", "2024-01-31T00:00:00.000+00:00")] }).to_string())
            .create_async()
            .await;

        let found = client(&server.url())
            .latest_for_many(&[UserId(1), UserId(2)])
            .await
            .unwrap();

        busy.assert_async().await;
        quiet.assert_async().await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[&UserId(1)].best_main_type(), "여행");
        assert_eq!(found[&UserId(2)].best_main_type(), "문화");
    }

    #[tokio::test]
    async fn test_one_request_per_user() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(DOCUMENTS_PATH.to_string()))
            .match_query(latest_only())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total":0,"documents":[]}"#)
            .expect(25)
            .create_async()
            .await;

        let ids: Vec<UserId> = (1..=25).map(UserId).collect();
        let found = client(&server.url()).latest_for_many(&ids).await.unwrap();

        mock.assert_async().await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = client(&server.url()).latest_for(UserId(1)).await;

        assert!(matches!(result, Err(StoreError::Backend { backend: "appwrite", .. })));
    }

    #[tokio::test]
    async fn test_empty_lookup_skips_network() {
        let found = client("http://127.0.0.1:1").latest_for_many(&[]).await.unwrap();
        assert!(found.is_empty());
    }
}
