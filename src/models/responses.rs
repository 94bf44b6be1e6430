use serde::{Deserialize, Serialize};
use crate::models::domain::SwipeCandidate;

/// Response for the swipe list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeListResponse {
    pub status: String,
    pub message: String,
    pub data: Vec<SwipeCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

/// Pagination metadata, present only when the caller asked for a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub size: u32,
    #[serde(rename = "totalElements")]
    pub total_elements: usize,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub retryable: bool,
}
