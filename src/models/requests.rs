use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string of the swipe list endpoint
///
/// `GET /api/v1/match/swipe?userId=7&category=카페&page=0&size=20`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: i64,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub category: Option<String>,
    /// Zero-based page index
    #[serde(default)]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_query_validation() {
        let ok = SwipeQuery { user_id: 7, category: None, page: None, size: Some(20) };
        assert!(ok.validate().is_ok());

        let bad_id = SwipeQuery { user_id: 0, category: None, page: None, size: None };
        assert!(bad_id.validate().is_err());

        let bad_size = SwipeQuery { user_id: 7, category: None, page: Some(1), size: Some(500) };
        assert!(bad_size.validate().is_err());
    }
}
