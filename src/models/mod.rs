// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, CompatibilityResult, ConsumptionPatternSummary, FoodItem, Gender, GeoPoint,
    KeywordItem, SwipeCandidate, TypeItem, UserId, UserProfile, TOP_KEYWORD_COUNT,
    UNKNOWN_AFFINITY,
};
pub use requests::SwipeQuery;
pub use responses::{ErrorResponse, HealthResponse, PageInfo, SwipeListResponse};
