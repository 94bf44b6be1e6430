//! Mango Match - swipe candidate matching service for the Mango dating app
//!
//! Builds a requester's swipe feed from nearby users, their interaction
//! history, consumption pattern summaries and an external compatibility
//! scorer.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    distance::{calculate_bounding_box, haversine_distance},
    MatchError, MatchPorts, SwipeMatcher,
};
pub use models::{ConsumptionPatternSummary, GeoPoint, SwipeCandidate, UserId, UserProfile};
