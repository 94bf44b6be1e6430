//! Collaborators consumed by the swipe pipeline.
//!
//! The PostgreSQL, Appwrite, HTTP scorer and JWT implementations live in
//! `crate::services`; tests plug in in-memory versions.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::core::error::{AuthError, ScorerError, StoreError};
use crate::core::scoring::ScoringProfile;
use crate::models::{CompatibilityResult, ConsumptionPatternSummary, Gender, GeoPoint, UserId, UserProfile};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError>;
}

/// Users within `radius_km` of `origin` whose gender is `gender`,
/// nearest first. Users without a stored location are never returned.
#[async_trait]
pub trait GeoCandidateFinder: Send + Sync {
    async fn find(
        &self,
        origin: GeoPoint,
        radius_km: u32,
        gender: Gender,
    ) -> Result<Vec<UserProfile>, StoreError>;
}

/// Interaction ID sets keyed by a user
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Users `user_id` dismissed
    async fn visited_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError>;

    /// Users `user_id` blocked (outgoing direction only)
    async fn blocked_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError>;

    /// Users on the other side of a match with `user_id`
    async fn matched_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError>;

    /// Users `user_id` liked
    async fn liked_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError>;

    /// Users who liked `user_id`
    async fn liked_me_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError>;
}

#[async_trait]
pub trait PatternLookupGateway: Send + Sync {
    /// Latest summary (by end date) for one user
    async fn latest_for(&self, user_id: UserId) -> Result<Option<ConsumptionPatternSummary>, StoreError> {
        let mut found = self.latest_for_many(&[user_id]).await?;
        Ok(found.remove(&user_id))
    }

    /// Latest summary for each user that has one; users without a summary
    /// are absent from the map
    async fn latest_for_many(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ConsumptionPatternSummary>, StoreError>;
}

#[async_trait]
pub trait PhotoAttachmentGateway: Send + Sync {
    /// Ordered photo URLs; every requested id is present, possibly with an empty list
    async fn photos_for(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, Vec<String>>, StoreError>;
}

#[async_trait]
pub trait CompatibilityScorer: Send + Sync {
    async fn score(
        &self,
        reference: &ScoringProfile,
        candidates: &[ScoringProfile],
    ) -> Result<Vec<CompatibilityResult>, ScorerError>;
}

pub trait IdentityResolver: Send + Sync {
    /// Resolve an opaque bearer credential to the caller's user id
    fn resolve(&self, credential: &str) -> Result<UserId, AuthError>;
}
