use std::collections::HashSet;
use std::sync::Arc;

use crate::core::error::StoreError;
use crate::core::ports::InteractionStore;
use crate::models::UserId;

/// User ids that must never be shown to a given requester.
///
/// Built once per request and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionSet {
    ids: HashSet<UserId>,
}

impl ExclusionSet {
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.ids.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<UserId> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

/// Unions the dismissed, blocked, matched and liked sets of a requester.
///
/// Only the outgoing block direction is consulted: users who blocked the
/// requester are not excluded here.
#[derive(Clone)]
pub struct ExclusionSetBuilder {
    interactions: Arc<dyn InteractionStore>,
}

impl ExclusionSetBuilder {
    pub fn new(interactions: Arc<dyn InteractionStore>) -> Self {
        Self { interactions }
    }

    pub async fn build(&self, user_id: UserId) -> Result<ExclusionSet, StoreError> {
        let (visited, blocked, matched, liked) = tokio::try_join!(
            self.interactions.visited_ids(user_id),
            self.interactions.blocked_ids(user_id),
            self.interactions.matched_ids(user_id),
            self.interactions.liked_ids(user_id),
        )?;

        tracing::debug!(
            "Exclusions for {}: visited={}, blocked={}, matched={}, liked={}",
            user_id,
            visited.len(),
            blocked.len(),
            matched.len(),
            liked.len()
        );

        Ok(visited
            .into_iter()
            .chain(blocked)
            .chain(matched)
            .chain(liked)
            .collect())
    }
}
