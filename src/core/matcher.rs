use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::assembler::{assemble, AssemblyInput};
use crate::core::error::{MatchError, ScorerError};
use crate::core::exclusion::ExclusionSetBuilder;
use crate::core::ports::{
    CompatibilityScorer, GeoCandidateFinder, IdentityResolver, InteractionStore,
    PatternLookupGateway, PhotoAttachmentGateway, UserStore,
};
use crate::core::scoring::{index_results, ScoringProfile};
use crate::models::{SwipeCandidate, UserId, UserProfile};

/// Collaborators the swipe pipeline reads from
#[derive(Clone)]
pub struct MatchPorts {
    pub users: Arc<dyn UserStore>,
    pub geo: Arc<dyn GeoCandidateFinder>,
    pub interactions: Arc<dyn InteractionStore>,
    pub patterns: Arc<dyn PatternLookupGateway>,
    pub photos: Arc<dyn PhotoAttachmentGateway>,
    pub scorer: Arc<dyn CompatibilityScorer>,
    pub identity: Arc<dyn IdentityResolver>,
}

/// Swipe feed orchestrator
///
/// # Pipeline Stages
/// 1. Identity check and requester lookup
/// 2. Geo retrieval within the requester's radius (opposite gender)
/// 3. Exclusion of dismissed, blocked, matched and liked users
/// 4. Bulk pattern lookup; candidates without a summary are dropped
/// 5. One batched compatibility call
/// 6. Photo and liked-me attachment, then rank ordering and category filter
///
/// Holds no per-request state; every call builds its own sets.
#[derive(Clone)]
pub struct SwipeMatcher {
    ports: MatchPorts,
    exclusions: ExclusionSetBuilder,
    default_radius_km: u32,
}

impl SwipeMatcher {
    pub fn new(ports: MatchPorts, default_radius_km: u32) -> Self {
        let exclusions = ExclusionSetBuilder::new(ports.interactions.clone());
        Self {
            ports,
            exclusions,
            default_radius_km,
        }
    }

    /// Swipe feed for `subject`, read on behalf of the bearer of `credential`.
    ///
    /// The caller may only read their own feed.
    pub async fn get_swipe_list(
        &self,
        credential: Option<&str>,
        subject: UserId,
        category: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SwipeCandidate>, MatchError> {
        let credential = credential.ok_or(MatchError::AuthRequired)?;
        let caller = self.ports.identity.resolve(credential)?;

        if caller != subject {
            tracing::warn!("User {} attempted to read the swipe list of user {}", caller, subject);
            return Err(MatchError::Forbidden { caller, subject });
        }

        self.swipe_list_for_user(subject, category, cancel).await
    }

    /// Pipeline body, without the identity check
    pub async fn swipe_list_for_user(
        &self,
        user_id: UserId,
        category: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SwipeCandidate>, MatchError> {
        checkpoint(cancel)?;

        let requester = self
            .ports
            .users
            .find_user(user_id)
            .await?
            .ok_or(MatchError::UserNotFound(user_id))?;

        let Some(origin) = requester.location else {
            tracing::warn!("User {} has no stored location, returning empty swipe list", user_id);
            return Ok(Vec::new());
        };

        let radius_km = requester.search_radius_km.unwrap_or(self.default_radius_km);
        let gender = requester.gender.opposite();

        checkpoint(cancel)?;
        let nearby = self.ports.geo.find(origin, radius_km, gender).await?;
        tracing::debug!("Found {} nearby users within {}km", nearby.len(), radius_km);

        if nearby.is_empty() {
            return Ok(Vec::new());
        }

        checkpoint(cancel)?;
        let reference = self
            .ports
            .patterns
            .latest_for(user_id)
            .await?
            .ok_or(MatchError::NoConsumptionPattern(user_id))?;

        let exclusions = self.exclusions.build(user_id).await?;
        let eligible: Vec<UserProfile> = nearby
            .into_iter()
            .filter(|c| c.user_id != user_id && !exclusions.contains(&c.user_id))
            .collect();
        tracing::debug!("{} candidates left after exclusions ({} excluded ids)", eligible.len(), exclusions.len());

        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        checkpoint(cancel)?;
        let ids: Vec<UserId> = eligible.iter().map(|c| c.user_id).collect();
        let patterns = self.ports.patterns.latest_for_many(&ids).await?;

        // Geo order is kept so equal ranks resolve nearest first
        let submitted: Vec<ScoringProfile> = eligible
            .iter()
            .filter_map(|c| patterns.get(&c.user_id))
            .map(ScoringProfile::from)
            .collect();
        tracing::debug!("{} candidates have a consumption pattern", submitted.len());

        if submitted.is_empty() {
            return Ok(Vec::new());
        }

        let reference = ScoringProfile::from(&reference);
        let scored = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MatchError::Cancelled),
            scored = self.ports.scorer.score(&reference, &submitted) => scored?,
        };

        if scored.is_empty() {
            return Err(ScorerError::EmptyResponse.into());
        }

        let results = index_results(scored, &submitted);
        tracing::debug!("Scorer ranked {} of {} candidates", results.len(), submitted.len());

        checkpoint(cancel)?;
        let scored_ids: Vec<UserId> = submitted
            .iter()
            .map(|p| p.user_id)
            .filter(|id| results.contains_key(id))
            .collect();

        let (photos, liked_me) = tokio::try_join!(
            self.ports.photos.photos_for(&scored_ids),
            self.ports.interactions.liked_me_ids(user_id),
        )?;

        let feed = assemble(AssemblyInput {
            candidates: eligible,
            exclusions: &exclusions,
            patterns: &patterns,
            results: &results,
            photos: &photos,
            origin,
            liked_me: &liked_me,
            category,
        });

        tracing::info!("Swipe list for user {}: {} candidates", user_id, feed.len());

        Ok(feed)
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), MatchError> {
    if cancel.is_cancelled() {
        return Err(MatchError::Cancelled);
    }
    Ok(())
}
