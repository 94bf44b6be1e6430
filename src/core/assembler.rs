use std::collections::{HashMap, HashSet};

use crate::core::distance::distance_km_rounded;
use crate::core::exclusion::ExclusionSet;
use crate::core::filters::filter_by_category;
use crate::models::{
    CompatibilityResult, ConsumptionPatternSummary, GeoPoint, SwipeCandidate, UserId, UserProfile,
    TOP_KEYWORD_COUNT,
};

/// Everything the assembler joins, borrowed from the pipeline
pub struct AssemblyInput<'a> {
    /// Geo results, nearest first
    pub candidates: Vec<UserProfile>,
    pub exclusions: &'a ExclusionSet,
    pub patterns: &'a HashMap<UserId, ConsumptionPatternSummary>,
    pub results: &'a HashMap<UserId, CompatibilityResult>,
    pub photos: &'a HashMap<UserId, Vec<String>>,
    pub origin: GeoPoint,
    /// Users with an outstanding like directed at the requester
    pub liked_me: &'a HashSet<UserId>,
    pub category: Option<&'a str>,
}

/// Join geo results, exclusions, pattern summaries, scores and photos into the
/// final feed.
///
/// Candidates that are excluded, have no summary, or were not scored are
/// dropped. Survivors are ordered by scorer rank (ties keep geo order) and then
/// filtered by category.
pub fn assemble(input: AssemblyInput<'_>) -> Vec<SwipeCandidate> {
    let AssemblyInput {
        candidates,
        exclusions,
        patterns,
        results,
        photos,
        origin,
        liked_me,
        category,
    } = input;

    let mut ranked: Vec<(u32, SwipeCandidate)> = candidates
        .into_iter()
        .filter(|user| !exclusions.contains(&user.user_id))
        .filter_map(|user| {
            let pattern = patterns.get(&user.user_id)?;
            let result = results.get(&user.user_id)?;
            // Finder never returns users without a location
            let location = user.location?;

            let candidate = SwipeCandidate {
                id: user.user_id,
                age: user.age(),
                distance: distance_km_rounded(origin, location),
                they_liked: liked_me.contains(&user.user_id),
                main_type: pattern.best_main_type().to_string(),
                keywords: pattern.top_keywords(TOP_KEYWORD_COUNT),
                food: pattern.best_food().to_string(),
                profile_image_urls: photos.get(&user.user_id).cloned().unwrap_or_default(),
                matching_percent: result.matching_percent,
                nickname: user.nickname,
                introduction: user.introduction,
                sigungu: user.sigungu,
            };

            Some((result.matching_rank, candidate))
        })
        .collect();

    // Stable: equal ranks keep nearest-first order
    ranked.sort_by_key(|(rank, _)| *rank);

    let ordered = ranked.into_iter().map(|(_, candidate)| candidate).collect();

    filter_by_category(ordered, category)
}
