use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::{CompatibilityResult, ConsumptionPatternSummary, KeywordItem, TypeItem, UserId};

/// Profile sent to the compatibility scorer, for the requester and each candidate.
///
/// The scorer keys main types by `대표유형` and keywords by `키워드`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub user_id: UserId,
    #[serde(rename = "대표유형")]
    pub main_type: Vec<TypeItem>,
    #[serde(rename = "키워드")]
    pub keywords: Vec<KeywordItem>,
}

impl From<&ConsumptionPatternSummary> for ScoringProfile {
    fn from(summary: &ConsumptionPatternSummary) -> Self {
        Self {
            user_id: summary.user_id,
            main_type: summary.main_type.clone(),
            keywords: summary.keyword.clone(),
        }
    }
}

/// Body of `POST /match/users`
#[derive(Debug, Clone, Serialize)]
pub struct MatchUsersRequest<'a> {
    #[serde(rename = "ref")]
    pub reference: &'a ScoringProfile,
    pub candidates: &'a [ScoringProfile],
}

/// Index scorer results by user id.
///
/// Only ids that were submitted are kept; when the scorer repeats an id the
/// first entry wins.
pub fn index_results(
    results: Vec<CompatibilityResult>,
    submitted: &[ScoringProfile],
) -> HashMap<UserId, CompatibilityResult> {
    let submitted: HashSet<UserId> = submitted.iter().map(|p| p.user_id).collect();
    let mut index = HashMap::with_capacity(results.len());

    for result in results {
        if !submitted.contains(&result.user_id) {
            tracing::debug!("Ignoring score for unsubmitted user {}", result.user_id);
            continue;
        }
        index.entry(result.user_id).or_insert(result);
    }

    index
}
