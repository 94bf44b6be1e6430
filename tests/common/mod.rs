// Shared in-memory collaborators for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use mango_match::core::error::{AuthError, ScorerError, StoreError};
use mango_match::core::ports::{
    CompatibilityScorer, GeoCandidateFinder, IdentityResolver, InteractionStore,
    PatternLookupGateway, PhotoAttachmentGateway, UserStore,
};
use mango_match::core::{haversine_distance, MatchPorts, ScoringProfile, SwipeMatcher};
use mango_match::models::{
    CompatibilityResult, ConsumptionPatternSummary, FoodItem, Gender, GeoPoint, KeywordItem,
    TypeItem, UserId, UserProfile,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SEOUL_GANGNAM: GeoPoint = GeoPoint { latitude: 37.50, longitude: 127.03 };

pub fn user(id: i64, gender: Gender, location: Option<GeoPoint>) -> UserProfile {
    UserProfile {
        user_id: UserId(id),
        nickname: format!("user{}", id),
        introduction: Some(format!("introduction of {}", id)),
        gender,
        birth_date: NaiveDate::from_ymd_opt(1997, 6, 15).unwrap(),
        sigungu: Some("서울 강남구".to_string()),
        location,
        search_radius_km: Some(10),
    }
}

pub fn pattern(id: i64, main_type: &str) -> ConsumptionPatternSummary {
    ConsumptionPatternSummary {
        user_id: UserId(id),
        main_type: vec![TypeItem { name: main_type.to_string(), prob: 0.6 }],
        keyword: ["커피", "디저트", "빵", "와인"]
            .iter()
            .map(|k| KeywordItem { name: k.to_string(), score: 1.0 })
            .collect(),
        food: vec![FoodItem { name: "파스타".to_string(), score: 0.9 }],
        start_date: None,
        end_date: Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
    }
}

/// Users table kept in memory; the geo finder does the same radius and gender
/// filtering the database does
#[derive(Default)]
pub struct InMemoryUsers {
    pub users: Vec<UserProfile>,
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.iter().find(|u| u.user_id == user_id).cloned())
    }
}

#[async_trait]
impl GeoCandidateFinder for InMemoryUsers {
    async fn find(
        &self,
        origin: GeoPoint,
        radius_km: u32,
        gender: Gender,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let mut found: Vec<(f64, UserProfile)> = self
            .users
            .iter()
            .filter(|u| u.gender == gender)
            .filter_map(|u| {
                let location = u.location?;
                let distance = haversine_distance(origin, location);
                (distance <= radius_km as f64).then(|| (distance, u.clone()))
            })
            .collect();

        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.user_id.cmp(&b.1.user_id)));

        Ok(found.into_iter().map(|(_, u)| u).collect())
    }
}

#[derive(Default)]
pub struct InMemoryInteractions {
    pub visited: Vec<(i64, i64)>,
    pub blocks: Vec<(i64, i64)>,
    pub matches: Vec<(i64, i64)>,
    pub likes: Vec<(i64, i64)>,
}

fn outgoing(pairs: &[(i64, i64)], user_id: UserId) -> HashSet<UserId> {
    pairs
        .iter()
        .filter(|(from, _)| *from == user_id.0)
        .map(|(_, to)| UserId(*to))
        .collect()
}

#[async_trait]
impl InteractionStore for InMemoryInteractions {
    async fn visited_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(outgoing(&self.visited, user_id))
    }

    async fn blocked_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(outgoing(&self.blocks, user_id))
    }

    async fn matched_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(self
            .matches
            .iter()
            .filter_map(|(a, b)| match user_id.0 {
                id if id == *a => Some(UserId(*b)),
                id if id == *b => Some(UserId(*a)),
                _ => None,
            })
            .collect())
    }

    async fn liked_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(outgoing(&self.likes, user_id))
    }

    async fn liked_me_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(self
            .likes
            .iter()
            .filter(|(_, to)| *to == user_id.0)
            .map(|(from, _)| UserId(*from))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryPatterns {
    pub summaries: HashMap<UserId, ConsumptionPatternSummary>,
    pub fail: bool,
}

#[async_trait]
impl PatternLookupGateway for InMemoryPatterns {
    async fn latest_for_many(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ConsumptionPatternSummary>, StoreError> {
        if self.fail {
            return Err(StoreError::Backend { backend: "memory", message: "offline".into() });
        }
        Ok(user_ids
            .iter()
            .filter_map(|id| self.summaries.get(id).map(|s| (*id, s.clone())))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryPhotos {
    pub photos: HashMap<UserId, Vec<String>>,
    pub requested: Mutex<Vec<UserId>>,
}

#[async_trait]
impl PhotoAttachmentGateway for InMemoryPhotos {
    async fn photos_for(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, Vec<String>>, StoreError> {
        self.requested.lock().unwrap().extend_from_slice(user_ids);
        Ok(user_ids
            .iter()
            .map(|id| (*id, self.photos.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}

/// How the fake scorer answers
pub enum ScorerBehaviour {
    /// Rank candidates by the given order of ids; unlisted ids are omitted
    Rank(Vec<i64>),
    /// Rank every submitted candidate in submission order
    SubmissionOrder,
    Empty,
    Fail,
}

pub struct FakeScorer {
    pub behaviour: ScorerBehaviour,
    pub calls: AtomicUsize,
    pub submitted: Mutex<Vec<UserId>>,
}

impl FakeScorer {
    pub fn new(behaviour: ScorerBehaviour) -> Self {
        Self { behaviour, calls: AtomicUsize::new(0), submitted: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn ranked(ids: impl IntoIterator<Item = UserId>) -> Vec<CompatibilityResult> {
    ids.into_iter()
        .enumerate()
        .map(|(i, user_id)| CompatibilityResult {
            user_id,
            matching_rank: i as u32 + 1,
            matching_percent: 95.0 - 5.0 * i as f64,
        })
        .collect()
}

#[async_trait]
impl CompatibilityScorer for FakeScorer {
    async fn score(
        &self,
        _reference: &ScoringProfile,
        candidates: &[ScoringProfile],
    ) -> Result<Vec<CompatibilityResult>, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.submitted.lock().unwrap() = candidates.iter().map(|c| c.user_id).collect();

        match &self.behaviour {
            ScorerBehaviour::Rank(order) => Ok(ranked(order.iter().copied().map(UserId))),
            ScorerBehaviour::SubmissionOrder => Ok(ranked(candidates.iter().map(|c| c.user_id))),
            ScorerBehaviour::Empty => Ok(Vec::new()),
            ScorerBehaviour::Fail => Err(ScorerError::Timeout),
        }
    }
}

/// Credentials of the form `token-<id>`
pub struct StaticIdentity;

impl IdentityResolver for StaticIdentity {
    fn resolve(&self, credential: &str) -> Result<UserId, AuthError> {
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential);
        if token.is_empty() {
            return Err(AuthError::Missing);
        }
        token
            .strip_prefix("token-")
            .and_then(|id| id.parse::<i64>().ok())
            .map(UserId)
            .ok_or_else(|| AuthError::Invalid(format!("unknown token {}", token)))
    }
}

pub struct Harness {
    pub users: Arc<InMemoryUsers>,
    pub interactions: Arc<InMemoryInteractions>,
    pub patterns: Arc<InMemoryPatterns>,
    pub photos: Arc<InMemoryPhotos>,
    pub scorer: Arc<FakeScorer>,
}

impl Harness {
    pub fn new(
        users: Vec<UserProfile>,
        interactions: InMemoryInteractions,
        summaries: Vec<ConsumptionPatternSummary>,
        scorer: ScorerBehaviour,
    ) -> Self {
        Self {
            users: Arc::new(InMemoryUsers { users }),
            interactions: Arc::new(interactions),
            patterns: Arc::new(InMemoryPatterns {
                summaries: summaries.into_iter().map(|s| (s.user_id, s)).collect(),
                fail: false,
            }),
            photos: Arc::new(InMemoryPhotos::default()),
            scorer: Arc::new(FakeScorer::new(scorer)),
        }
    }

    pub fn with_photos(mut self, photos: HashMap<UserId, Vec<String>>) -> Self {
        self.photos = Arc::new(InMemoryPhotos { photos, requested: Mutex::new(Vec::new()) });
        self
    }

    pub fn matcher(&self) -> SwipeMatcher {
        SwipeMatcher::new(
            MatchPorts {
                users: self.users.clone(),
                geo: self.users.clone(),
                interactions: self.interactions.clone(),
                patterns: self.patterns.clone(),
                photos: self.photos.clone(),
                scorer: self.scorer.clone(),
                identity: Arc::new(StaticIdentity),
            },
            10,
        )
    }
}
