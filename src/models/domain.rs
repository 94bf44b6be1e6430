use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel shown when a pattern exists but carries no main type or food entry
pub const UNKNOWN_AFFINITY: &str = "기타";

/// Number of keyword names surfaced per candidate
pub const TOP_KEYWORD_COUNT: usize = 3;

/// Primary key of a user row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Geographic point in degrees.
///
/// This is the only coordinate type that crosses component boundaries.
/// Storage keeps points as (x = longitude, y = latitude); use
/// [`GeoPoint::from_lon_lat`] or the `geo::Point` conversions at that edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build a point from storage order (longitude first)
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        Self::from_lon_lat(point.x(), point.y())
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

/// Gender as stored on the user row ("M" / "F")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    /// The gender a requester of this gender is shown in the swipe feed
    pub fn opposite(&self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            other => Err(format!("unknown gender code: {}", other)),
        }
    }
}

/// User projection used for both the requester and the candidates
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub nickname: String,
    pub introduction: Option<String>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    /// District label ("시군구")
    pub sigungu: Option<String>,
    pub location: Option<GeoPoint>,
    /// Search radius in km, unset until the user picks one
    pub search_radius_km: Option<u32>,
}

impl UserProfile {
    /// Age in completed years on the given day
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birth_date).unwrap_or(0)
    }

    pub fn age(&self) -> u32 {
        self.age_on(Utc::now().date_naive())
    }
}

/// Main spending-behavior type with its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeItem {
    pub name: String,
    #[serde(default)]
    pub prob: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordItem {
    pub name: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub score: f64,
}

/// A user's derived spending-behavior profile for one analysis period.
///
/// Lists are stored highest affinity first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPatternSummary {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "mainType", default)]
    pub main_type: Vec<TypeItem>,
    #[serde(rename = "keyword", default)]
    pub keyword: Vec<KeywordItem>,
    #[serde(rename = "food", default)]
    pub food: Vec<FoodItem>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
}

impl ConsumptionPatternSummary {
    pub fn best_main_type(&self) -> &str {
        self.main_type
            .first()
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_AFFINITY)
    }

    /// Up to `n` keyword names, in stored order
    pub fn top_keywords(&self, n: usize) -> Vec<String> {
        self.keyword.iter().take(n).map(|k| k.name.clone()).collect()
    }

    pub fn best_food(&self) -> &str {
        self.food
            .first()
            .map(|f| f.name.as_str())
            .unwrap_or(UNKNOWN_AFFINITY)
    }
}

/// Rank and percentage returned by the compatibility scorer for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub user_id: UserId,
    pub matching_rank: u32,
    #[serde(default)]
    pub matching_percent: f64,
}

/// One entry of the swipe feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeCandidate {
    pub id: UserId,
    pub nickname: String,
    pub introduction: Option<String>,
    #[serde(rename = "profileImageUrls")]
    pub profile_image_urls: Vec<String>,
    pub sigungu: Option<String>,
    pub age: u32,
    /// Distance from the requester in whole km
    pub distance: u32,
    #[serde(rename = "theyLiked")]
    pub they_liked: bool,
    #[serde(rename = "mainType")]
    pub main_type: String,
    pub keywords: Vec<String>,
    pub food: String,
    #[serde(rename = "matchingPercent")]
    pub matching_percent: f64,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}
