use crate::core::distance::calculate_bounding_box;
use crate::core::error::StoreError;
use crate::core::ports::{GeoCandidateFinder, InteractionStore, PhotoAttachmentGateway, UserStore};
use crate::models::{BoundingBox, Gender, GeoPoint, UserId, UserProfile};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<PostgresError> for StoreError {
    fn from(value: PostgresError) -> Self {
        match value {
            PostgresError::InvalidData(message) => StoreError::InvalidData {
                backend: "postgres",
                message,
            },
            other => StoreError::Backend {
                backend: "postgres",
                message: other.to_string(),
            },
        }
    }
}

const USER_COLUMNS: &str =
    "user_id, nickname, introduction, gender, birth_date, sigungu, latitude, longitude, distance";

/// PostgreSQL client for users, photos and swipe interactions
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool (migrations are not run)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn id_set(&self, query: &str, user_id: UserId) -> Result<HashSet<UserId>, PostgresError> {
        let ids: Vec<i64> = sqlx::query_scalar(query)
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(UserId).collect())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Map a `users` row into a profile
fn profile_from_row(row: &PgRow) -> Result<UserProfile, PostgresError> {
    let user_id: i64 = row.try_get("user_id")?;
    let gender: String = row.try_get("gender")?;
    let gender = gender
        .parse::<Gender>()
        .map_err(|e| PostgresError::InvalidData(format!("user {}: {}", user_id, e)))?;
    let birth_date: NaiveDate = row.try_get("birth_date")?;

    let location = location_from_columns(row.try_get("latitude")?, row.try_get("longitude")?);

    Ok(UserProfile {
        user_id: UserId(user_id),
        nickname: row.try_get("nickname")?,
        introduction: row.try_get("introduction")?,
        gender,
        birth_date,
        sigungu: row.try_get("sigungu")?,
        location,
        search_radius_km: radius_from_column(row.try_get("distance")?),
    })
}

/// Stored location; a row missing either coordinate has none
fn location_from_columns(latitude: Option<f64>, longitude: Option<f64>) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(geo::Point::new(lon, lat).into()),
        _ => None,
    }
}

/// Bind values of [`nearby_users_sql`], in placeholder order
#[derive(Debug, Clone, Copy, PartialEq)]
struct NearbyParams {
    latitude: f64,
    longitude: f64,
    bbox: BoundingBox,
    radius_km: f64,
}

impl NearbyParams {
    fn new(origin: GeoPoint, radius_km: u32) -> Self {
        let point: geo::Point<f64> = origin.into();
        let radius_km = radius_km as f64;

        Self {
            latitude: point.y(),
            longitude: point.x(),
            bbox: calculate_bounding_box(origin, radius_km),
            radius_km,
        }
    }
}

/// Users of one gender within a radius, nearest first.
///
/// `$1`/`$2` origin latitude/longitude, `$3` gender, `$4..$7` bounding box
/// (min lat, max lat, min lon, max lon), `$8` radius in km. The bounding box
/// narrows the scan, haversine decides.
fn nearby_users_sql() -> String {
    format!(
        r#"
        SELECT {columns}
        FROM (
            SELECT u.*,
                6371.0 * 2 * ASIN(LEAST(1.0, SQRT(
                    POWER(SIN(RADIANS(u.latitude - $1) / 2), 2) +
                    COS(RADIANS($1)) * COS(RADIANS(u.latitude)) *
                    POWER(SIN(RADIANS(u.longitude - $2) / 2), 2)
                ))) AS distance_km
            FROM users u
            WHERE u.latitude IS NOT NULL
              AND u.longitude IS NOT NULL
              AND u.gender = $3
              AND u.latitude BETWEEN $4 AND $5
              AND u.longitude BETWEEN $6 AND $7
        ) nearby
        WHERE distance_km <= $8
        ORDER BY distance_km, user_id
        "#,
        columns = USER_COLUMNS
    )
}

/// Stored radius, ignoring non-positive values
fn radius_from_column(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0)
}

/// Group `(user_id, url)` rows, already in photo order, by user.
/// Every requested id gets an entry.
fn group_photos(rows: Vec<(i64, String)>, requested: &[UserId]) -> HashMap<UserId, Vec<String>> {
    let mut photos: HashMap<UserId, Vec<String>> =
        requested.iter().map(|id| (*id, Vec::new())).collect();

    for (user_id, url) in rows {
        photos.entry(UserId(user_id)).or_default().push(url);
    }

    photos
}

#[async_trait]
impl UserStore for PostgresClient {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.as_ref().map(profile_from_row).transpose()?)
    }
}

#[async_trait]
impl GeoCandidateFinder for PostgresClient {
    async fn find(
        &self,
        origin: GeoPoint,
        radius_km: u32,
        gender: Gender,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let params = NearbyParams::new(origin, radius_km);
        let query = nearby_users_sql();

        let rows = sqlx::query(&query)
            .bind(params.latitude)
            .bind(params.longitude)
            .bind(gender.as_str())
            .bind(params.bbox.min_lat)
            .bind(params.bbox.max_lat)
            .bind(params.bbox.min_lon)
            .bind(params.bbox.max_lon)
            .bind(params.radius_km)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let users = rows
            .iter()
            .map(profile_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "{} users of gender {} within {}km of ({}, {})",
            users.len(),
            gender.as_str(),
            radius_km,
            origin.latitude,
            origin.longitude
        );

        Ok(users)
    }
}

#[async_trait]
impl InteractionStore for PostgresClient {
    async fn visited_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(self
            .id_set("SELECT to_id FROM visited WHERE from_id = $1", user_id)
            .await?)
    }

    async fn blocked_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(self
            .id_set("SELECT to_id FROM blocks WHERE from_id = $1", user_id)
            .await?)
    }

    async fn matched_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        let query = r#"
            SELECT CASE WHEN user_id_1 = $1 THEN user_id_2 ELSE user_id_1 END
            FROM matches
            WHERE user_id_1 = $1 OR user_id_2 = $1
        "#;

        Ok(self.id_set(query, user_id).await?)
    }

    async fn liked_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(self
            .id_set("SELECT to_id FROM mangos WHERE from_id = $1", user_id)
            .await?)
    }

    async fn liked_me_ids(&self, user_id: UserId) -> Result<HashSet<UserId>, StoreError> {
        Ok(self
            .id_set("SELECT from_id FROM mangos WHERE to_id = $1", user_id)
            .await?)
    }
}

#[async_trait]
impl PhotoAttachmentGateway for PostgresClient {
    async fn photos_for(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, Vec<String>>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i64> = user_ids.iter().map(|id| id.0).collect();

        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT user_id, photo_url
            FROM user_photos
            WHERE user_id = ANY($1)
            ORDER BY user_id, photo_order, photo_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(PostgresError::from)?;

        Ok(group_photos(rows, user_ids))
    }
}
