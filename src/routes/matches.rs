use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::MatchError;
use crate::core::filters::paginate;
use crate::core::SwipeMatcher;
use crate::models::{ErrorResponse, HealthResponse, SwipeListResponse, SwipeQuery, UserId};
use crate::services::PostgresClient;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: SwipeMatcher,
    /// Probed by the health endpoint; `None` reports a degraded service
    pub postgres: Option<Arc<PostgresClient>>,
    pub default_page_size: u32,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/match/swipe", web::get().to(get_swipe_list));
}

impl error::ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(MatchError::status_code(self)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(error::ResponseError::status_code(self)).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.public_message().to_string(),
            status_code: MatchError::status_code(self),
            retryable: self.is_retryable(),
        })
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => false,
    };

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Swipe list endpoint
///
/// GET /api/v1/match/swipe?userId=7&category=카페&page=0&size=20
///
/// Requires `Authorization: Bearer <token>` issued to `userId`. Without
/// `page` and `size` the whole feed is returned.
async fn get_swipe_list(
    state: web::Data<AppState>,
    query: web::Query<SwipeQuery>,
    http_req: HttpRequest,
) -> Result<HttpResponse, MatchError> {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for swipe request: {}", errors);
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "REQUEST_001".to_string(),
            message: errors.to_string(),
            status_code: 400,
            retryable: false,
        }));
    }

    let query = query.into_inner();
    let subject = UserId(query.user_id);
    let credential = http_req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    // Dropping the handler (client gone) cancels the pipeline
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let span = tracing::info_span!(
        "swipe_list",
        request_id = %Uuid::new_v4(),
        user_id = %subject,
    );

    let result = state
        .matcher
        .get_swipe_list(credential, subject, query.category.as_deref(), &cancel)
        .instrument(span.clone())
        .await;

    let feed = match result {
        Ok(feed) => feed,
        Err(e) => {
            span.in_scope(|| match &e {
                MatchError::External(_) | MatchError::Store(_) => tracing::error!("Swipe list failed: {}", e),
                MatchError::Cancelled => tracing::info!("Swipe list cancelled"),
                _ => tracing::info!("Swipe list rejected: {}", e),
            });
            return Err(e);
        }
    };

    let (data, page) = paginate(feed, query.page, query.size, state.default_page_size);

    Ok(HttpResponse::Ok().json(SwipeListResponse {
        status: "SUCCESS".to_string(),
        message: "Swipe list retrieved".to_string(),
        data,
        page,
    }))
}
