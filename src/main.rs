use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use mango_match::config::Settings;
use mango_match::core::{MatchPorts, SwipeMatcher};
use mango_match::routes::{self, matches::AppState};
use mango_match::services::{AppwriteClient, HttpCompatibilityScorer, JwtIdentityResolver, PostgresClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for malformed query strings
#[derive(Debug, serde::Serialize)]
pub struct QueryError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub retryable: bool,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for QueryError {}

impl error::ResponseError for QueryError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    QueryError {
        error: "REQUEST_001".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
        retryable: false,
    }
    .into()
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // LOG_LEVEL / LOG_FORMAT win over the config file
    let (config_level, config_format) = match &settings {
        Ok(s) => (s.logging.level.clone(), s.logging.format.clone()),
        Err(_) => ("info".to_string(), "json".to_string()),
    };
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(config_level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(config_format);
    init_logging(&log_level, &log_format);

    info!("Starting Mango swipe matching service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL client initialized");

    let appwrite = AppwriteClient::new(
        settings.appwrite.endpoint.clone(),
        settings.appwrite.api_key.clone(),
        settings.appwrite.project_id.clone(),
        settings.appwrite.database_id.clone(),
        settings.collection.consumption_patterns.clone(),
        settings.appwrite.lookup_concurrency,
        Duration::from_secs(settings.appwrite.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to create Appwrite client", e))?;

    info!("Appwrite client initialized");

    let scorer = HttpCompatibilityScorer::new(
        &settings.scorer.base_url,
        &settings.scorer.match_path,
        Duration::from_secs(settings.scorer.timeout_secs),
        settings.scorer.max_retries,
        Duration::from_millis(settings.scorer.retry_backoff_ms),
    )
    .map_err(|e| startup_error("Failed to create scorer client", e))?;

    info!("Compatibility scorer at {}", scorer.endpoint());

    let identity = JwtIdentityResolver::from_base64_secret(&settings.auth.jwt_secret)
        .map_err(|e| startup_error("Invalid JWT secret", e))?;

    let matcher = SwipeMatcher::new(
        MatchPorts {
            users: postgres.clone(),
            geo: postgres.clone(),
            interactions: postgres.clone(),
            patterns: Arc::new(appwrite),
            photos: postgres.clone(),
            scorer: Arc::new(scorer),
            identity: Arc::new(identity),
        },
        settings.matching.default_radius_km,
    );

    info!("Matcher initialized (default radius: {}km)", settings.matching.default_radius_km);

    let app_state = AppState {
        matcher,
        postgres: Some(postgres),
        default_page_size: settings.matching.default_page_size,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
