use crate::core::error::ScorerError;
use crate::core::ports::CompatibilityScorer;
use crate::core::scoring::{MatchUsersRequest, ScoringProfile};
use crate::models::CompatibilityResult;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTP client for the compatibility scoring service
///
/// Issues one `POST {base_url}{match_path}` per swipe request. Transient
/// failures (transport errors, timeouts, 5xx) are retried up to
/// `max_retries` times with a fixed backoff.
pub struct HttpCompatibilityScorer {
    endpoint: String,
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpCompatibilityScorer {
    pub fn new(
        base_url: &str,
        match_path: &str,
        timeout: Duration,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Result<Self, ScorerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScorerError::Config(e.to_string()))?;

        let endpoint = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            match_path.trim_start_matches('/')
        );

        Ok(Self {
            endpoint,
            client,
            max_retries,
            retry_backoff,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(
        &self,
        body: &MatchUsersRequest<'_>,
    ) -> Result<Vec<CompatibilityResult>, ScorerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScorerError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ScorerError::EmptyResponse);
        }

        let results: Vec<CompatibilityResult> =
            serde_json::from_slice(&bytes).map_err(|e| ScorerError::Decode(e.to_string()))?;

        if results.is_empty() {
            return Err(ScorerError::EmptyResponse);
        }

        Ok(results)
    }
}

fn transport_error(error: reqwest::Error) -> ScorerError {
    if error.is_timeout() {
        ScorerError::Timeout
    } else {
        ScorerError::Transport(error.to_string())
    }
}

#[async_trait]
impl CompatibilityScorer for HttpCompatibilityScorer {
    async fn score(
        &self,
        reference: &ScoringProfile,
        candidates: &[ScoringProfile],
    ) -> Result<Vec<CompatibilityResult>, ScorerError> {
        let body = MatchUsersRequest {
            reference,
            candidates,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(results) => {
                    tracing::debug!(
                        "Scorer returned {} results for {} candidates",
                        results.len(),
                        candidates.len()
                    );
                    return Ok(results);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!("Scorer call failed ({}), retry {}/{}", e, attempt, self.max_retries);
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => {
                    tracing::error!("Scorer call failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
