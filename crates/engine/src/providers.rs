use std::env;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use trainer_core::model::{ScenarioDraft, UserId};

use crate::error::ProviderError;

//
// ─── TRAITS ────────────────────────────────────────────────────────────────────
//

/// Cognitive-load estimation service.
///
/// Implementations return a score in [0, 1]; the engine clamps anyway and
/// treats any error as "no signal available".
#[async_trait]
pub trait LoadEstimator: Send + Sync {
    /// Estimate the user's current cognitive load.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the estimate cannot be produced. The
    /// engine never propagates this as a fatal error.
    async fn estimate(&self, user_id: &UserId) -> Result<f64, ProviderError>;
}

/// Generative content service producing new scenarios on demand.
///
/// Output is a raw draft; the selector validates it against the scenario
/// invariants before it can ever reach a user.
#[async_trait]
pub trait ScenarioGenerator: Send + Sync {
    /// Produce a scenario at the target difficulty.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when generation fails or the output cannot
    /// be parsed into a draft.
    async fn generate(
        &self,
        difficulty: u8,
        theme: Option<&str>,
    ) -> Result<ScenarioDraft, ProviderError>;
}

//
// ─── HTTP LOAD ESTIMATOR ───────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct LoadProviderConfig {
    pub base_url: String,
    pub api_key: String,
    /// Request timeout applied at the HTTP client level.
    pub timeout: Duration,
}

impl LoadProviderConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TRAINER_LOAD_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("TRAINER_LOAD_API_KEY").unwrap_or_default();
        Some(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(2),
        })
    }
}

/// Connector for a network cognitive-load estimation service.
///
/// POSTs `{user_id, timestamp}` to `<base_url>/estimate` and reads
/// `{"cognitive_load": <float>}` back.
#[derive(Clone)]
pub struct HttpLoadEstimator {
    client: Client,
    config: LoadProviderConfig,
}

impl HttpLoadEstimator {
    /// Build an estimator from the given config.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn new(config: LoadProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Build an estimator from environment configuration, if present.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Option<Self>, ProviderError> {
        match LoadProviderConfig::from_env() {
            Some(config) => Ok(Some(Self::new(config)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LoadEstimator for HttpLoadEstimator {
    async fn estimate(&self, user_id: &UserId) -> Result<f64, ProviderError> {
        let url = format!("{}/estimate", self.config.base_url.trim_end_matches('/'));
        let payload = EstimateRequest {
            user_id: user_id.as_str().to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };

        let mut request = self.client.post(url).json(&payload);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: EstimateResponse = response.json().await?;
        if !body.cognitive_load.is_finite() {
            return Err(ProviderError::Malformed(format!(
                "non-finite load score: {}",
                body.cognitive_load
            )));
        }
        Ok(body.cognitive_load.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Serialize)]
struct EstimateRequest {
    user_id: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    cognitive_load: f64,
}
