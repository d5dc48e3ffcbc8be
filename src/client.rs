//! TMDB lookup client with timeout, retry, backoff, and jitter.
//!
//! [`MovieClient::fetch`] performs one logical lookup per movie id and always
//! resolves to a [`FetchOutcome`]; it never returns an error and never
//! retries forever.
//!
//! # Retry Strategy
//!
//! - HTTP 200 with a JSON body → [`FetchOutcome::Found`]; an unreadable
//!   200 body is retried
//! - HTTP 404 → [`FetchOutcome::NotFound`] after a single attempt
//! - HTTP 429, 5xx, timeouts, network errors → retry
//! - Any other status, other 2xx codes included → [`FetchOutcome::Unrecoverable`], no retry
//! - At most `max_retries + 1` attempts, then [`FetchOutcome::Exhausted`]
//! - Delay before retry `n` (1-based): `initial_backoff × 2^(n-1) + jitter`,
//!   jitter drawn uniformly from `[0, max_jitter]`
//!
//! The HTTP layer ([`Transport`]), the sleep ([`Sleeper`]) and the random
//! source ([`Jitter`]) are trait objects so tests can substitute a fake
//! server, record backoff delays, and pin the jitter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::{Config, RetryConfig, TmdbConfig};
use crate::models::{FetchFailure, FetchFailureCause, MovieId};

/// Largest exponent applied to the initial backoff.
const MAX_BACKOFF_EXPONENT: u32 = 16;

// ============ Transport ============

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure below the HTTP status level. All variants are transient.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// One HTTP round-trip for a movie id.
///
/// Implementations must be shareable across workers; no per-request state
/// may be mutated through `&self` except for test instrumentation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_movie(&self, id: MovieId) -> Result<HttpReply, TransportError>;
}

/// Production transport backed by a shared [`reqwest::Client`].
///
/// Requests `GET {base_url}/movie/{id}?api_key=…&language=…` with the
/// configured per-request timeout.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl ReqwestTransport {
    pub fn new(config: &TmdbConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
        })
    }

    pub fn movie_url(&self, id: MovieId) -> String {
        format!("{}/movie/{}", self.base_url, id)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_movie(&self, id: MovieId) -> Result<HttpReply, TransportError> {
        let response = self
            .http
            .get(self.movie_url(id))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            // Strip the URL so the api_key query parameter never reaches logs.
            .map_err(|e| classify_reqwest_error(e.without_url()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(e.without_url().to_string())
            }
        })?;

        Ok(HttpReply { status, body })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

// ============ Backoff ============

/// Suspends the current task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Random component added to each backoff delay.
pub trait Jitter: Send + Sync {
    /// Return a duration in `[0, max]`.
    fn sample(&self, max: Duration) -> Duration;
}

/// Jitter from the thread-local RNG.
pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn sample(&self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..=max.as_secs_f64()))
    }
}

/// Jitter from a seeded RNG, reproducible across runs.
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Jitter for SeededJitter {
    fn sample(&self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        let secs = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..=max.as_secs_f64()),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..=max.as_secs_f64()),
        };
        Duration::from_secs_f64(secs)
    }
}

/// Always the same jitter (capped at `max`).
pub struct FixedJitter(pub Duration);

impl Jitter for FixedJitter {
    fn sample(&self, max: Duration) -> Duration {
        self.0.min(max)
    }
}

/// Retry cap and backoff curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic part of the delay before retry number `retry` (1-based).
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

// ============ Client ============

/// Terminal result of [`MovieClient::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(Value),
    NotFound,
    Unrecoverable { status: u16 },
    Exhausted { attempts: u32, last_error: String },
}

impl FetchOutcome {
    /// Split into the payload or the ledger entry for `id`.
    pub fn into_result(self, id: MovieId) -> Result<Value, FetchFailure> {
        let cause = match self {
            FetchOutcome::Found(payload) => return Ok(payload),
            FetchOutcome::NotFound => FetchFailureCause::NotFound,
            FetchOutcome::Unrecoverable { status } => FetchFailureCause::Unrecoverable { status },
            FetchOutcome::Exhausted {
                attempts,
                last_error,
            } => FetchFailureCause::RetriesExhausted {
                attempts,
                last_error,
            },
        };
        Err(FetchFailure::new(id, cause))
    }
}

/// Retrying TMDB client. Cheap to share behind an `Arc`.
pub struct MovieClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    jitter: Arc<dyn Jitter>,
    sleeper: Arc<dyn Sleeper>,
}

impl MovieClient {
    /// Client with random jitter and real sleeps.
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            jitter: Arc::new(ThreadRngJitter),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Build the production client: reqwest transport plus configured policy.
    ///
    /// A configured `retry.jitter_seed` selects [`SeededJitter`].
    pub fn from_config(config: &Config, api_key: String) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.tmdb, api_key)?;
        let client = Self::new(Arc::new(transport), RetryPolicy::from_config(&config.retry));
        Ok(match config.retry.jitter_seed {
            Some(seed) => client.with_jitter(Arc::new(SeededJitter::new(seed))),
            None => client,
        })
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Look up one movie, retrying transient failures.
    pub async fn fetch(&self, id: MovieId) -> FetchOutcome {
        let attempts = self.policy.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.backoff_delay(attempt - 1);
                debug!(
                    movie_id = id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before retry"
                );
                self.sleeper.sleep(delay).await;
            }

            debug!(movie_id = id, attempt, "requesting movie details");
            match self.transport.get_movie(id).await {
                Ok(reply) if reply.status == 200 => {
                    match serde_json::from_str::<Value>(&reply.body) {
                        Ok(payload) => return FetchOutcome::Found(payload),
                        Err(e) => {
                            last_error = format!("invalid JSON body: {}", e);
                            warn!(
                                "Unreadable body for movie {} (attempt {}/{}): {}",
                                id, attempt, attempts, e
                            );
                        }
                    }
                }
                Ok(reply) if reply.status == 404 => {
                    warn!("Movie ID {} not found (404).", id);
                    return FetchOutcome::NotFound;
                }
                Ok(reply) if is_transient_status(reply.status) => {
                    last_error = format!("HTTP {}", reply.status);
                    warn!(
                        "Received status {} for movie {} (attempt {}/{}).",
                        reply.status, id, attempt, attempts
                    );
                }
                Ok(reply) => {
                    error!(
                        "Failed to fetch movie {} with unrecoverable status: {}",
                        id, reply.status
                    );
                    return FetchOutcome::Unrecoverable {
                        status: reply.status,
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        "Transport error for movie {} (attempt {}/{}): {}",
                        id, attempt, attempts, e
                    );
                }
            }
        }

        error!("All retries failed for movie ID: {}", id);
        FetchOutcome::Exhausted {
            attempts,
            last_error,
        }
    }

    fn backoff_delay(&self, retry: u32) -> Duration {
        self.policy
            .base_delay(retry)
            .saturating_add(self.jitter.sample(self.policy.max_jitter))
    }
}

/// 429 and every 5xx are worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
