//! Resilient request executor.
//!
//! Every network operation goes through [`ApiClient::execute`], which gives
//! one logical call a per-attempt timeout, retry with exponential backoff,
//! and typed failure classification. Classification happens exactly once,
//! at the transport boundary, into [`FailureKind`]; nothing downstream
//! inspects error strings.
//!
//! - Transient failures (timeout, network failure, HTTP 5xx) are retried
//!   with delay `backoff_base * 2^attempt`, attempts strictly sequential.
//! - Terminal failures (HTTP 4xx) surface immediately with the status and
//!   the server-provided message.
//! - A spent retry budget surfaces as [`RequestError::Exhausted`], which
//!   reports status 0 so callers can tell it from a direct 4xx.
//!
//! Each retry re-issues the full request; idempotency of the underlying
//! operation is the caller's responsibility. Bodies are JSON by default,
//! with one form-encoded path for credential exchange. A bearer token is
//! attached whenever the surrounding session has handed one to the client.

use std::env;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::logs::{log_error, log_warning};
use crate::error::{FailureKind, RequestError, RequestResult};

/// Default per-attempt timeout.
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of attempts (first try included).
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit; the n-th retry waits `2^(n-1)` units.
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Environment variable naming the upstream API base URL.
pub const UPSTREAM_API_URL_VAR: &str = "UPSTREAM_API_URL";

/// Tunables for the request executor.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Timeout applied to each individual attempt, not cumulatively.
    pub attempt_timeout: Duration,
    /// Upper bound on attempts for one logical call.
    pub max_retries: u32,
    /// Base unit for the exponential backoff between attempts.
    pub backoff_base: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

/// Request body shape for one logical call.
enum Payload {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// How one attempt failed, decided at the transport boundary.
enum AttemptFailure {
    /// Retryable; carries the classified kind for the retry log.
    Transient { kind: FailureKind, message: String },
    /// Not retryable; surfaced to the caller as-is.
    Fatal(RequestError),
}

/// HTTP client for the upstream employee API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    config: Arc<RequestConfig>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            config: Arc::new(RequestConfig::default()),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a client from the `UPSTREAM_API_URL` environment variable,
    /// loading a `.env` file if present.
    pub fn from_env() -> RequestResult<Self> {
        let _ = dotenvy::dotenv();

        let base_url = env::var(UPSTREAM_API_URL_VAR).map_err(|_| {
            RequestError::MissingConfig(format!("{} not set", UPSTREAM_API_URL_VAR))
        })?;

        Ok(Self::new(base_url))
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Hand the client a bearer token from the external session store.
    /// Subsequent requests carry it as an Authorization header.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> RequestResult<T> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> RequestResult<T> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Execute one logical call with timeout, retry and classification.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> RequestResult<T> {
        let payload = match body {
            Some(value) => Payload::Json(value),
            None => Payload::Empty,
        };
        self.run(method, path, payload).await
    }

    /// The one distinguished form-encoded call: exchange credentials for a
    /// bearer token, which is then attached to subsequent requests.
    pub async fn exchange_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RequestResult<String> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let form = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];

        let response: TokenResponse = self
            .run(Method::POST, "/oauth/token", Payload::Form(form))
            .await?;
        self.set_token(response.access_token.clone());
        Ok(response.access_token)
    }

    async fn run<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> RequestResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let max_attempts = self.config.max_retries.max(1);
        let mut last_message = String::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                // Retries are strictly sequential; the timeout above applies
                // per attempt, not across the whole budget. The exponent is
                // capped so a large retry budget cannot overflow the factor.
                let delay = self.config.backoff_base * 2u32.pow((attempt - 1).min(16));
                tokio::time::sleep(delay).await;
            }

            match self.attempt::<T>(&method, &url, &payload).await {
                Ok(value) => return Ok(value),
                Err(AttemptFailure::Fatal(err)) => return Err(err),
                Err(AttemptFailure::Transient { kind, message }) => {
                    log_warning(format!(
                        "{} {} attempt {}/{} failed ({}): {}",
                        method,
                        path,
                        attempt + 1,
                        max_attempts,
                        kind,
                        message
                    ));
                    last_message = message;
                }
            }
        }

        log_error(format!(
            "{} {} failed after {} attempts: {}",
            method, path, max_attempts, last_message
        ));
        Err(RequestError::Exhausted {
            attempts: max_attempts,
            message: last_message,
        })
    }

    /// One attempt: send, wait bounded, classify.
    async fn attempt<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &str,
        payload: &Payload,
    ) -> Result<T, AttemptFailure> {
        let mut request = self.http.request(method.clone(), url);

        if let Some(token) = self.token.read().expect("token lock poisoned").as_deref() {
            request = request.bearer_auth(token);
        }
        request = match payload {
            Payload::Empty => request,
            Payload::Json(value) => request.json(value),
            Payload::Form(fields) => request.form(fields),
        };

        // A response arriving after the timeout is dropped with the future.
        let response = match tokio::time::timeout(self.config.attempt_timeout, request.send()).await
        {
            Err(_) => {
                return Err(AttemptFailure::Transient {
                    kind: FailureKind::Timeout,
                    message: "request timed out".into(),
                })
            }
            Ok(Err(e)) => {
                return Err(AttemptFailure::Transient {
                    kind: FailureKind::Network,
                    message: e.to_string(),
                })
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status().as_u16();
        let body = match tokio::time::timeout(self.config.attempt_timeout, response.text()).await {
            Err(_) => {
                return Err(AttemptFailure::Transient {
                    kind: FailureKind::Timeout,
                    message: "response body timed out".into(),
                })
            }
            Ok(Err(e)) => {
                return Err(AttemptFailure::Transient {
                    kind: FailureKind::Network,
                    message: e.to_string(),
                })
            }
            Ok(Ok(body)) => body,
        };

        if (200..300).contains(&status) {
            let text = if body.trim().is_empty() {
                "null"
            } else {
                body.as_str()
            };
            return serde_json::from_str::<T>(text)
                .map_err(|e| AttemptFailure::Fatal(RequestError::InvalidBody(e.to_string())));
        }

        let kind = FailureKind::HttpStatus(status);
        let message = server_message(&body, status);
        if kind.is_retryable() {
            Err(AttemptFailure::Transient { kind, message })
        } else {
            Err(AttemptFailure::Fatal(RequestError::Http { status, message }))
        }
    }
}

/// Extract the server-provided message from an error body, falling back to
/// a default when the body is unparseable.
fn server_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    format!("HTTP error {}", status)
}
