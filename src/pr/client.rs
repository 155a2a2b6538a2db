use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::types::{PrRef, PullRequest, ReviewComment};
use super::PrError;
use crate::config::Config;

pub const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
pub const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

/// Used when a rate-limited response carries no usable reset hint.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// A GET against the hosting API, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub accept: &'static str,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn json(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            accept: JSON_MEDIA_TYPE,
            query: Vec::new(),
        }
    }

    pub fn diff(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            accept: DIFF_MEDIA_TYPE,
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[cfg(test)]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response. Header names are lower-case.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Failures below the HTTP layer. Both kinds are transient and retried once.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Seam between the fetcher and the network so the fetch logic can be
/// exercised without a live API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport backed by reqwest with bearer-token authentication.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: &Config, token: String) -> Result<Self, PrError> {
        let client = reqwest::Client::builder()
            .user_agent(config.github.user_agent.clone())
            .timeout(config.github.timeout())
            .build()?;
        Ok(Self {
            client,
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}/{}", self.api_url, request.path.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, request.accept)
            .query(&request.query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhCommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct GhPull {
    number: u64,
    title: String,
    user: GhUser,
    state: String,
    head: GhCommitRef,
    base: GhCommitRef,
    html_url: String,
    #[serde(default)]
    changed_files: usize,
    #[serde(default)]
    additions: usize,
    #[serde(default)]
    deletions: usize,
}

impl From<GhPull> for PullRequest {
    fn from(pull: GhPull) -> Self {
        PullRequest {
            number: pull.number,
            title: pull.title,
            author: pull.user.login,
            state: pull.state,
            head_sha: pull.head.sha,
            base_sha: pull.base.sha,
            html_url: pull.html_url,
            changed_files: pull.changed_files,
            additions: pull.additions,
            deletions: pull.deletions,
        }
    }
}

#[derive(Deserialize)]
struct GhReviewComment {
    id: u64,
    path: String,
    #[serde(default)]
    line: Option<usize>,
    #[serde(default)]
    original_line: Option<usize>,
    #[serde(default)]
    side: Option<String>,
    commit_id: String,
    #[serde(default)]
    original_commit_id: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    user: Option<GhUser>,
    #[serde(default)]
    in_reply_to_id: Option<u64>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<GhReviewComment> for ReviewComment {
    fn from(raw: GhReviewComment) -> Self {
        let anchor_line = match raw.side.as_deref() {
            Some("LEFT") => None,
            _ => raw.original_line.or(raw.line),
        };
        ReviewComment {
            id: raw.id,
            file_path: raw.path,
            anchor_line,
            anchor_commit: raw.original_commit_id.unwrap_or(raw.commit_id),
            body: raw.body,
            author: raw.user.map(|u| u.login),
            in_reply_to: raw.in_reply_to_id,
            html_url: raw.html_url,
            created_at: raw.created_at,
        }
    }
}

/// Hosting-API client: one retry for transient failures, status codes
/// mapped onto `PrError`, pagination drained.
pub struct GitHubClient {
    transport: Box<dyn Transport>,
    per_page: u32,
    timeout: Duration,
    retry_backoff: Duration,
}

impl GitHubClient {
    /// Build a client that talks to the real API. Fails with an
    /// authentication error before any request when no token is available.
    pub fn from_config(config: &Config, pr: &PrRef) -> Result<Self, PrError> {
        let token = config
            .github_token()
            .ok_or_else(|| PrError::Authentication {
                pr: pr.to_string(),
                reason: "no token found; set GITHUB_TOKEN or run `gh auth login`".to_string(),
            })?;
        let transport = HttpTransport::new(config, token)?;
        Ok(Self::with_transport(Box::new(transport), config))
    }

    pub fn with_transport(transport: Box<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            per_page: config.github.page_size(),
            timeout: config.github.timeout(),
            retry_backoff: config.github.retry_backoff(),
        }
    }

    #[instrument(skip(self), fields(pr = %pr))]
    pub async fn fetch_pull_request(&self, pr: &PrRef) -> Result<PullRequest, PrError> {
        let request = ApiRequest::json(pull_path(pr));
        let response = self.send(pr, &request).await?;
        let pull: GhPull = decode(pr, &response.body)?;
        debug!(title = %pull.title, changed_files = pull.changed_files, "received PR metadata");
        Ok(pull.into())
    }

    /// Fetch every review comment, following pages until one comes back
    /// short. Comment ids already seen on an earlier page are dropped.
    #[instrument(skip(self), fields(pr = %pr))]
    pub async fn fetch_review_comments(&self, pr: &PrRef) -> Result<Vec<ReviewComment>, PrError> {
        let path = format!("{}/comments", pull_path(pr));
        let mut comments = Vec::new();
        let mut seen = HashSet::new();

        for page in 1u32.. {
            let request = ApiRequest::json(path.as_str())
                .with_query("page", page)
                .with_query("per_page", self.per_page);
            let response = self.send(pr, &request).await?;
            let batch: Vec<GhReviewComment> = decode(pr, &response.body)?;
            let batch_len = batch.len();
            debug!(page, batch_len, "received comment page");

            for raw in batch {
                if seen.insert(raw.id) {
                    comments.push(ReviewComment::from(raw));
                }
            }
            if batch_len < self.per_page as usize {
                break;
            }
        }

        debug!(total = comments.len(), "drained comment pages");
        Ok(comments)
    }

    #[instrument(skip(self), fields(pr = %pr))]
    pub async fn fetch_diff(&self, pr: &PrRef) -> Result<String, PrError> {
        let request = ApiRequest::diff(pull_path(pr));
        let response = self.send(pr, &request).await?;
        debug!(diff_bytes = response.body.len(), "received PR diff");
        Ok(response.body)
    }

    async fn send(&self, pr: &PrRef, request: &ApiRequest) -> Result<ApiResponse, PrError> {
        let response = match self.attempt(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(path = %request.path, error = %err, "transient failure, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.attempt(request)
                    .await
                    .map_err(|err| self.transport_failure(pr, err))?
            }
        };
        check_status(pr, request, response)
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        match tokio::time::timeout(self.timeout, self.transport.get(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn transport_failure(&self, pr: &PrRef, err: TransportError) -> PrError {
        match err {
            TransportError::Timeout => PrError::Timeout {
                pr: pr.to_string(),
                after: self.timeout,
            },
            TransportError::Network(reason) => PrError::Network {
                pr: pr.to_string(),
                reason,
            },
        }
    }
}

fn pull_path(pr: &PrRef) -> String {
    format!("repos/{}/{}/pulls/{}", pr.owner, pr.repo, pr.pr_number)
}

fn decode<T: DeserializeOwned>(pr: &PrRef, body: &str) -> Result<T, PrError> {
    serde_json::from_str(body).map_err(|source| PrError::Decode {
        pr: pr.to_string(),
        source,
    })
}

/// Map a non-success status onto the error taxonomy.
fn check_status(pr: &PrRef, request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse, PrError> {
    let status = response.status;
    if (200..300).contains(&status) {
        return Ok(response);
    }

    let pr_name = pr.to_string();
    let quota_exhausted = response.header("x-ratelimit-remaining") == Some("0")
        || response.header("retry-after").is_some();

    match status {
        429 => Err(PrError::RateLimit {
            pr: pr_name,
            retry_after: retry_after(&response),
        }),
        403 if quota_exhausted => Err(PrError::RateLimit {
            pr: pr_name,
            retry_after: retry_after(&response),
        }),
        401 | 403 => Err(PrError::Authentication {
            pr: pr_name,
            reason: format!("token rejected (HTTP {}): {}", status, api_message(&response.body)),
        }),
        404 => Err(PrError::NotFound {
            pr: pr_name,
            path: request.path.clone(),
        }),
        _ => Err(PrError::UnexpectedStatus {
            pr: pr_name,
            status,
            message: api_message(&response.body),
        }),
    }
}

fn retry_after(response: &ApiResponse) -> Duration {
    if let Some(secs) = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Duration::from_secs(secs);
    }

    let reset = response
        .header("x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<u64>().ok());
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    match reset {
        Some(reset) if reset > now => Duration::from_secs(reset - now),
        Some(_) => Duration::ZERO,
        None => DEFAULT_RATE_LIMIT_WAIT,
    }
}

/// The API's `{"message": ...}` field, or a truncated raw body.
fn api_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiErrorBody {
        message: String,
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    type Responder = dyn Fn(&ApiRequest, usize) -> Result<ApiResponse, TransportError> + Send + Sync;

    /// In-memory transport. The responder gets the request and the
    /// zero-based call number.
    pub struct FakeTransport {
        responder: Box<Responder>,
        pub calls: Mutex<Vec<ApiRequest>>,
    }

    impl FakeTransport {
        pub fn new(
            responder: impl Fn(&ApiRequest, usize) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for std::sync::Arc<FakeTransport> {
        async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(request.clone());
                calls.len() - 1
            };
            (self.responder)(request, call)
        }
    }

    /// Never answers; used for timeout and cancellation tests.
    pub struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn get(&self, _request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            std::future::pending().await
        }
    }

    pub fn ok(body: impl Into<String>) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse {
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
        })
    }

    pub fn status(status: u16, headers: &[(&str, &str)]) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: r#"{"message": "nope"}"#.to_string(),
        })
    }

    pub fn comment_json(id: u64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "path": "src/lib.rs",
            "line": 10,
            "original_line": 8,
            "side": "RIGHT",
            "commit_id": "head",
            "original_commit_id": "orig",
            "body": format!("comment {}", id),
            "user": { "login": "reviewer" }
        })
    }

    pub fn test_config() -> Config {
        let mut config = Config::default();
        config.github.retry_backoff_ms = 0;
        config.github.timeout_secs = 1;
        config
    }

    pub fn test_pr() -> PrRef {
        PrRef {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 42,
        }
    }
}
