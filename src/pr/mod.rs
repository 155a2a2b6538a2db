pub mod client;
pub mod diff;
pub mod types;

pub use client::GitHubClient;
pub use types::{PrContext, PrRef, PullRequest, ReviewComment};

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("invalid PR reference: {0}")]
    InvalidUrl(String),

    #[error("authentication error for {pr}: {reason}")]
    Authentication { pr: String, reason: String },

    #[error("not found error: {pr} does not exist or is not accessible (GET {path})")]
    NotFound { pr: String, path: String },

    #[error("rate limit error for {pr}: retry after {}s", .retry_after.as_secs())]
    RateLimit { pr: String, retry_after: Duration },

    #[error("timeout error for {pr}: no response after {}s", .after.as_secs())]
    Timeout { pr: String, after: Duration },

    #[error("network error for {pr}: {reason}")]
    Network { pr: String, reason: String },

    #[error("unexpected HTTP status {status} for {pr}: {message}")]
    UnexpectedStatus { pr: String, status: u16, message: String },

    #[error("decode error for {pr}: {source}")]
    Decode {
        pr: String,
        source: serde_json::Error,
    },

    #[error("fetch of {pr} cancelled")]
    Cancelled { pr: String },

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Parse a pull request reference.
///
/// Accepts `https://github.com/{owner}/{repo}/pull/{number}` (trailing
/// segments such as `/files` are ignored) or the shorthand
/// `{owner}/{repo}#{number}`.
pub fn parse_pr_ref(input: &str) -> Result<PrRef, PrError> {
    let input = input.trim();
    if let Some((slug, number)) = input.split_once('#') {
        if !slug.contains("://") {
            return parse_shorthand(input, slug, number);
        }
    }

    let parsed = reqwest::Url::parse(input).map_err(|_| PrError::InvalidUrl(input.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(input.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(input.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() < 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(input.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(input.to_string()))?;

    Ok(PrRef {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

fn parse_shorthand(input: &str, slug: &str, number: &str) -> Result<PrRef, PrError> {
    let invalid = || PrError::InvalidUrl(input.to_string());
    let (owner, repo) = slug.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    let pr_number = number.parse::<u64>().map_err(|_| invalid())?;
    Ok(PrRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        pr_number,
    })
}

/// Fetch metadata, every review comment, and the unified diff for a PR.
///
/// All-or-nothing: any error, or `cancel` resolving first, drops whatever
/// was fetched so far. Dropping the in-flight future aborts its request.
#[instrument(skip(client, cancel), fields(pr = %pr))]
pub async fn fetch_pr_context<C>(client: &GitHubClient, pr: &PrRef, cancel: C) -> Result<PrContext, PrError>
where
    C: Future<Output = ()>,
{
    tokio::select! {
        result = fetch_all(client, pr) => result,
        _ = cancel => {
            warn!("fetch cancelled, discarding partial results");
            Err(PrError::Cancelled { pr: pr.to_string() })
        }
    }
}

async fn fetch_all(client: &GitHubClient, pr: &PrRef) -> Result<PrContext, PrError> {
    let pull_request = client.fetch_pull_request(pr).await?;
    let comments = client.fetch_review_comments(pr).await?;
    let diff = client.fetch_diff(pr).await?;
    info!(
        comments = comments.len(),
        diff_bytes = diff.len(),
        changed_files = pull_request.changed_files,
        "fetched PR context"
    );
    Ok(PrContext {
        pull_request,
        comments,
        diff,
    })
}
