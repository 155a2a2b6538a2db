use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata about a pull request fetched from the hosting API.
/// Constructed from the API's JSON response; written to pr_data.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// Author's login
    pub author: String,
    /// open / closed
    pub state: String,
    /// Head commit the current diff ends at
    pub head_sha: String,
    /// Base commit the current diff starts from
    pub base_sha: String,
    pub html_url: String,
    /// Total files changed
    pub changed_files: usize,
    /// Total lines added
    pub additions: usize,
    /// Total lines deleted
    pub deletions: usize,
}

/// A review comment anchored to a line of a file at some commit.
/// Immutable once fetched; consumed by the mapper and the categorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub id: u64,
    /// Repository-relative path the comment is anchored to
    pub file_path: String,
    /// Line in the file as it was at `anchor_commit`; None when the comment
    /// only refers to a removed (left-side) line.
    pub anchor_line: Option<usize>,
    /// Commit the comment was created against
    pub anchor_commit: String,
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub in_reply_to: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Identifies a pull request: `{owner}/{repo}#{number}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl fmt::Display for PrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pr_number)
    }
}

/// Everything the fetch stage hands to the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct PrContext {
    pub pull_request: PullRequest,
    pub comments: Vec<ReviewComment>,
    pub diff: String,
}
