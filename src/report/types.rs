use crate::feedback::{Category, FeedbackItem};
use crate::pr::PullRequest;

/// PR header line shown above the feedback, when the PR is known.
#[derive(Debug, Clone)]
pub struct PrSummary {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR author
    pub author: String,
    /// Files changed count
    pub changed_files: usize,
    /// Lines added
    pub additions: usize,
    /// Lines deleted
    pub deletions: usize,
}

impl From<&PullRequest> for PrSummary {
    fn from(pr: &PullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.clone(),
            author: pr.author.clone(),
            changed_files: pr.changed_files,
            additions: pr.additions,
            deletions: pr.deletions,
        }
    }
}

/// All items of one category, in comment order.
#[derive(Debug, Clone)]
pub struct CategorySection {
    pub category: Category,
    pub items: Vec<FeedbackItem>,
}

/// Human-facing view of a feedback run.
#[derive(Debug)]
pub struct Report {
    pub pr: Option<PrSummary>,
    pub total_items: usize,
    pub actionable_items: usize,
    /// Items whose mapping is unresolved
    pub unresolved_items: usize,
    /// Non-empty categories, highest priority first
    pub sections: Vec<CategorySection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_summary_from_pull_request() {
        let pr = PullRequest {
            number: 42,
            title: "Add OAuth2 login flow".to_string(),
            author: "alice".to_string(),
            state: "open".to_string(),
            head_sha: "def".to_string(),
            base_sha: "abc".to_string(),
            html_url: "https://github.com/org/repo/pull/42".to_string(),
            changed_files: 7,
            additions: 320,
            deletions: 45,
        };
        let summary = PrSummary::from(&pr);
        assert_eq!(summary.number, 42);
        assert_eq!(summary.author, "alice");
        assert_eq!(summary.deletions, 45);
    }
}
