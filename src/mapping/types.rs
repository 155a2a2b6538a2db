use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pr::diff::ParsedDiff;

/// How reliably a comment's anchor maps onto the current file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Unchanged line, same number.
    Exact,
    /// Unchanged (or 1:1 replaced) line at a different number.
    Shifted,
    /// No current location could be determined.
    Unresolved,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Exact => write!(f, "exact"),
            Confidence::Shifted => write!(f, "shifted"),
            Confidence::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Best-effort current location of one review comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMapping {
    pub comment_id: u64,
    /// Path the comment was anchored to
    pub comment_path: String,
    pub anchor_line: Option<usize>,
    /// None when the file no longer exists
    pub resolved_file_path: Option<String>,
    pub resolved_line: Option<usize>,
    pub confidence: Confidence,
    /// Why the mapping is unresolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LineMapping {
    pub fn is_resolved(&self) -> bool {
        self.confidence != Confidence::Unresolved
    }
}

/// The mappings.json artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingReport {
    pub mappings: Vec<LineMapping>,
    pub total_comments: usize,
    pub mapped_comments: usize,
    /// One entry per malformed file section
    #[serde(default)]
    pub failures: Vec<String>,
}

impl MappingReport {
    pub fn new(mappings: Vec<LineMapping>, diff: &ParsedDiff) -> Self {
        Self {
            total_comments: mappings.len(),
            mapped_comments: mappings.iter().filter(|m| m.is_resolved()).count(),
            failures: diff.failures.iter().map(ToString::to_string).collect(),
            mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::Shifted).unwrap(), "\"shifted\"");
        assert_eq!(Confidence::Unresolved.to_string(), "unresolved");
    }

    #[test]
    fn test_unresolved_mapping_serializes_nulls() {
        let mapping = LineMapping {
            comment_id: 3,
            comment_path: "gone.py".to_string(),
            anchor_line: Some(4),
            resolved_file_path: None,
            resolved_line: None,
            confidence: Confidence::Unresolved,
            reason: Some("file deleted".to_string()),
        };
        let json = serde_json::to_value(&mapping).unwrap();
        assert!(json["resolved_line"].is_null());
        assert!(json["resolved_file_path"].is_null());
        assert_eq!(json["confidence"], "unresolved");
    }
}
