use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::mapping::LineMapping;

/// Best-guess kind of a review comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Security,
    TypeHint,
    Import,
    Performance,
    Testing,
    Logic,
    Style,
    Docs,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Security,
        Category::TypeHint,
        Category::Import,
        Category::Performance,
        Category::Testing,
        Category::Logic,
        Category::Style,
        Category::Docs,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::TypeHint => "type-hint",
            Category::Import => "import",
            Category::Performance => "performance",
            Category::Testing => "testing",
            Category::Logic => "logic",
            Category::Style => "style",
            Category::Docs => "docs",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Kind of edit a comment asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Remove,
    Replace,
    Move,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Add => write!(f, "add"),
            Action::Remove => write!(f, "remove"),
            Action::Replace => write!(f, "replace"),
            Action::Move => write!(f, "move"),
        }
    }
}

/// A located, categorized review comment. Terminal output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub comment_id: u64,
    pub mapping: LineMapping,
    pub category: Category,
    /// Pattern that decided the category; None for `other`
    pub matched_rule: Option<String>,
    pub action: Action,
    /// False for questions and very short remarks
    pub actionable: bool,
    /// First sentence of the comment
    pub summary: String,
    /// Code from a fenced block in the comment, never generated
    pub suggested_fix: Option<String>,
    pub description: String,
}

/// The feedback.json artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub total_items: usize,
    pub actionable_items: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub items: Vec<FeedbackItem>,
}

impl FeedbackReport {
    pub fn new(items: Vec<FeedbackItem>) -> Self {
        let mut by_category = BTreeMap::new();
        for item in &items {
            *by_category.entry(item.category).or_insert(0) += 1;
        }
        Self {
            total_items: items.len(),
            actionable_items: items.iter().filter(|i| i.actionable).count(),
            by_category,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            assert_eq!(
                serde_json::to_string(&category).unwrap(),
                format!("\"{}\"", category.as_str())
            );
        }
        assert!("typo".parse::<Category>().is_err());
    }

    #[test]
    fn test_by_category_serializes_as_object() {
        let report = FeedbackReport::new(vec![]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["by_category"].is_object());
        assert_eq!(json["total_items"], 0);
    }
}
