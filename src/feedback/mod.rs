pub mod direct;
pub mod rules;
pub mod types;

pub use types::{Action, Category, FeedbackItem, FeedbackReport};

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::FeedbackConfig;
use crate::mapping::{Confidence, LineMapping};
use crate::pr::ReviewComment;
use rules::{case_insensitive, Rule, ACTION_RULES, BUILTIN_RULES};

const SUMMARY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("invalid feedback rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid feedback rule: {0}")]
    UnknownCategory(String),
}

/// Heuristic comment classifier.
///
/// Categories are a best guess from keyword patterns over the comment text,
/// never program analysis. Categorization itself cannot fail: anything no
/// rule matches is `other`.
pub struct Categorizer {
    rules: Vec<Rule>,
    actions: Vec<(Action, Regex)>,
    question: Regex,
    sentence: Regex,
    suggestion_block: Regex,
    code_block: Regex,
    min_body_len: usize,
}

impl Categorizer {
    /// Compile configured extra rules (first) and the built-in rules.
    pub fn from_config(config: &FeedbackConfig) -> Result<Self, FeedbackError> {
        let mut rules = Vec::with_capacity(config.extra_rules.len() + BUILTIN_RULES.len());
        for extra in &config.extra_rules {
            let category = extra
                .category
                .parse::<Category>()
                .map_err(FeedbackError::UnknownCategory)?;
            rules.push(compile_rule(category, &extra.pattern)?);
        }
        for (category, pattern) in BUILTIN_RULES {
            rules.push(compile_rule(*category, pattern)?);
        }

        let actions = ACTION_RULES
            .iter()
            .map(|(action, pattern)| Ok((*action, compile(pattern)?)))
            .collect::<Result<Vec<_>, FeedbackError>>()?;

        Ok(Self {
            rules,
            actions,
            question: compile(r"^(why|what|how|when|where|who|which)\b")?,
            sentence: compile(r"(?s)^(.{10,200}?[.!?])(\s|$)")?,
            suggestion_block: compile(r"(?s)```suggestion[^\n]*\n(.*?)```")?,
            code_block: compile(r"(?s)```[^\n]*\n(.*?)```")?,
            min_body_len: config.min_body_len,
        })
    }

    /// First matching rule wins; `other` when none match.
    pub fn categorize(&self, text: &str) -> (Category, Option<&str>) {
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| (rule.category, Some(rule.pattern())))
            .unwrap_or((Category::Other, None))
    }

    pub fn action(&self, text: &str) -> Action {
        self.actions
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(action, _)| *action)
            .unwrap_or(Action::Replace)
    }

    pub fn is_actionable(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() < self.min_body_len {
            return false;
        }
        !(self.question.is_match(text) && text.ends_with('?'))
    }

    pub fn summary(&self, text: &str) -> String {
        let text = text.trim();
        match self.sentence.captures(text) {
            Some(caps) => caps[1].to_string(),
            None => text.chars().take(SUMMARY_LIMIT).collect(),
        }
    }

    /// Contents of a ```suggestion block, else of the first fenced block.
    pub fn suggested_fix(&self, text: &str) -> Option<String> {
        self.suggestion_block
            .captures(text)
            .or_else(|| self.code_block.captures(text))
            .map(|caps| caps[1].trim_end_matches(['\n', '\r']).to_string())
    }

    pub fn build_item(&self, comment: &ReviewComment, mapping: &LineMapping) -> FeedbackItem {
        let (category, matched_rule) = self.categorize(&comment.body);
        FeedbackItem {
            comment_id: comment.id,
            mapping: mapping.clone(),
            category,
            matched_rule: matched_rule.map(str::to_string),
            action: self.action(&comment.body),
            actionable: self.is_actionable(&comment.body),
            summary: self.summary(&comment.body),
            suggested_fix: self.suggested_fix(&comment.body),
            description: comment.body.clone(),
        }
    }

    /// Pair every comment with its mapping by id and categorize it, in
    /// comment order. A comment with no mapping is treated as unresolved.
    #[instrument(skip_all, fields(comments = comments.len(), mappings = mappings.len()))]
    pub fn categorize_all(&self, comments: &[ReviewComment], mappings: &[LineMapping]) -> Vec<FeedbackItem> {
        let by_id: HashMap<u64, &LineMapping> = mappings.iter().map(|m| (m.comment_id, m)).collect();

        let items: Vec<FeedbackItem> = comments
            .iter()
            .map(|comment| match by_id.get(&comment.id) {
                Some(mapping) => self.build_item(comment, mapping),
                None => self.build_item(comment, &missing_mapping(comment)),
            })
            .collect();

        debug!(
            items = items.len(),
            actionable = items.iter().filter(|i| i.actionable).count(),
            "categorized feedback"
        );
        items
    }
}

fn compile(pattern: &str) -> Result<Regex, FeedbackError> {
    case_insensitive(pattern).map_err(|source| FeedbackError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_rule(category: Category, pattern: &str) -> Result<Rule, FeedbackError> {
    Rule::new(category, pattern).map_err(|source| FeedbackError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn missing_mapping(comment: &ReviewComment) -> LineMapping {
    LineMapping {
        comment_id: comment.id,
        comment_path: comment.file_path.clone(),
        anchor_line: comment.anchor_line,
        resolved_file_path: Some(comment.file_path.clone()),
        resolved_line: None,
        confidence: Confidence::Unresolved,
        reason: Some("no mapping supplied for this comment".to_string()),
    }
}
