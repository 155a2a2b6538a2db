use regex::{Regex, RegexBuilder};

use super::types::{Action, Category};

/// Built-in categorization rules, highest priority first. The first matching
/// pattern decides the category.
pub const BUILTIN_RULES: &[(Category, &str)] = &[
    (Category::Security, r"\bsecurity\b"),
    (Category::Security, r"\bvulnerab"),
    (Category::Security, r"\bsql\b"),
    (Category::Security, r"\binjection\b"),
    (Category::Security, r"\b(xss|csrf|ssrf)\b"),
    (Category::Security, r"\bsanitiz"),
    (Category::Security, r"\b(secret|credential|password)s?\b"),
    (Category::TypeHint, r"\btype (hint|annotation)s?\b"),
    (Category::TypeHint, r"\bannotat(e|ion|ions)\b"),
    (Category::TypeHint, r"\badd (a )?types?\b"),
    (Category::TypeHint, r"\breturn type\b"),
    (Category::TypeHint, r":\s*(int|str|bool|float|list|dict)\b"),
    (Category::TypeHint, r"\btyping\."),
    (Category::Import, r"\b(unused|missing|circular) imports?\b"),
    (Category::Import, r"\bimports?\b"),
    (Category::Performance, r"\bn\+1\b"),
    (Category::Performance, r"\bperformance\b"),
    (Category::Performance, r"\bslow(er|ly)?\b"),
    (Category::Performance, r"\boptimi[sz]"),
    (Category::Performance, r"\befficien"),
    (Category::Performance, r"\b(cache|caching)\b"),
    (Category::Performance, r"\bcomplexity\b"),
    (Category::Performance, r"\ballocat"),
    (Category::Testing, r"\b(unit |integration )?tests?\b"),
    (Category::Testing, r"\bcoverage\b"),
    (Category::Testing, r"\bassert"),
    (Category::Testing, r"\bmock"),
    (Category::Testing, r"\bfixtures?\b"),
    (Category::Logic, r"\bbugs?\b"),
    (Category::Logic, r"\bwrong\b"),
    (Category::Logic, r"\bincorrect\b"),
    (Category::Logic, r"\boff[- ]by[- ]one\b"),
    (Category::Logic, r"\bedge cases?\b"),
    (Category::Logic, r"\brace condition\b"),
    (Category::Logic, r"\bcondition"),
    (Category::Logic, r"\bfix\b"),
    (Category::Style, r"\bformat(ting)?\b"),
    (Category::Style, r"\blint"),
    (Category::Style, r"\bnaming\b"),
    (Category::Style, r"\bconvention"),
    (Category::Style, r"\bstyle\b"),
    (Category::Style, r"\bindent"),
    (Category::Style, r"\b(black|flake8|pylint|ruff|rustfmt|clippy|prettier|eslint)\b"),
    (Category::Docs, r"\bdocstrings?\b"),
    (Category::Docs, r"\bdoc ?comments?\b"),
    (Category::Docs, r"\bdocument(ation|ed)?\b"),
    (Category::Docs, r"\breadme\b"),
    (Category::Docs, r"\bexplain"),
    (Category::Docs, r"\bcomments?\b"),
];

/// Keywords deciding the `action` of a comment, checked in order.
pub const ACTION_RULES: &[(Action, &str)] = &[
    (Action::Add, r"\b(add|include|append|insert)\b"),
    (Action::Remove, r"\b(remove|delete|drop|omit)\b"),
    (Action::Replace, r"\b(replace|change|fix|correct|update|rename)\b"),
    (Action::Move, r"\b(move|reorder|reorgani[sz]e)\b"),
];

/// A `(pattern, category)` pair.
#[derive(Debug, Clone)]
pub struct Rule {
    pub category: Category,
    pattern: Regex,
}

impl Rule {
    pub fn new(category: Category, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            category,
            pattern: case_insensitive(pattern)?,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

pub fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_compile() {
        for (category, pattern) in BUILTIN_RULES {
            assert!(Rule::new(*category, pattern).is_ok(), "{pattern}");
        }
        for (_, pattern) in ACTION_RULES {
            assert!(case_insensitive(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn test_rule_matching_is_case_insensitive() {
        let rule = Rule::new(Category::Performance, r"\bn\+1\b").unwrap();
        assert!(rule.matches("This is an N+1 query"));
        assert!(!rule.matches("n+12 items"));
    }

    #[test]
    fn test_import_rule_ignores_important() {
        let rule = Rule::new(Category::Import, r"\bimports?\b").unwrap();
        assert!(!rule.matches("This is important"));
        assert!(rule.matches("unused import os"));
    }
}
