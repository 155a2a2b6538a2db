//! Feedback given outside a pull request, e.g. pasted into a chat:
//! `@src/db.py:45` plus free text such as "Line 12: use a set".

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Action, Categorizer, Category, FeedbackError};

const MIN_DESCRIPTION_LEN: usize = 6;
const MIN_WHOLE_TEXT_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
}

/// `@path`, `@path:45`, `@path:function` or `@path:Type.method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub file_path: String,
    pub line_number: Option<usize>,
    pub symbol_name: Option<String>,
    pub symbol_kind: Option<SymbolKind>,
}

impl FileReference {
    fn path_only(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            line_number: None,
            symbol_name: None,
            symbol_kind: None,
        }
    }
}

pub fn parse_file_reference(reference: &str) -> FileReference {
    let reference = reference.trim().trim_start_matches('@');
    let Some((path, target)) = reference.split_once(':') else {
        return FileReference::path_only(reference);
    };
    if target.is_empty() {
        return FileReference::path_only(path);
    }

    if let Ok(line) = target.parse::<usize>() {
        return FileReference {
            line_number: Some(line),
            ..FileReference::path_only(path)
        };
    }

    let kind = if target.contains('.') {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };
    FileReference {
        symbol_name: Some(target.to_string()),
        symbol_kind: Some(kind),
        ..FileReference::path_only(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectItem {
    pub file_path: String,
    pub line_number: Option<usize>,
    pub symbol_name: Option<String>,
    pub symbol_kind: Option<SymbolKind>,
    pub description: String,
    pub category: Category,
    pub action: Action,
}

/// Output of `pr-feedback direct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectFeedback {
    pub file_reference: FileReference,
    pub total_items: usize,
    pub items: Vec<DirectItem>,
}

struct Draft {
    reference: FileReference,
    line_number: Option<usize>,
    description: String,
}

pub struct DirectParser {
    numbered_line: Regex,
    line_marker: Regex,
    function_marker: Regex,
    numbered: Regex,
    embedded_line: Regex,
}

impl DirectParser {
    pub fn new() -> Result<Self, FeedbackError> {
        Ok(Self {
            numbered_line: compile(r"(?m)^\s*\d+\.\s*Line\s+(\d+)\s*:\s*(.+)$")?,
            line_marker: compile(r"Line\s+(\d+)\s*[:-]\s*")?,
            function_marker: compile(r#"Function\s+['"]([^'"]+)['"]\s+"#)?,
            numbered: compile(r"(?m)^\s*\d+\.\s*(.+)$")?,
            embedded_line: compile(r"(?i)\b(?:line|at|row)\s+(\d+)")?,
        })
    }

    pub fn parse(&self, reference: &str, text: &str, categorizer: &Categorizer) -> DirectFeedback {
        let file_reference = parse_file_reference(reference);
        let items: Vec<DirectItem> = self
            .drafts(text, &file_reference)
            .into_iter()
            .map(|draft| {
                let (category, _) = categorizer.categorize(&draft.description);
                DirectItem {
                    file_path: draft.reference.file_path,
                    line_number: draft.line_number.or(draft.reference.line_number),
                    symbol_name: draft.reference.symbol_name,
                    symbol_kind: draft.reference.symbol_kind,
                    action: categorizer.action(&draft.description),
                    description: draft.description,
                    category,
                }
            })
            .collect();

        DirectFeedback {
            file_reference,
            total_items: items.len(),
            items,
        }
    }

    fn drafts(&self, text: &str, reference: &FileReference) -> Vec<Draft> {
        let mut drafts = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |drafts: &mut Vec<Draft>, reference: FileReference, line: Option<usize>, description: &str| {
            let description = description.trim().to_string();
            if seen.insert((reference.symbol_name.clone(), line, description.clone())) {
                drafts.push(Draft {
                    reference,
                    line_number: line,
                    description,
                });
            }
        };

        // "1. Line 12: description"
        for caps in self.numbered_line.captures_iter(text) {
            push(&mut drafts, reference.clone(), caps[1].parse().ok(), &caps[2]);
        }

        // "Line 12 - description" up to the next marker, first line only
        for (line, body) in segments(&self.line_marker, text) {
            let description = first_line(body);
            if description.len() >= MIN_DESCRIPTION_LEN {
                push(&mut drafts, reference.clone(), line.parse().ok(), description);
            }
        }

        // "Function 'name' description"
        for (name, body) in segments(&self.function_marker, text) {
            let description = first_line(body);
            if description.len() >= MIN_DESCRIPTION_LEN {
                let symbol = FileReference {
                    symbol_name: Some(name.to_string()),
                    symbol_kind: Some(SymbolKind::Function),
                    ..FileReference::path_only(&reference.file_path)
                };
                push(&mut drafts, symbol, None, description);
            }
        }

        if drafts.is_empty() {
            let numbered: Vec<_> = self.numbered.captures_iter(text).collect();
            if numbered.len() > 1 {
                for caps in numbered {
                    let description = caps[1].trim();
                    if description.len() >= MIN_DESCRIPTION_LEN {
                        push(&mut drafts, reference.clone(), None, description);
                    }
                }
            }
        }

        if drafts.is_empty() && text.trim().len() >= MIN_WHOLE_TEXT_LEN {
            let line = self
                .embedded_line
                .captures(text)
                .and_then(|caps| caps[1].parse().ok());
            push(&mut drafts, reference.clone(), line, text);
        }

        drafts
    }
}

/// First capture group of each marker match, with the text that follows
/// it up to the next match.
fn segments<'t>(marker: &Regex, text: &'t str) -> Vec<(&'t str, &'t str)> {
    let spans: Vec<(usize, usize, &'t str)> = marker
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let group = caps.get(1)?;
            Some((whole.start(), whole.end(), group.as_str()))
        })
        .collect();

    spans
        .iter()
        .enumerate()
        .map(|(i, (_, end, group))| {
            let next = spans.get(i + 1).map_or(text.len(), |(start, _, _)| *start);
            (*group, &text[*end..next])
        })
        .collect()
}

fn first_line(body: &str) -> &str {
    body.trim().lines().next().unwrap_or("").trim()
}

fn compile(pattern: &str) -> Result<Regex, FeedbackError> {
    Regex::new(pattern).map_err(|source| FeedbackError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedbackConfig;

    fn parse(reference: &str, text: &str) -> DirectFeedback {
        let categorizer = Categorizer::from_config(&FeedbackConfig::default()).unwrap();
        DirectParser::new().unwrap().parse(reference, text, &categorizer)
    }

    #[test]
    fn test_file_reference_forms() {
        assert_eq!(parse_file_reference("@src/db.py"), FileReference::path_only("src/db.py"));

        let line = parse_file_reference("@src/db.py:45");
        assert_eq!(line.file_path, "src/db.py");
        assert_eq!(line.line_number, Some(45));

        let function = parse_file_reference("@src/db.py:connect");
        assert_eq!(function.symbol_name.as_deref(), Some("connect"));
        assert_eq!(function.symbol_kind, Some(SymbolKind::Function));

        let method = parse_file_reference("src/db.py:Pool.acquire");
        assert_eq!(method.symbol_kind, Some(SymbolKind::Method));
        assert_eq!(method.file_path, "src/db.py");
    }

    #[test]
    fn test_numbered_line_items_are_not_duplicated() {
        let feedback = parse(
            "@app/db.py",
            "1. Line 12: use a parameterized query\n2. Line 30: add a docstring here",
        );
        assert_eq!(feedback.total_items, 2);
        assert_eq!(feedback.items[0].line_number, Some(12));
        assert_eq!(feedback.items[0].category, Category::Other);
        assert_eq!(feedback.items[1].line_number, Some(30));
        assert_eq!(feedback.items[1].category, Category::Docs);
        assert_eq!(feedback.items[1].action, Action::Add);
    }

    #[test]
    fn test_line_dash_items() {
        let feedback = parse("@app/db.py", "Line 3 - SQL injection via string concat Line 9 - slow loop over rows");
        assert_eq!(feedback.total_items, 2);
        assert_eq!(feedback.items[0].category, Category::Security);
        assert_eq!(feedback.items[1].line_number, Some(9));
        assert_eq!(feedback.items[1].category, Category::Performance);
    }

    #[test]
    fn test_function_items_carry_symbol() {
        let feedback = parse("@app/db.py", "Function 'connect' should close the socket on error");
        assert_eq!(feedback.total_items, 1);
        let item = &feedback.items[0];
        assert_eq!(item.symbol_name.as_deref(), Some("connect"));
        assert_eq!(item.symbol_kind, Some(SymbolKind::Function));
        assert_eq!(item.file_path, "app/db.py");
    }

    #[test]
    fn test_plain_numbered_list() {
        let feedback = parse("@app/db.py:7", "1. rename conn to connection\n2. remove the print call");
        assert_eq!(feedback.total_items, 2);
        assert_eq!(feedback.items[0].line_number, Some(7));
        assert_eq!(feedback.items[1].action, Action::Remove);
    }

    #[test]
    fn test_whole_text_fallback_with_embedded_line() {
        let feedback = parse("@app/db.py", "the retry loop at 88 never backs off");
        assert_eq!(feedback.total_items, 1);
        assert_eq!(feedback.items[0].line_number, Some(88));

        let empty = parse("@app/db.py", "ok");
        assert_eq!(empty.total_items, 0);
    }
}
