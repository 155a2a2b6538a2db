use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("malformed diff error in {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl DiffError {
    pub fn path(&self) -> &str {
        match self {
            DiffError::Malformed { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One body line of a hunk. Context lines carry both numbers, removed lines
/// only the old one, added lines only the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub file_path: String,
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Last old-side line this hunk touches. For a pure insertion
    /// (`old_lines == 0`) this is the line the insertion follows.
    pub fn old_last(&self) -> usize {
        if self.old_lines == 0 {
            self.old_start
        } else {
            self.old_start + self.old_lines - 1
        }
    }

    pub fn covers_old(&self, line: usize) -> bool {
        self.old_lines > 0 && line >= self.old_start && line <= self.old_last()
    }

    pub fn covers_new(&self, line: usize) -> bool {
        self.new_lines > 0 && line >= self.new_start && line < self.new_start + self.new_lines
    }

    /// Signed change in line count this hunk introduces.
    pub fn offset(&self) -> i64 {
        self.new_lines as i64 - self.old_lines as i64
    }

    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Added).count()
    }

    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Removed).count()
    }
}

/// A single file section of the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path on the new side (e.g., "src/auth/config.rs")
    pub path: String,
    /// Path on the old side when it differs (renames)
    pub old_path: Option<String>,
    pub is_new: bool,
    pub is_deleted: bool,
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    fn new(path: String) -> Self {
        Self {
            path,
            old_path: None,
            is_new: false,
            is_deleted: false,
            hunks: Vec::new(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.path == path || self.old_path.as_deref() == Some(path)
    }

    pub fn additions(&self) -> usize {
        self.hunks.iter().map(DiffHunk::additions).sum()
    }

    pub fn deletions(&self) -> usize {
        self.hunks.iter().map(DiffHunk::deletions).sum()
    }
}

/// Parse result. Malformed file sections are left out of `files` and
/// reported in `failures`; the rest of the diff is unaffected.
#[derive(Debug, Clone, Default)]
pub struct ParsedDiff {
    pub files: Vec<FileDiff>,
    pub failures: Vec<DiffError>,
    malformed_paths: HashSet<String>,
}

impl ParsedDiff {
    /// Every section for `path`, in diff order. Usually at most one.
    pub fn sections_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FileDiff> + 'a {
        self.files.iter().filter(move |f| f.matches(path))
    }

    pub fn is_malformed(&self, path: &str) -> bool {
        self.malformed_paths.contains(path)
    }

    pub fn failure_for(&self, path: &str) -> Option<&DiffError> {
        self.failures.iter().find(|f| f.path() == path)
    }

    pub fn hunk_count(&self) -> usize {
        self.files.iter().map(|f| f.hunks.len()).sum()
    }
}

/// Parse a unified diff (git-style or plain `---`/`+++` sections).
///
/// Hunk bodies are consumed by their header counts, so a removed line that
/// happens to read `--- x` stays a removed line.
pub fn parse_diff(raw_diff: &str) -> ParsedDiff {
    let next_lines = raw_diff.lines().skip(1).map(Some).chain(std::iter::once(None));
    raw_diff
        .lines()
        .zip(next_lines)
        .fold(DiffFold::default(), DiffFold::feed)
        .finish()
}

struct OpenHunk {
    hunk: DiffHunk,
    old_remaining: usize,
    new_remaining: usize,
    next_old: usize,
    next_new: usize,
}

impl OpenHunk {
    fn is_complete(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }

    fn push(&mut self, kind: LineKind, text: &str) -> Result<(), String> {
        let (old_line, new_line) = match kind {
            LineKind::Context if self.old_remaining > 0 && self.new_remaining > 0 => {
                self.old_remaining -= 1;
                self.new_remaining -= 1;
                (Some(self.next_old), Some(self.next_new))
            }
            LineKind::Removed if self.old_remaining > 0 => {
                self.old_remaining -= 1;
                (Some(self.next_old), None)
            }
            LineKind::Added if self.new_remaining > 0 => {
                self.new_remaining -= 1;
                (None, Some(self.next_new))
            }
            _ => {
                return Err(format!(
                    "hunk @@ -{},{} +{},{} @@ has more {:?} lines than its header declares",
                    self.hunk.old_start,
                    self.hunk.old_lines,
                    self.hunk.new_start,
                    self.hunk.new_lines,
                    kind
                ))
            }
        };
        if old_line.is_some() {
            self.next_old += 1;
        }
        if new_line.is_some() {
            self.next_new += 1;
        }
        self.hunk.lines.push(DiffLine {
            kind,
            text: text.to_string(),
            old_line,
            new_line,
        });
        Ok(())
    }
}

#[derive(Default)]
struct DiffFold {
    done: ParsedDiff,
    current: Option<FileDiff>,
    hunk: Option<OpenHunk>,
    saw_old_header: bool,
    /// Set once the current section is malformed; everything up to the next
    /// file header is dropped.
    skipping: bool,
}

impl DiffFold {
    /// Takes each line together with the one after it; a `--- ` line is
    /// only a file header when a `+++ ` line follows.
    fn feed(mut self, (line, next): (&str, Option<&str>)) -> Self {
        if self.hunk.is_some() {
            match self.feed_hunk_body(line) {
                Ok(true) => return self,
                Ok(false) => {}
                Err(reason) => {
                    self.fail(reason);
                }
            }
        }
        self.feed_header(line, next);
        self
    }

    /// Ok(true) when the line was consumed as body.
    fn feed_hunk_body(&mut self, line: &str) -> Result<bool, String> {
        if line.starts_with('\\') {
            return Ok(true);
        }
        let Some(open) = self.hunk.as_mut() else {
            return Ok(false);
        };

        let (kind, text) = match line.chars().next() {
            Some('+') => (LineKind::Added, &line[1..]),
            Some('-') => (LineKind::Removed, &line[1..]),
            Some(' ') => (LineKind::Context, &line[1..]),
            // Some tools strip the lone space off blank context lines.
            None => (LineKind::Context, ""),
            Some(_) => {
                return Err(format!(
                    "hunk @@ -{},{} +{},{} @@ ended early ({} old and {} new lines missing)",
                    open.hunk.old_start,
                    open.hunk.old_lines,
                    open.hunk.new_start,
                    open.hunk.new_lines,
                    open.old_remaining,
                    open.new_remaining
                ))
            }
        };

        open.push(kind, text)?;
        if open.is_complete() {
            self.close_hunk();
        }
        Ok(true)
    }

    fn feed_header(&mut self, line: &str, next: Option<&str>) {
        let old_header = line
            .strip_prefix("--- ")
            .filter(|_| next.is_some_and(|n| n.starts_with("+++ ")));
        // Leftover body of a broken hunk: only a real file header ends it.
        if self.skipping && old_header.is_none() && !line.starts_with("diff --git ") {
            return;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            self.finish_file();
            let mut parts = rest.split_whitespace();
            let a_path = parts.next().map(|p| strip_side_prefix(p, "a/"));
            let b_path = parts.next().map(|p| strip_side_prefix(p, "b/"));
            let path = b_path.or(a_path).unwrap_or_default();
            self.current = Some(FileDiff::new(path));
            return;
        }

        if let Some(rest) = old_header {
            let starts_new_section = self.skipping
                || self.saw_old_header
                || self.current.as_ref().map_or(true, |f| !f.hunks.is_empty());
            if starts_new_section {
                self.finish_file();
            }
            let old = header_path(rest, "a/");
            let file = self
                .current
                .get_or_insert_with(|| FileDiff::new(old.clone().unwrap_or_default()));
            match old {
                Some(old) if old != file.path => file.old_path = Some(old),
                Some(_) => {}
                None => file.is_new = true,
            }
            self.saw_old_header = true;
            return;
        }

        if let Some(rest) = line.strip_prefix("+++ ") {
            if let Some(file) = self.current.as_mut() {
                match header_path(rest, "b/") {
                    Some(new_path) => {
                        if file.path != new_path {
                            let previous = std::mem::replace(&mut file.path, new_path);
                            if file.old_path.is_none() && !previous.is_empty() {
                                file.old_path = Some(previous);
                            }
                        }
                    }
                    None => file.is_deleted = true,
                }
            }
            return;
        }

        if let Some(file) = self.current.as_mut() {
            if let Some(from) = line.strip_prefix("rename from ") {
                file.old_path = Some(from.trim().to_string());
                return;
            }
            if let Some(to) = line.strip_prefix("rename to ") {
                file.path = to.trim().to_string();
                return;
            }
            if line.starts_with("new file mode") {
                file.is_new = true;
                return;
            }
            if line.starts_with("deleted file mode") {
                file.is_deleted = true;
                return;
            }
        }

        if line.starts_with("@@") && !self.skipping {
            match parse_hunk_header(line) {
                Ok(header) => self.open_hunk(header),
                Err(reason) => self.fail(reason),
            }
        }
    }

    fn open_hunk(&mut self, header: HunkHeader) {
        if self.current.is_none() {
            self.fail("hunk header before any file header".to_string());
            return;
        }
        let file_path = self
            .current
            .as_ref()
            .map(|f| f.path.clone())
            .unwrap_or_default();
        let open = OpenHunk {
            hunk: DiffHunk {
                file_path,
                old_start: header.old_start,
                old_lines: header.old_lines,
                new_start: header.new_start,
                new_lines: header.new_lines,
                lines: Vec::new(),
            },
            old_remaining: header.old_lines,
            new_remaining: header.new_lines,
            next_old: header.old_start,
            next_new: header.new_start,
        };
        let complete = open.is_complete();
        self.hunk = Some(open);
        if complete {
            self.close_hunk();
        }
    }

    fn close_hunk(&mut self) {
        if let (Some(open), Some(file)) = (self.hunk.take(), self.current.as_mut()) {
            file.hunks.push(open.hunk);
        }
    }

    fn fail(&mut self, reason: String) {
        self.hunk = None;
        if self.skipping {
            return;
        }
        self.skipping = true;
        let path = self
            .current
            .as_ref()
            .map(|f| f.path.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        self.done.failures.push(DiffError::Malformed { path, reason });
    }

    fn finish_file(&mut self) {
        if let Some(open) = self.hunk.as_ref() {
            if !open.is_complete() {
                let reason = format!(
                    "hunk @@ -{},{} +{},{} @@ truncated ({} old and {} new lines missing)",
                    open.hunk.old_start,
                    open.hunk.old_lines,
                    open.hunk.new_start,
                    open.hunk.new_lines,
                    open.old_remaining,
                    open.new_remaining
                );
                self.fail(reason);
            }
        }
        self.hunk = None;

        if let Some(file) = self.current.take() {
            if self.skipping {
                self.done.malformed_paths.insert(file.path.clone());
                if let Some(old) = file.old_path {
                    self.done.malformed_paths.insert(old);
                }
            } else {
                self.done.files.push(file);
            }
        }
        self.skipping = false;
        self.saw_old_header = false;
    }

    fn finish(mut self) -> ParsedDiff {
        self.finish_file();
        self.done
    }
}

fn strip_side_prefix(path: &str, prefix: &str) -> String {
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Path from a `---`/`+++` header line; None for /dev/null. Drops the
/// tab-separated timestamp plain `diff -u` appends.
fn header_path(rest: &str, prefix: &str) -> Option<String> {
    let path = rest.split('\t').next().unwrap_or(rest).trim();
    if path == "/dev/null" {
        None
    } else {
        Some(strip_side_prefix(path, prefix))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_start: usize,
    old_lines: usize,
    new_start: usize,
    new_lines: usize,
}

/// Parse `@@ -old_start[,old_lines] +new_start[,new_lines] @@[ heading]`.
fn parse_hunk_header(line: &str) -> Result<HunkHeader, String> {
    let body = line
        .strip_prefix("@@")
        .ok_or_else(|| format!("invalid hunk header: {line}"))?;
    let (ranges, _heading) = body
        .split_once("@@")
        .ok_or_else(|| format!("hunk header missing closing @@: {line}"))?;

    let mut parts = ranges.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| format!("hunk header missing old range: {line}"))?;
    let new_part = parts
        .next()
        .ok_or_else(|| format!("hunk header missing new range: {line}"))?;
    if parts.next().is_some() {
        return Err(format!("hunk header has extra ranges: {line}"));
    }

    let (old_start, old_lines) = parse_range(old_part, '-')?;
    let (new_start, new_lines) = parse_range(new_part, '+')?;

    Ok(HunkHeader {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), String> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| format!("invalid range prefix in {part}"))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| format!("invalid range start in {part}"))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| format!("invalid range count in {part}"))?;
    Ok((start, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DIFF: &str = r#"diff --git a/src/main.rs b/src/main.rs
index abc1234..def5678 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@ fn main() {
 fn main() {
-    println!("old");
+    println!("new");
+    // Added a comment
 }
"#;

    #[test]
    fn test_parse_single_file_diff() {
        let parsed = parse_diff(SAMPLE_DIFF);
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.files.len(), 1);
        let file = &parsed.files[0];
        assert_eq!(file.path, "src/main.rs");
        assert_eq!(file.old_path, None);
        assert_eq!(file.additions(), 2);
        assert_eq!(file.deletions(), 1);

        let hunk = &file.hunks[0];
        assert_eq!((hunk.old_start, hunk.old_lines, hunk.new_start, hunk.new_lines), (1, 3, 1, 4));
        assert_eq!(hunk.file_path, "src/main.rs");
        let kinds: Vec<LineKind> = hunk.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Context,
                LineKind::Removed,
                LineKind::Added,
                LineKind::Added,
                LineKind::Context
            ]
        );
        let last = hunk.lines.last().unwrap();
        assert_eq!((last.old_line, last.new_line), (Some(3), Some(4)));
        assert_eq!(last.text, "}");
    }

    #[test]
    fn test_hunk_counts_match_line_tags() {
        let parsed = parse_diff(include_str!("../../tests/fixtures/sample_diff.patch"));
        assert!(parsed.failures.is_empty());
        for hunk in parsed.files.iter().flat_map(|f| &f.hunks) {
            let old = hunk.lines.iter().filter(|l| l.kind != LineKind::Added).count();
            let new = hunk.lines.iter().filter(|l| l.kind != LineKind::Removed).count();
            assert_eq!(old, hunk.old_lines);
            assert_eq!(new, hunk.new_lines);
        }
    }

    #[test]
    fn test_parse_new_file_diff() {
        let diff = r#"diff --git a/new_file.txt b/new_file.txt
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ b/new_file.txt
@@ -0,0 +1,2 @@
+hello
+world
"#;
        let parsed = parse_diff(diff);
        assert_eq!(parsed.files.len(), 1);
        assert!(parsed.files[0].is_new);
        assert!(!parsed.files[0].is_deleted);
        assert_eq!(parsed.files[0].path, "new_file.txt");
    }

    #[test]
    fn test_parse_deleted_file_diff() {
        let diff = r#"diff --git a/old_file.txt b/old_file.txt
deleted file mode 100644
index e69de29..0000000
--- a/old_file.txt
+++ /dev/null
@@ -1,2 +0,0 @@
-hello
-world
"#;
        let parsed = parse_diff(diff);
        assert_eq!(parsed.files.len(), 1);
        assert!(!parsed.files[0].is_new);
        assert!(parsed.files[0].is_deleted);
        assert_eq!(parsed.files[0].path, "old_file.txt");
    }

    #[test]
    fn test_parse_rename() {
        let diff = r#"diff --git a/old/name.rs b/new/name.rs
similarity index 90%
rename from old/name.rs
rename to new/name.rs
--- a/old/name.rs
+++ b/new/name.rs
@@ -1,2 +1,2 @@
-use a;
+use b;
 fn f() {}
"#;
        let parsed = parse_diff(diff);
        let file = &parsed.files[0];
        assert_eq!(file.path, "new/name.rs");
        assert_eq!(file.old_path.as_deref(), Some("old/name.rs"));
        assert!(file.matches("old/name.rs"));
        assert!(file.matches("new/name.rs"));
    }

    #[test]
    fn test_parse_empty_diff() {
        let parsed = parse_diff("");
        assert!(parsed.files.is_empty());
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_plain_diff_without_git_headers() {
        let diff = "--- a/one.txt\t2024-01-01 00:00:00\n+++ b/one.txt\t2024-01-02 00:00:00\n@@ -1 +1 @@\n-a\n+b\n--- a/two.txt\n+++ b/two.txt\n@@ -3,0 +4 @@\n+c\n";
        let parsed = parse_diff(diff);
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.files.len(), 2);
        assert_eq!(parsed.files[0].path, "one.txt");
        assert_eq!(parsed.files[1].path, "two.txt");
        let insertion = &parsed.files[1].hunks[0];
        assert_eq!((insertion.old_start, insertion.old_lines), (3, 0));
        assert_eq!(insertion.old_last(), 3);
        assert!(!insertion.covers_old(3));
    }

    #[test]
    fn test_removed_line_that_looks_like_header() {
        let diff = "--- a/notes.md\n+++ b/notes.md\n@@ -1,2 +1,1 @@\n--- a/section rule\n keep\n";
        let parsed = parse_diff(diff);
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.files.len(), 1);
        let hunk = &parsed.files[0].hunks[0];
        assert_eq!(hunk.lines[0].kind, LineKind::Removed);
        assert_eq!(hunk.lines[0].text, "-- a/section rule");
    }

    #[test]
    fn test_skipped_section_body_never_starts_a_file() {
        let diff = r#"diff --git a/q.sql b/q.sql
--- a/q.sql
+++ b/q.sql
@@ -1,3 +1,1 @@
 select 1;
?stray
--- x
@@ -5,1 +5,1 @@
-a
+b
diff --git a/b.txt b/b.txt
--- a/b.txt
+++ b/b.txt
@@ -1,1 +1,2 @@
 x
+y
"#;
        let parsed = parse_diff(diff);
        let paths: Vec<&str> = parsed.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b.txt"]);
        assert_eq!(parsed.failures.len(), 1);
        assert!(parsed.is_malformed("q.sql"));
        assert!(!parsed.is_malformed("x"));
        assert_eq!(parsed.sections_for("x").count(), 0);
    }

    #[test]
    fn test_old_header_needs_new_header_after_it() {
        // "--- note" with no "+++" after it is not a section header
        let diff = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n--- note\n--- a/y\n+++ b/y\n@@ -1 +1,2 @@\n a\n+c\n";
        let parsed = parse_diff(diff);
        assert!(parsed.failures.is_empty());
        let paths: Vec<&str> = parsed.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["x", "y"]);
    }

    #[test]
    fn test_no_newline_marker_ignored() {
        let diff = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n";
        let parsed = parse_diff(diff);
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_missing_closing_marker_isolated_to_file() {
        let diff = r#"diff --git a/file_a.py b/file_a.py
--- a/file_a.py
+++ b/file_a.py
@@ -1,2 +1,3
 a
+b
 c
diff --git a/file_b.py b/file_b.py
--- a/file_b.py
+++ b/file_b.py
@@ -1,1 +1,2 @@
 x
+y
"#;
        let parsed = parse_diff(diff);
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].path(), "file_a.py");
        assert!(parsed.failures[0].to_string().contains("closing @@"));
        assert!(parsed.is_malformed("file_a.py"));
        assert!(!parsed.is_malformed("file_b.py"));
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].path, "file_b.py");
    }

    #[test]
    fn test_truncated_hunk_is_malformed() {
        let diff = "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n-b\n+c\n";
        let parsed = parse_diff(diff);
        assert!(parsed.files.is_empty());
        assert!(parsed.failure_for("x").unwrap().to_string().contains("truncated"));
    }

    #[test]
    fn test_hunk_ending_early_is_malformed() {
        let diff = "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n@@ -9,1 +9,1 @@\n-q\n+r\n";
        let parsed = parse_diff(diff);
        assert!(parsed.is_malformed("x"));
        assert!(parsed.failure_for("x").unwrap().to_string().contains("ended early"));
    }

    #[test]
    fn test_body_contradicting_header_is_malformed() {
        let diff = "--- a/x\n+++ b/x\n@@ -1,2 +1,1 @@\n+b\n a\n";
        let parsed = parse_diff(diff);
        assert!(parsed.is_malformed("x"));
        assert!(parsed.files.is_empty());
    }

    #[test]
    fn test_lines_after_complete_hunk_are_ignored() {
        let diff = "--- a/x\n+++ b/x\n@@ -1,1 +1,2 @@\n a\n+b\n+c\n";
        let parsed = parse_diff(diff);
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_parse_hunk_header_variants() {
        let h = parse_hunk_header("@@ -10,5 +10,7 @@ impl Foo {").unwrap();
        assert_eq!((h.old_start, h.old_lines, h.new_start, h.new_lines), (10, 5, 10, 7));
        let h = parse_hunk_header("@@ -3 +3 @@").unwrap();
        assert_eq!((h.old_lines, h.new_lines), (1, 1));
        assert!(parse_hunk_header("@@ -a,1 +1,1 @@").is_err());
        assert!(parse_hunk_header("@@ 1,1 +1,1 @@").is_err());
        assert!(parse_hunk_header("@@ -1,1 +1,1").is_err());
    }
}
