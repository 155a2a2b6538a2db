pub mod types;
pub mod workspace;

pub use types::{Confidence, LineMapping, MappingReport};
pub use workspace::{FileLines, NoWorkingCopy, WorkingCopy};

use tracing::{debug, instrument, warn};

use crate::pr::diff::{DiffHunk, FileDiff, LineKind, ParsedDiff};
use crate::pr::ReviewComment;

/// Map every comment onto the current version of its file.
///
/// `head` is the commit the diff ends at. A comment made on that commit is
/// already anchored to the current version and is looked up on the diff's
/// new side. Any other comment is taken to be anchored to the diff's old
/// side and moved by the hunks in between. Pure: the same inputs always
/// give the same mappings, in comment order.
#[instrument(skip_all, fields(comments = comments.len(), files = diff.files.len(), head = ?head))]
pub fn map_comments(
    diff: &ParsedDiff,
    comments: &[ReviewComment],
    head: Option<&str>,
    files: &dyn FileLines,
) -> Vec<LineMapping> {
    for failure in &diff.failures {
        warn!(error = %failure, "comments on this file will be unresolved");
    }

    let mappings: Vec<LineMapping> = comments
        .iter()
        .map(|comment| map_comment(diff, comment, head, files))
        .collect();

    debug!(
        resolved = mappings.iter().filter(|m| m.is_resolved()).count(),
        "mapped comments"
    );
    mappings
}

pub fn map_comment(
    diff: &ParsedDiff,
    comment: &ReviewComment,
    head: Option<&str>,
    files: &dyn FileLines,
) -> LineMapping {
    let path = comment.file_path.as_str();

    let Some(anchor) = comment.anchor_line.filter(|line| *line > 0) else {
        return unresolved(comment, Some(path), "comment is not anchored to a line of the commented version");
    };

    if diff.is_malformed(path) {
        let reason = diff
            .failure_for(path)
            .map(ToString::to_string)
            .unwrap_or_else(|| "diff for this file is malformed".to_string());
        return unresolved(comment, Some(path), reason);
    }

    let located = if made_on_head(comment, head) {
        locate_at_head(diff, path, anchor)
    } else {
        locate(diff, path, anchor)
    };
    let location = match located {
        Ok(location) => location,
        Err(miss) => {
            let current_path = miss.file_exists.then_some(path);
            return unresolved(comment, current_path, miss.reason);
        }
    };

    if let Some(count) = files.line_count(&location.path) {
        if location.line > count {
            let reason = format!(
                "line {} is past the end of the current file ({} lines)",
                location.line, count
            );
            return unresolved(comment, Some(&location.path), reason);
        }
    }

    LineMapping {
        comment_id: comment.id,
        comment_path: comment.file_path.clone(),
        anchor_line: comment.anchor_line,
        resolved_file_path: Some(location.path),
        resolved_line: Some(location.line),
        confidence: location.confidence,
        reason: None,
    }
}

struct Location {
    path: String,
    line: usize,
    confidence: Confidence,
}

struct Miss {
    file_exists: bool,
    reason: String,
}

impl Miss {
    fn line_gone(reason: impl Into<String>) -> Self {
        Self {
            file_exists: true,
            reason: reason.into(),
        }
    }

    fn file_gone() -> Self {
        Self {
            file_exists: false,
            reason: "file was deleted".to_string(),
        }
    }
}

/// Full and abbreviated shas of the same commit compare equal.
fn made_on_head(comment: &ReviewComment, head: Option<&str>) -> bool {
    let commit = comment.anchor_commit.trim();
    match head.map(str::trim) {
        Some(head) if !head.is_empty() && !commit.is_empty() => {
            head.starts_with(commit) || commit.starts_with(head)
        }
        _ => false,
    }
}

/// `anchor` is a new-side number: context and added lines, and lines
/// outside every hunk, are where the comment left them.
fn locate_at_head(diff: &ParsedDiff, path: &str, anchor: usize) -> Result<Location, Miss> {
    let Some(latest) = diff.sections_for(path).last() else {
        return Ok(Location {
            path: path.to_string(),
            line: anchor,
            confidence: Confidence::Exact,
        });
    };
    if latest.is_deleted {
        return Err(Miss::file_gone());
    }

    if let Some(hunk) = latest.hunks.iter().find(|hunk| hunk.covers_new(anchor)) {
        if !hunk.lines.iter().any(|line| line.new_line == Some(anchor)) {
            return Err(Miss::line_gone(format!("line {anchor} missing from its hunk")));
        }
    }

    Ok(Location {
        path: latest.path.clone(),
        line: anchor,
        confidence: Confidence::Exact,
    })
}

fn locate(diff: &ParsedDiff, path: &str, anchor: usize) -> Result<Location, Miss> {
    let sections: Vec<&FileDiff> = diff.sections_for(path).collect();
    let Some(latest) = sections.last() else {
        // Untouched since the anchor commit.
        return Ok(Location {
            path: path.to_string(),
            line: anchor,
            confidence: Confidence::Exact,
        });
    };

    // Several sections can cover the same line (e.g. a diff assembled from
    // amended commits); the hunk starting closest to the anchor wins.
    let covering = sections
        .iter()
        .flat_map(|file| file.hunks.iter().map(move |hunk| (*file, hunk)))
        .filter(|(_, hunk)| hunk.covers_old(anchor))
        .min_by_key(|(_, hunk)| anchor.abs_diff(hunk.old_start));

    match covering {
        Some((file, hunk)) => locate_in_hunk(file, hunk, anchor),
        None => locate_between_hunks(latest, anchor),
    }
}

fn locate_in_hunk(file: &FileDiff, hunk: &DiffHunk, anchor: usize) -> Result<Location, Miss> {
    if file.is_deleted {
        return Err(Miss::file_gone());
    }

    let idx = hunk
        .lines
        .iter()
        .position(|line| line.old_line == Some(anchor))
        .ok_or_else(|| Miss::line_gone(format!("line {anchor} missing from its hunk")))?;

    let new_line = match hunk.lines[idx].kind {
        LineKind::Context => hunk.lines[idx].new_line,
        LineKind::Removed => replacement_line(hunk, idx),
        LineKind::Added => None,
    };
    let Some(line) = new_line else {
        return Err(Miss::line_gone(format!(
            "line {anchor} was removed with no 1:1 replacement"
        )));
    };

    let confidence = if hunk.lines[idx].kind == LineKind::Context && line == anchor {
        Confidence::Exact
    } else {
        Confidence::Shifted
    };
    Ok(Location {
        path: file.path.clone(),
        line,
        confidence,
    })
}

/// New-side line replacing the removed line at `idx`, when the removed run
/// it belongs to is immediately followed by an added run of equal length.
fn replacement_line(hunk: &DiffHunk, idx: usize) -> Option<usize> {
    let is_removed = |kind: LineKind| kind == LineKind::Removed;
    let run_start = hunk.lines[..idx]
        .iter()
        .rposition(|l| !is_removed(l.kind))
        .map_or(0, |p| p + 1);
    let run_end = hunk.lines[idx..]
        .iter()
        .position(|l| !is_removed(l.kind))
        .map_or(hunk.lines.len(), |p| idx + p);

    let added: Vec<_> = hunk.lines[run_end..]
        .iter()
        .take_while(|l| l.kind == LineKind::Added)
        .collect();
    if added.len() != run_end - run_start {
        return None;
    }
    added[idx - run_start].new_line
}

fn locate_between_hunks(file: &FileDiff, anchor: usize) -> Result<Location, Miss> {
    if file.is_deleted {
        return Err(Miss::file_gone());
    }
    if file.is_new {
        return Err(Miss::line_gone("file did not exist at the commented version"));
    }

    let offset: i64 = file
        .hunks
        .iter()
        .filter(|hunk| hunk.old_last() < anchor)
        .map(DiffHunk::offset)
        .sum();
    let line = anchor as i64 + offset;
    if line < 1 {
        return Err(Miss::line_gone(format!("line {anchor} shifted before the start of the file")));
    }

    Ok(Location {
        path: file.path.clone(),
        line: line as usize,
        confidence: if offset == 0 {
            Confidence::Exact
        } else {
            Confidence::Shifted
        },
    })
}

fn unresolved(comment: &ReviewComment, path: Option<&str>, reason: impl Into<String>) -> LineMapping {
    LineMapping {
        comment_id: comment.id,
        comment_path: comment.file_path.clone(),
        anchor_line: comment.anchor_line,
        resolved_file_path: path.map(str::to_string),
        resolved_line: None,
        confidence: Confidence::Unresolved,
        reason: Some(reason.into()),
    }
}
