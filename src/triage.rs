use serde::Serialize;
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

use crate::feedback::FeedbackItem;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("failed to read decision: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Skip,
    Quit,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TriageOutcome {
    pub accepted: Vec<FeedbackItem>,
    pub skipped: Vec<FeedbackItem>,
    /// Items never shown because the operator quit
    pub untouched: Vec<FeedbackItem>,
}

/// Walk the items in order, asking `decide` about each one. Quit stops the
/// walk; everything not yet shown ends up in `untouched`.
pub fn triage<F>(items: Vec<FeedbackItem>, mut decide: F) -> Result<TriageOutcome, TriageError>
where
    F: FnMut(&FeedbackItem) -> Result<Decision, TriageError>,
{
    let mut outcome = TriageOutcome::default();
    let mut items = items.into_iter();

    for item in items.by_ref() {
        match decide(&item)? {
            Decision::Accept => outcome.accepted.push(item),
            Decision::Skip => outcome.skipped.push(item),
            Decision::Quit => {
                outcome.untouched.push(item);
                break;
            }
        }
    }
    outcome.untouched.extend(items);

    info!(
        accepted = outcome.accepted.len(),
        skipped = outcome.skipped.len(),
        untouched = outcome.untouched.len(),
        "triage finished"
    );
    Ok(outcome)
}

/// Prompt on `output`, read one answer per item from `input`. Anything
/// other than a/s/q is asked again; end of input quits.
pub fn prompt_decision<R: BufRead, W: Write>(
    item: &FeedbackItem,
    input: &mut R,
    output: &mut W,
) -> Result<Decision, TriageError> {
    let location = match (&item.mapping.resolved_file_path, item.mapping.resolved_line) {
        (Some(path), Some(line)) => format!("{}:{}", path, line),
        (Some(path), None) => format!("{} (line unresolved)", path),
        _ => format!("{} (file gone)", item.mapping.comment_path),
    };
    writeln!(output, "\n[{}] {} ({})", item.category, location, item.mapping.confidence)?;
    writeln!(output, "  {}", item.summary)?;
    if let Some(fix) = &item.suggested_fix {
        for line in fix.lines() {
            writeln!(output, "  | {}", line)?;
        }
    }

    loop {
        write!(output, "[a]ccept / [s]kip / [q]uit: ")?;
        output.flush()?;
        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(Decision::Quit);
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "a" | "accept" | "y" => return Ok(Decision::Accept),
            "s" | "skip" | "n" => return Ok(Decision::Skip),
            "q" | "quit" => return Ok(Decision::Quit),
            other => debug!(answer = other, "unrecognised answer"),
        }
    }
}
