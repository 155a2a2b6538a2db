pub mod types;

pub use types::{CategorySection, PrSummary, Report};

use crate::feedback::{Category, FeedbackItem, FeedbackReport};
use crate::mapping::{Confidence, LineMapping};
use crate::pr::PullRequest;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Group categorized feedback for display.
pub fn build(feedback: &FeedbackReport, pr: Option<&PullRequest>) -> Report {
    let sections = Category::ALL
        .into_iter()
        .filter_map(|category| {
            let items: Vec<FeedbackItem> = feedback
                .items
                .iter()
                .filter(|item| item.category == category)
                .cloned()
                .collect();
            (!items.is_empty()).then_some(CategorySection { category, items })
        })
        .collect();

    Report {
        pr: pr.map(PrSummary::from),
        total_items: feedback.total_items,
        actionable_items: feedback.actionable_items,
        unresolved_items: feedback
            .items
            .iter()
            .filter(|item| !item.mapping.is_resolved())
            .count(),
        sections,
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(items = report.total_items))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

/// PR #42: "Add OAuth2 login flow"
/// Author: alice | Files changed: 7 | +320 -45
///
/// ═══ security (1) ═══
///   • app/db.py:16 [shifted] Use a parameterized query.
///
/// ═══ 3 items | 2 actionable | 1 unresolved ═══
fn print_terminal_report(report: &Report) {
    println!();
    if let Some(pr) = &report.pr {
        println!("PR #{}: \"{}\"", pr.number, pr.title);
        println!(
            "Author: {} | Files changed: {} | +{} -{}",
            pr.author, pr.changed_files, pr.additions, pr.deletions
        );
        println!();
    }

    if report.sections.is_empty() {
        println!("  No review comments.");
        println!();
    }

    for section in &report.sections {
        println!("═══ {} ({}) ═══", section.category, section.items.len());
        for item in &section.items {
            let marker = if item.actionable { "•" } else { "?" };
            println!(
                "  {} {} [{}] {}",
                marker,
                location(&item.mapping),
                colorize_confidence(item.mapping.confidence),
                item.summary
            );
            if let Some(reason) = &item.mapping.reason {
                println!("      {}", reason.dimmed());
            }
        }
        println!();
    }

    println!(
        "═══ {} items | {} actionable | {} ═══",
        report.total_items,
        report.actionable_items,
        colorize_unresolved(report.unresolved_items)
    );
    println!();
}

fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    match &report.pr {
        Some(pr) => {
            md.push_str(&format!("# PR #{}: \"{}\"\n\n", pr.number, pr.title));
            md.push_str(&format!(
                "**Author:** {} | **Files changed:** {} | **+{} -{}**\n\n",
                pr.author, pr.changed_files, pr.additions, pr.deletions
            ));
        }
        None => md.push_str("# Review feedback\n\n"),
    }

    for section in &report.sections {
        md.push_str(&format!("## {} ({})\n\n", section.category, section.items.len()));
        for item in &section.items {
            let check = if item.actionable { "[ ]" } else { "[?]" };
            md.push_str(&format!(
                "- {} `{}` **{}** {}\n",
                check,
                location(&item.mapping),
                item.mapping.confidence,
                item.summary
            ));
            if let Some(fix) = &item.suggested_fix {
                md.push_str("\n  ```\n");
                for line in fix.lines() {
                    md.push_str(&format!("  {}\n", line));
                }
                md.push_str("  ```\n\n");
            }
        }
        md.push('\n');
    }

    md.push_str(&format!(
        "**Total:** {} | **Actionable:** {} | **Unresolved:** {}\n",
        report.total_items, report.actionable_items, report.unresolved_items
    ));

    std::fs::write(path, md)?;
    Ok(())
}

fn location(mapping: &LineMapping) -> String {
    match (&mapping.resolved_file_path, mapping.resolved_line) {
        (Some(f), Some(l)) => format!("{}:{}", f, l),
        (Some(f), None) => f.clone(),
        (None, _) => format!("{} (deleted)", mapping.comment_path),
    }
}

fn colorize_confidence(confidence: Confidence) -> colored::ColoredString {
    match confidence {
        Confidence::Exact => "exact".green(),
        Confidence::Shifted => "shifted".yellow(),
        Confidence::Unresolved => "unresolved".red().bold(),
    }
}

fn colorize_unresolved(count: usize) -> colored::ColoredString {
    let text = format!("{} unresolved", count);
    if count == 0 {
        text.green()
    } else {
        text.red().bold()
    }
}
