mod artifacts;
mod config;
mod feedback;
mod mapping;
mod pr;
mod report;
mod triage;

use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use crate::artifacts::{COMMENTS_FILE, DIFF_FILE, FEEDBACK_FILE, MAPPINGS_FILE, PR_DATA_FILE};
use crate::feedback::direct::DirectParser;
use crate::feedback::{Categorizer, FeedbackReport};
use crate::mapping::{FileLines, LineMapping, MappingReport, NoWorkingCopy, WorkingCopy};
use crate::pr::diff::parse_diff;
use crate::pr::{GitHubClient, PrContext, PrRef, ReviewComment};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// PR Feedback: fetch a pull request's review comments, map each one onto the
/// current code, and sort them into categories for working through.
#[derive(Parser, Debug)]
#[command(name = "pr-feedback", version, about)]
struct Cli {
    /// Config file (default: .pr-feedback.toml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch PR metadata, review comments and the unified diff
    Fetch {
        #[command(flatten)]
        pr: PrArgs,
        /// Directory for pr_data.json, comments.json and diff.patch
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Map review comments onto the current version of each file
    Map {
        diff: PathBuf,
        comments: PathBuf,
        /// Commit the diff ends at (head_sha in pr_data.json). Comments made
        /// on it keep their line numbers.
        #[arg(long)]
        head: Option<String>,
        /// Working copy used to bounds-check mapped lines
        #[arg(long)]
        root: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Categorize mapped review comments
    Categorize {
        comments: PathBuf,
        mappings: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a markdown report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Fetch, map and categorize in one go
    Run {
        #[command(flatten)]
        pr: PrArgs,
        /// Directory for all artifacts
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Working copy used to bounds-check mapped lines
        #[arg(long)]
        root: Option<PathBuf>,
        /// Write a markdown report to this path instead of the terminal
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Parse feedback given outside a PR, e.g. `@src/db.py:45 "Line 12: ..."`
    Direct {
        /// `@path`, `@path:line`, `@path:function` or `@path:Type.method`
        reference: String,
        text: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Step through categorized feedback, accepting or skipping each item
    Triage {
        feedback: PathBuf,
        /// Accept every item without prompting
        #[arg(long)]
        accept_all: bool,
        /// Output file for the decisions (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PrArgs {
    /// Pull request URL (https://github.com/org/repo/pull/42) or org/repo#42
    #[arg(required_unless_present_all = ["owner", "repo", "number"])]
    pr: Option<String>,
    #[arg(long, requires_all = ["repo", "number"])]
    owner: Option<String>,
    #[arg(long)]
    repo: Option<String>,
    #[arg(long)]
    number: Option<u64>,
}

impl PrArgs {
    fn resolve(&self) -> Result<PrRef, pr::PrError> {
        match (&self.pr, &self.owner, &self.repo, self.number) {
            (Some(reference), _, _, _) => pr::parse_pr_ref(reference),
            (None, Some(owner), Some(repo), Some(pr_number)) => Ok(PrRef {
                owner: owner.clone(),
                repo: repo.clone(),
                pr_number,
            }),
            _ => Err(pr::PrError::InvalidUrl(
                "give a PR URL, org/repo#N, or --owner/--repo/--number".to_string(),
            )),
        }
    }

    fn resolve_in(&self, stage: &str) -> Result<PrRef, String> {
        self.resolve().map_err(|e| format!("{stage}: {e}"))
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    debug!("loading configuration");
    let config = config::Config::load(cli.config.as_deref()).map_err(|e| format!("config: {e}"))?;

    match cli.command {
        Command::Fetch { pr, output } => {
            let pr = pr.resolve_in("fetch")?;
            let _span = info_span!("fetch", pr = %pr).entered();
            let context = fetch(&config, &pr).await?;
            write_fetch_artifacts(&output, &context).map_err(|e| format!("fetch: {e}"))?;
            info!(dir = %output.display(), "wrote fetch artifacts");
        }
        Command::Map {
            diff,
            comments,
            head,
            root,
            output,
        } => {
            let diff_text = artifacts::read_text(&diff).map_err(|e| format!("map: {e}"))?;
            let comments: Vec<ReviewComment> = artifacts::read_json(&comments).map_err(|e| format!("map: {e}"))?;
            let report = map_stage(&diff_text, &comments, head.as_deref(), root.as_deref());
            artifacts::emit_json(output.as_deref(), &report).map_err(|e| format!("map: {e}"))?;
        }
        Command::Categorize {
            comments,
            mappings,
            output,
            report,
        } => {
            let comments: Vec<ReviewComment> =
                artifacts::read_json(&comments).map_err(|e| format!("categorize: {e}"))?;
            let mappings: MappingReport = artifacts::read_json(&mappings).map_err(|e| format!("categorize: {e}"))?;
            let feedback = categorize_stage(&config, &comments, &mappings.mappings)?;
            artifacts::emit_json(output.as_deref(), &feedback).map_err(|e| format!("categorize: {e}"))?;
            if let Some(path) = report {
                report::output(&report::build(&feedback, None), Some(&path))?;
            }
        }
        Command::Run {
            pr,
            output,
            root,
            report,
        } => {
            let pr = pr.resolve_in("run")?;
            let _span = info_span!("run", pr = %pr).entered();
            let context = fetch(&config, &pr).await?;
            write_fetch_artifacts(&output, &context).map_err(|e| format!("fetch: {e}"))?;

            let mappings = map_stage(
                &context.diff,
                &context.comments,
                Some(context.pull_request.head_sha.as_str()),
                root.as_deref(),
            );
            artifacts::write_json(&output.join(MAPPINGS_FILE), &mappings).map_err(|e| format!("map: {e}"))?;

            let feedback = categorize_stage(&config, &context.comments, &mappings.mappings)?;
            artifacts::write_json(&output.join(FEEDBACK_FILE), &feedback)
                .map_err(|e| format!("categorize: {e}"))?;

            let built = report::build(&feedback, Some(&context.pull_request));
            report::output(&built, report.as_deref())?;
            info!(
                items = feedback.total_items,
                mapped = mappings.mapped_comments,
                "done"
            );
        }
        Command::Direct {
            reference,
            text,
            output,
        } => {
            let categorizer = Categorizer::from_config(&config.feedback).map_err(|e| format!("direct: {e}"))?;
            let parser = DirectParser::new().map_err(|e| format!("direct: {e}"))?;
            let parsed = parser.parse(&reference, &text, &categorizer);
            info!(items = parsed.total_items, "parsed direct feedback");
            artifacts::emit_json(output.as_deref(), &parsed).map_err(|e| format!("direct: {e}"))?;
        }
        Command::Triage {
            feedback,
            accept_all,
            output,
        } => {
            let feedback: FeedbackReport = artifacts::read_json(&feedback).map_err(|e| format!("triage: {e}"))?;
            let items: Vec<_> = feedback.items.into_iter().filter(|item| item.actionable).collect();
            let result = if accept_all {
                triage::triage(items, |_| Ok(triage::Decision::Accept))
            } else {
                let mut input = io::stdin().lock();
                let mut prompt = io::stderr();
                triage::triage(items, |item| triage::prompt_decision(item, &mut input, &mut prompt))
            };
            let outcome = result.map_err(|e| format!("triage: {e}"))?;
            artifacts::emit_json(output.as_deref(), &outcome).map_err(|e| format!("triage: {e}"))?;
        }
    }

    Ok(())
}

/// Fetch the PR context, aborting cleanly on Ctrl-C.
async fn fetch(config: &config::Config, pr: &PrRef) -> CliResult<PrContext> {
    let client = GitHubClient::from_config(config, pr).map_err(|e| format!("fetch: {e}"))?;
    let cancel = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let context = pr::fetch_pr_context(&client, pr, cancel)
        .await
        .map_err(|e| format!("fetch: {e}"))?;
    Ok(context)
}

fn write_fetch_artifacts(dir: &Path, context: &PrContext) -> Result<(), artifacts::ArtifactError> {
    artifacts::ensure_dir(dir)?;
    artifacts::write_json(&dir.join(PR_DATA_FILE), &context.pull_request)?;
    artifacts::write_json(&dir.join(COMMENTS_FILE), &context.comments)?;
    artifacts::write_text(&dir.join(DIFF_FILE), &context.diff)
}

fn map_stage(diff_text: &str, comments: &[ReviewComment], head: Option<&str>, root: Option<&Path>) -> MappingReport {
    let diff = parse_diff(diff_text);
    info!(
        files = diff.files.len(),
        hunks = diff.hunk_count(),
        malformed = diff.failures.len(),
        "parsed diff"
    );
    for file in &diff.files {
        debug!(
            path = %file.path,
            additions = file.additions(),
            deletions = file.deletions(),
            "diff section"
        );
    }
    let files: Box<dyn FileLines> = match root {
        Some(root) => Box::new(WorkingCopy::new(root)),
        None => Box::new(NoWorkingCopy),
    };
    let mappings = mapping::map_comments(&diff, comments, head, files.as_ref());
    MappingReport::new(mappings, &diff)
}

fn categorize_stage(
    config: &config::Config,
    comments: &[ReviewComment],
    mappings: &[LineMapping],
) -> CliResult<FeedbackReport> {
    let categorizer = Categorizer::from_config(&config.feedback).map_err(|e| format!("categorize: {e}"))?;
    let items = categorizer.categorize_all(comments, mappings);
    Ok(FeedbackReport::new(items))
}
