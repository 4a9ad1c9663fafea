// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Analysis pipeline
//!
//! Reads one `go test -json` log, classifies it, correlates the failures with
//! tracked issues and renders the result for stdout.
//!
//! # Example
//!
//! ```no_run
//! use bfreport::analyze::{analyze, load_tracked};
//! use bfreport::config::Config;
//!
//! let config = Config::default();
//! let tracked = load_tracked(config.tracked_path().as_deref()).expect("load tracked");
//! let log = std::fs::File::open("test.json").expect("open log");
//! let output = analyze(std::io::BufReader::new(log), &config, &tracked).expect("analyze");
//! println!("{} new failures", output.new_failures().count());
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use bfreport_dedup::{
    Correlation, DedupError, TicketDraft, TrackedIssues, correlate_report, draft_ticket,
};
use bfreport_gotest::{ClassifyError, FailureReport, FqTest, SequenceViolation, classify_reader};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Command, Config, is_stdin};

// ============================================================================
// Error Types
// ============================================================================

/// Analysis errors
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The log could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Path of the log
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The log could not be classified
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// The tracked issue file could not be read
    #[error("Failed to read tracked issues from {path}: {source}")]
    TrackedRead {
        /// Path of the tracked issue file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The tracked issue file is malformed
    #[error("Invalid tracked issues in {path}: {source}")]
    TrackedParse {
        /// Path of the tracked issue file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: DedupError,
    },

    /// Writing the result failed
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Output Types
// ============================================================================

/// Everything `bfreport analyze` prints
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    /// Whether the run had no failures at all
    pub success: bool,
    /// The classified failures
    pub report: FailureReport,
    /// Malformed assertion sequences that were recorded and skipped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<SequenceViolation>,
    /// Tracked/new decision per classified failing test
    pub correlations: Vec<Correlation>,
    /// Failing tests with no classified failure
    pub unclassified: Vec<FqTest>,
    /// Ticket drafts for new failures, when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<TicketDraft>,
}

impl AnalysisOutput {
    /// Correlations that no tracked issue covers
    pub fn new_failures(&self) -> impl Iterator<Item = &Correlation> {
        self.correlations.iter().filter(|c| c.decision.is_new())
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Open a log path, treating `-` as stdin
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>, AnalyzeError> {
    if is_stdin(path) {
        debug!("Reading log from stdin");
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).map_err(|source| AnalyzeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Load tracked issues, or an empty index when there is no file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_tracked(path: Option<&Path>) -> Result<TrackedIssues, AnalyzeError> {
    let Some(path) = path else {
        debug!("No tracked issue file, every failure is new");
        return Ok(TrackedIssues::new());
    };

    let json = std::fs::read_to_string(path).map_err(|source| AnalyzeError::TrackedRead {
        path: path.to_path_buf(),
        source,
    })?;
    let tracked = TrackedIssues::from_json(&json).map_err(|source| AnalyzeError::TrackedParse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), issues = tracked.len(), "Loaded tracked issues");
    Ok(tracked)
}

/// Classify a log and correlate its failures with tracked issues
///
/// # Errors
///
/// Returns an error if the log is malformed, or if a malformed assertion
/// sequence is found under `--strict`.
pub fn analyze<R: BufRead>(
    reader: R,
    config: &Config,
    tracked: &TrackedIssues,
) -> Result<AnalysisOutput, AnalyzeError> {
    let run = classify_reader(reader, config.classifier_config())?;
    for violation in &run.violations {
        warn!(test = %violation.test(), "{violation}");
    }

    let mut correlations = Vec::new();
    let mut unclassified = Vec::new();
    for result in correlate_report(&run.report, tracked) {
        match result {
            Ok(correlation) => correlations.push(correlation),
            Err(DedupError::UnknownClassification { test }) => {
                debug!(test = %test, "Failing test has no classified failure");
                unclassified.push(test);
            }
            Err(e) => warn!(error = %e, "Skipping failure"),
        }
    }

    let tickets = if config.tickets {
        let options = config.ticket_options();
        correlations
            .iter()
            .filter(|c| c.decision.is_new())
            .filter_map(|c| draft_ticket(&run.report, &c.test, &options))
            .collect()
    } else {
        Vec::new()
    };

    let new = correlations.iter().filter(|c| c.decision.is_new()).count();
    info!(
        classified = correlations.len(),
        new,
        tracked = correlations.len() - new,
        unclassified = unclassified.len(),
        tickets = tickets.len(),
        "Correlated failures"
    );

    Ok(AnalysisOutput {
        success: run.report.is_success(),
        report: run.report,
        violations: run.violations,
        correlations,
        unclassified,
        tickets,
    })
}

/// Summary line for every classified failing test, in failing-list order
///
/// # Errors
///
/// Returns an error if the log cannot be classified.
pub fn summaries<R: BufRead>(reader: R, config: &Config) -> Result<Vec<String>, AnalyzeError> {
    let run = classify_reader(reader, config.classifier_config())?;
    let lines = correlate_report(&run.report, &TrackedIssues::new())
        .into_iter()
        .filter_map(|result| match result {
            Ok(correlation) => Some(correlation.summary),
            Err(e) => {
                warn!(error = %e, "No summary");
                None
            }
        })
        .collect();
    Ok(lines)
}

/// Run the configured subcommand, writing its result to `out`
///
/// Returns `Ok(false)` when no subcommand was given.
///
/// # Errors
///
/// Returns an error if the input or tracked issues cannot be read, the log
/// cannot be classified, or the output cannot be written.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<bool, AnalyzeError> {
    let Some(ref command) = config.command else {
        return Ok(false);
    };

    let reader = open_input(command.input())?;
    match command {
        Command::Analyze { .. } => {
            let tracked = load_tracked(config.tracked_path().as_deref())?;
            let output = analyze(reader, config, &tracked)?;
            serde_json::to_writer_pretty(&mut *out, &output)?;
            writeln!(out)?;
        }
        Command::Summaries { .. } => {
            for line in summaries(reader, config)? {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(true)
}
