// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Ticket drafts for failing tests
//!
//! Drafting is pure. Filing the drafts with an issue tracker is left to the
//! caller.

use bfreport_gotest::{AssertionFailure, FailureReport, FqTest};
use serde::Serialize;
use tracing::debug;

use crate::fingerprint::{FailureKind, classify_failure};

/// Default byte budget for logs embedded in a ticket description
pub const DEFAULT_MAX_LOG_BYTES: usize = 30_000;

/// Label attached to every drafted ticket
pub const FLAKY_TEST_LABEL: &str = "flaky_test";

const TRUNCATION_HEADER: &str = "Test logs truncated for jira filing purposes:";

/// Join log lines with newlines, keeping only the leading lines that fit
///
/// Each line costs its length plus one byte for the separator. When lines
/// are dropped the result starts with a truncation header line.
#[must_use]
pub fn truncate_logs(logs: &[String], max_bytes: usize) -> String {
    let mut total = 0;
    for (idx, line) in logs.iter().enumerate() {
        if total + line.len() + 1 > max_bytes {
            return format!("{TRUNCATION_HEADER}\n{}", logs[..idx].join("\n"));
        }
        total += line.len() + 1;
    }
    logs.join("\n")
}

/// Where the tested Go module's source is hosted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeHost {
    /// Go module path, e.g. `go.viam.com/rdk`
    pub module_prefix: String,
    /// Repository web URL, e.g. `https://github.com/viamrobotics/rdk`
    pub repo_url: String,
    /// Commit the run tested
    pub git_hash: String,
}

impl CodeHost {
    /// Create a code host description
    pub fn new(
        module_prefix: impl Into<String>,
        repo_url: impl Into<String>,
        git_hash: impl Into<String>,
    ) -> Self {
        Self {
            module_prefix: module_prefix.into(),
            repo_url: repo_url.into(),
            git_hash: git_hash.into(),
        }
    }

    /// Link to the source line of an assertion
    ///
    /// Returns `None` when the assertion's package is outside the module.
    #[must_use]
    pub fn link_for(&self, assertion: &AssertionFailure) -> Option<String> {
        let prefix = self.module_prefix.trim_end_matches('/');
        let package = assertion.package.strip_prefix(prefix)?.strip_prefix('/')?;
        Some(format!(
            "{}/blob/{}/{}/{}#L{}",
            self.repo_url.trim_end_matches('/'),
            self.git_hash,
            package,
            assertion.file,
            assertion.line
        ))
    }
}

/// Inputs for [`draft_tickets`] that do not come from the report
#[derive(Debug, Clone)]
pub struct TicketOptions {
    /// Link to the CI run the report was built from
    pub run_link: String,
    /// Source host for assertion code links
    pub code_host: Option<CodeHost>,
    /// Byte budget for the logs in a description
    pub max_log_bytes: usize,
}

impl Default for TicketOptions {
    fn default() -> Self {
        Self {
            run_link: String::new(),
            code_host: None,
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
        }
    }
}

/// A ticket ready to be filed for one failing test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDraft {
    /// The failing test
    pub test: FqTest,
    /// Fingerprint summary line
    pub summary: String,
    /// Tracker markup body with run link, headline and truncated logs
    pub description: String,
    /// Tracker labels
    pub labels: Vec<String>,
    /// Full untruncated logs, for attaching separately
    pub logs: Vec<String>,
}

/// Draft a ticket for every failing test that has something to show
///
/// Tests with no logs are skipped. A test whose only record is its package's
/// race uses the race report as its logs.
#[must_use]
pub fn draft_tickets(report: &FailureReport, options: &TicketOptions) -> Vec<TicketDraft> {
    report
        .test_failures
        .iter()
        .filter_map(|test| draft_ticket(report, test, options))
        .collect()
}

/// Draft a ticket for one failing test
///
/// Returns `None` for unclassified tests and tests without logs.
#[must_use]
pub fn draft_ticket(report: &FailureReport, test: &FqTest, options: &TicketOptions) -> Option<TicketDraft> {
    let kind = match classify_failure(report, test) {
        Ok(kind) => kind,
        Err(e) => {
            debug!(test = %test, error = %e, "Skipping ticket draft");
            return None;
        }
    };

    let logs = match (report.logs_for(test), report.datarace_for(test)) {
        ([], Some(race)) => race.log_lines.clone(),
        (logs, _) => logs.to_vec(),
    };
    if logs.is_empty() {
        debug!(test = %test, "No logs, skipping ticket draft");
        return None;
    }

    let (headline, code_link) = match kind {
        FailureKind::Assertion => {
            let first = report.assertions_for(test).first()?;
            let link = options
                .code_host
                .as_ref()
                .and_then(|host| host.link_for(first))
                .map(|url| format!("[ (Code Link)|{url}]"))
                .unwrap_or_default();
            (first.pretty(""), link)
        }
        FailureKind::Timeout => (first_line(report.timeout_for(test).map(|t| &t.log_lines)), String::new()),
        FailureKind::Datarace => (first_line(report.datarace_for(test).map(|r| &r.log_lines)), String::new()),
    };

    let description = format!(
        "[Github Run|{}]\n\nAssertion{}:\n\n{{noformat}}\n{}\n{{noformat}}\n\nLogs:\n\n{{noformat}}\n{}\n{{noformat}}\n\n",
        options.run_link,
        code_link,
        headline,
        truncate_logs(&logs, options.max_log_bytes)
    );

    Some(TicketDraft {
        test: test.clone(),
        summary: format!("{kind}: {test}"),
        description,
        labels: vec![FLAKY_TEST_LABEL.to_string()],
        logs,
    })
}

fn first_line(lines: Option<&Vec<String>>) -> String {
    lines.and_then(|l| l.first()).cloned().unwrap_or_default()
}
