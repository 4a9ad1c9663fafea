//! Correlation of failure fingerprints against tracked issues
//!
//! Correlation is pure: callers load the tracked issues from wherever they
//! keep them and get one [`Decision`] per failing test back.

use std::collections::HashMap;

use bfreport_gotest::{FailureReport, FqTest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::fingerprint::summary_for_failure;

/// An issue already filed in the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIssue {
    /// Tracker identifier, e.g. `RSDK-4711`
    pub key: String,
    /// Summary line the issue was filed under
    pub summary: String,
}

impl TrackedIssue {
    /// Create a tracked issue
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
        }
    }
}

/// Tracked issues indexed by summary
///
/// When several issues share a summary, the first one supplied wins.
#[derive(Debug, Clone, Default)]
pub struct TrackedIssues {
    issues: Vec<TrackedIssue>,
    by_summary: HashMap<String, usize>,
}

impl TrackedIssues {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of `{"key": ..., "summary": ...}` objects
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not such an array.
    pub fn from_json(json: &str) -> Result<Self> {
        let issues: Vec<TrackedIssue> = serde_json::from_str(json)?;
        Ok(issues.into_iter().collect())
    }

    /// Add an issue unless its summary is already tracked
    ///
    /// Returns `false` when an earlier issue already owns the summary.
    pub fn insert(&mut self, issue: TrackedIssue) -> bool {
        if self.by_summary.contains_key(&issue.summary) {
            debug!(key = %issue.key, summary = %issue.summary, "Ignoring duplicate tracked summary");
            return false;
        }
        self.by_summary.insert(issue.summary.clone(), self.issues.len());
        self.issues.push(issue);
        true
    }

    /// Find the issue tracking an exact summary
    #[must_use]
    pub fn lookup(&self, summary: &str) -> Option<&TrackedIssue> {
        self.by_summary.get(summary).map(|&idx| &self.issues[idx])
    }

    /// Number of distinct tracked summaries
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Check if nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Iterate over tracked issues in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TrackedIssue> {
        self.issues.iter()
    }
}

impl FromIterator<TrackedIssue> for TrackedIssues {
    fn from_iter<I: IntoIterator<Item = TrackedIssue>>(iter: I) -> Self {
        let mut index = Self::new();
        for issue in iter {
            index.insert(issue);
        }
        index
    }
}

/// Whether a failure is already tracked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    /// An existing issue carries the same summary
    Tracked {
        /// The matching issue
        issue: TrackedIssue,
    },
    /// No tracked issue matches; a new one would be filed
    New,
}

impl Decision {
    /// Check if the failure needs a new issue
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

/// Decision for one failing test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correlation {
    /// The failing test
    pub test: FqTest,
    /// Its fingerprint
    pub summary: String,
    /// Whether it is already tracked
    pub decision: Decision,
}

/// Decide whether a summary is tracked
#[must_use]
pub fn correlate_summary(summary: &str, tracked: &TrackedIssues) -> Decision {
    match tracked.lookup(summary) {
        Some(issue) => Decision::Tracked {
            issue: issue.clone(),
        },
        None => Decision::New,
    }
}

/// Fingerprint and correlate every failing test in a report
///
/// Results are in the report's failing-test order. Unclassified failures
/// yield an [`UnknownClassification`](crate::DedupError::UnknownClassification)
/// entry rather than aborting the rest.
#[must_use]
pub fn correlate_report(report: &FailureReport, tracked: &TrackedIssues) -> Vec<Result<Correlation>> {
    report
        .test_failures
        .iter()
        .map(|test| {
            let summary = summary_for_failure(report, test)?;
            let decision = correlate_summary(&summary, tracked);
            if let Decision::Tracked { issue } = &decision {
                debug!(test = %test, key = %issue.key, "Dedup match");
            }
            Ok(Correlation {
                test: test.clone(),
                summary,
                decision,
            })
        })
        .collect()
}
