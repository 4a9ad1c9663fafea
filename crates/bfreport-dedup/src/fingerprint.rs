// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Failure fingerprints
//!
//! A fingerprint is the human-readable summary line a tracked issue is filed
//! under, e.g. `Test Failure: go.viam.com/rdk/components/arm.TestArm`. Exact
//! string equality between fingerprints is the only dedup key, so the format
//! here must stay stable.

use std::fmt;

use bfreport_gotest::{FailureReport, FqTest};
use serde::Serialize;

use crate::error::{DedupError, Result};

/// Which kind of classified failure a fingerprint describes
///
/// Variants are listed in priority order: a test with both an assertion and
/// a timeout is fingerprinted as an assertion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// At least one Expected/Actual assertion failed
    Assertion,
    /// The test hit the `go test` deadline
    Timeout,
    /// The race detector fired in the test's package
    Datarace,
}

impl FailureKind {
    /// Summary prefix for this kind
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Assertion => "Test Failure",
            Self::Timeout => "Test Timeout",
            Self::Datarace => "Test Datarace",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the highest-priority failure kind recorded for a test
///
/// # Errors
///
/// Returns [`DedupError::UnknownClassification`] if the report holds no
/// assertion, timeout, or package race record for the test.
pub fn classify_failure(report: &FailureReport, test: &FqTest) -> Result<FailureKind> {
    if !report.assertions_for(test).is_empty() {
        Ok(FailureKind::Assertion)
    } else if report.timeout_for(test).is_some() {
        Ok(FailureKind::Timeout)
    } else if report.datarace_for(test).is_some() {
        Ok(FailureKind::Datarace)
    } else {
        Err(DedupError::UnknownClassification { test: test.clone() })
    }
}

/// Build the summary line a test's failure is tracked under
///
/// # Errors
///
/// Returns [`DedupError::UnknownClassification`] for unclassified failures.
pub fn summary_for_failure(report: &FailureReport, test: &FqTest) -> Result<String> {
    let kind = classify_failure(report, test)?;
    Ok(format!("{kind}: {test}"))
}
