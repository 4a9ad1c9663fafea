//! Failure report types

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::FqTest;

/// A failed `Expected`/`Actual` assertion reported by a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionFailure {
    /// Go package containing the test
    pub package: String,
    /// Source file of the assertion, e.g. `arm_test.go`
    pub file: String,
    /// Source line of the assertion
    pub line: u32,
    /// Text following `Expected`
    pub expected: String,
    /// Text following `Actual:`, empty when the log never printed one
    pub actual: String,
}

impl AssertionFailure {
    /// Check if the assertion was completed by an Actual-line
    #[must_use]
    pub fn has_actual(&self) -> bool {
        !self.actual.is_empty()
    }

    /// Render as an indented `File:`/`Expected:`/`Actual:` block
    ///
    /// The `Actual:` line is omitted when no actual text was captured.
    #[must_use]
    pub fn pretty(&self, indent: &str) -> String {
        let mut out = format!(
            "{indent}File:     {}/{}:{}\n{indent}Expected: {}\n",
            self.package, self.file, self.line, self.expected
        );
        if self.has_actual() {
            out.push_str(&format!("{indent}Actual:   {}", self.actual));
        }
        out
    }
}

/// A test that hit the `go test -timeout` deadline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TimeoutFailure {
    /// The `panic: test timed out` line followed by every later line of the test
    pub log_lines: Vec<String>,
}

/// One or more race detector reports for a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataraceFailure {
    /// Package the race detector ran in
    pub package: String,
    /// Every race report for the package, concatenated
    pub log_lines: Vec<String>,
}

/// A `fail` event with no test name, e.g. a build or setup failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageFailure {
    /// Package that failed
    pub package: String,
    /// Seconds the package ran for
    pub elapsed: f64,
    /// When the failure was reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl fmt::Display for PackageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}s)", self.package, self.elapsed)
    }
}

/// Classified failures from one `go test -json` log
///
/// Built by [`Classifier`](crate::Classifier); immutable once
/// [`Classifier::finalize`](crate::Classifier::finalize) returns it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FailureReport {
    /// Assertion failures per test, in log order
    pub assertions: BTreeMap<FqTest, Vec<AssertionFailure>>,
    /// At most one timeout per test
    pub timeouts: BTreeMap<FqTest, TimeoutFailure>,
    /// At most one race record per package, keyed by the package-level identity
    pub dataraces: BTreeMap<FqTest, DataraceFailure>,
    /// Raw output of every test with a classified failure
    pub logs: BTreeMap<FqTest, Vec<String>>,
    /// `fail` events without a test name, in log order
    pub package_failures: Vec<PackageFailure>,
    /// Every failing test, deduplicated and sorted
    pub test_failures: Vec<FqTest>,
}

impl FailureReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.assertions.is_empty()
            && self.dataraces.is_empty()
            && self.timeouts.is_empty()
            && self.package_failures.is_empty()
            && self.test_failures.is_empty()
    }

    /// Assertion failures recorded for a test
    #[must_use]
    pub fn assertions_for(&self, test: &FqTest) -> &[AssertionFailure] {
        self.assertions.get(test).map(Vec::as_slice).unwrap_or_default()
    }

    /// Timeout recorded for a test
    #[must_use]
    pub fn timeout_for(&self, test: &FqTest) -> Option<&TimeoutFailure> {
        self.timeouts.get(test)
    }

    /// Race record for the package a test belongs to
    #[must_use]
    pub fn datarace_for(&self, test: &FqTest) -> Option<&DataraceFailure> {
        self.dataraces.get(&test.to_package_level())
    }

    /// Raw log lines attached to a test
    #[must_use]
    pub fn logs_for(&self, test: &FqTest) -> &[String] {
        self.logs.get(test).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check if the test has an assertion, timeout, or package race record
    #[must_use]
    pub fn is_classified(&self, test: &FqTest) -> bool {
        !self.assertions_for(test).is_empty()
            || self.timeouts.contains_key(test)
            || self.datarace_for(test).is_some()
    }

    /// Failing tests that never matched a classification rule
    #[must_use]
    pub fn unclassified_failures(&self) -> Vec<&FqTest> {
        self.test_failures
            .iter()
            .filter(|test| !self.is_classified(test))
            .collect()
    }
}

/// Deduplicate failing tests (first occurrence wins) and sort them
#[must_use]
pub fn sort_dedup_failures(failures: Vec<FqTest>) -> Vec<FqTest> {
    let mut seen = HashSet::with_capacity(failures.len());
    let mut unique: Vec<FqTest> = failures
        .into_iter()
        .filter(|test| seen.insert(test.clone()))
        .collect();
    unique.sort();
    unique
}
