// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Streaming failure classification
//!
//! [`Classifier`] consumes [`LogEvent`]s one at a time and reassembles the
//! multi-line failure reports Go tests print:
//!
//! ```text
//!     arm_test.go:10: Expected: true
//!         Actual:   false
//! panic: test timed out after 10m0s
//! WARNING: DATA RACE
//! ```
//!
//! # Example
//!
//! ```
//! use bfreport_gotest::{Classifier, ClassifierConfig, EventReader};
//!
//! let log = r#"{"Action":"output","Package":"pkg","Test":"TestArm","Output":"arm_test.go:10: Expected: true\n"}
//! {"Action":"output","Package":"pkg","Test":"TestArm","Output":"        Actual:   false\n"}
//! {"Action":"fail","Package":"pkg","Test":"TestArm","Elapsed":0.1}"#;
//!
//! let mut classifier = Classifier::new(ClassifierConfig::default());
//! classifier.feed(EventReader::from_text(log)).unwrap();
//! let run = classifier.finalize();
//! assert_eq!(run.report.test_failures.len(), 1);
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ClassifyError, DecodeError, SequenceViolation};
use crate::event::{Action, EventReader, FqTest, LogEvent};
use crate::report::{
    AssertionFailure, DataraceFailure, FailureReport, PackageFailure, TimeoutFailure,
    sort_dedup_failures,
};

// ============================================================================
// Line Patterns
// ============================================================================

// E.g: "    ur5e_test.go:384: Expected: nil"
// E.g: "    gpiostepper_test.go:391: Expected '0' to be between '1' and '20000' or equal to one of them (but it wasn't)!"
static EXPECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:space:]]*([[:word:]]+\.go):([0-9]+): Expected:? (.+)$").expect("valid regex")
});

// E.g: "        Actual:   'timeout'"
static ACTUAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*Actual:(.+)$").expect("valid regex"));

// E.g: "panic: test timed out after 10m0s"
static TIMEOUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^panic: test timed out after (.*)$").expect("valid regex"));

const DATARACE_MARKER: &str = "WARNING: DATA RACE";

struct ExpectedLine<'a> {
    file: &'a str,
    line: u32,
    expected: &'a str,
}

fn match_expected(output: &str) -> Option<ExpectedLine<'_>> {
    let caps = EXPECTED_RE.captures(output)?;
    Some(ExpectedLine {
        file: caps.get(1)?.as_str(),
        // Line numbers that overflow u32 are not real source locations
        line: caps.get(2)?.as_str().parse().ok()?,
        expected: caps.get(3)?.as_str(),
    })
}

fn match_actual(output: &str) -> Option<&str> {
    ACTUAL_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ============================================================================
// Configuration
// ============================================================================

/// What to do when a test's Expected/Actual lines are out of sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolationPolicy {
    /// Stop the run and return the violation as an error
    Abort,
    /// Log a warning, keep the violation next to the report, and continue
    #[default]
    Record,
}

/// Classifier settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Tests whose name contains any of these substrings never open assertions
    pub exclude_tests: Vec<String>,
    /// Emit a debug event for every classified line
    pub trace_lines: bool,
    /// How to handle malformed Expected/Actual sequences
    pub on_violation: ViolationPolicy,
}

impl ClassifierConfig {
    /// Exclude tests whose name contains `substring` from assertion matching
    #[must_use]
    pub fn exclude_test(mut self, substring: impl Into<String>) -> Self {
        self.exclude_tests.push(substring.into());
        self
    }

    /// Set the violation policy
    #[must_use]
    pub fn on_violation(mut self, policy: ViolationPolicy) -> Self {
        self.on_violation = policy;
        self
    }

    /// Enable per-line debug tracing
    #[must_use]
    pub fn with_line_tracing(mut self) -> Self {
        self.trace_lines = true;
        self
    }
}

/// Decides which tests are exempt from Expected/Actual assertion matching
pub trait AssertionFilter: Send + Sync {
    /// Return `true` to skip assertion matching for this event
    fn skip(&self, event: &LogEvent) -> bool;
}

impl<F> AssertionFilter for F
where
    F: Fn(&LogEvent) -> bool + Send + Sync,
{
    fn skip(&self, event: &LogEvent) -> bool {
        self(event)
    }
}

/// Skips tests whose name contains one of a set of substrings
#[derive(Debug, Clone, Default)]
pub struct TestNameFilter {
    substrings: Vec<String>,
}

impl TestNameFilter {
    /// Create a filter from name substrings
    #[must_use]
    pub fn new(substrings: Vec<String>) -> Self {
        Self { substrings }
    }
}

impl AssertionFilter for TestNameFilter {
    fn skip(&self, event: &LogEvent) -> bool {
        event.test.as_deref().is_some_and(|test| {
            self.substrings
                .iter()
                .any(|substring| test.contains(substring.as_str()))
        })
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// What the classifier did with one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Action other than `fail`/`output`
    Ignored,
    /// `fail` without a test name
    PackageFailed,
    /// `fail` for a named test
    TestFailed,
    /// Output kept only in the raw log buffer
    Unclassified,
    /// Expected-line for an excluded test
    Excluded,
    /// Expected-line opened a half-open assertion
    AssertionOpened,
    /// Actual-line completed an assertion
    AssertionCompleted,
    /// `panic: test timed out` line
    TimeoutStarted,
    /// Line appended to an open timeout
    TimeoutContinued,
    /// `WARNING: DATA RACE` line
    RaceStarted,
    /// Line appended to an open race record
    RaceContinued,
}

/// Result of a completed classification run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRun {
    /// The finalized report
    pub report: FailureReport,
    /// Malformed assertion sequences seen under [`ViolationPolicy::Record`]
    pub violations: Vec<SequenceViolation>,
    /// Number of events processed
    pub events_processed: usize,
}

/// Single-pass state machine turning log events into a [`FailureReport`]
///
/// One classifier serves exactly one run; build a fresh one per log.
pub struct Classifier {
    config: ClassifierConfig,
    filter: Box<dyn AssertionFilter>,
    report: FailureReport,
    test_logs: HashMap<FqTest, Vec<String>>,
    half_open: HashMap<FqTest, AssertionFailure>,
    violations: Vec<SequenceViolation>,
    events_processed: usize,
}

impl Classifier {
    /// Create a classifier excluding the tests named in `config.exclude_tests`
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        let filter = TestNameFilter::new(config.exclude_tests.clone());
        Self::with_filter(config, filter)
    }

    /// Create a classifier with a custom assertion filter
    ///
    /// `config.exclude_tests` is ignored in favour of `filter`.
    #[must_use]
    pub fn with_filter(config: ClassifierConfig, filter: impl AssertionFilter + 'static) -> Self {
        Self {
            config,
            filter: Box::new(filter),
            report: FailureReport::new(),
            test_logs: HashMap::new(),
            half_open: HashMap::new(),
            violations: Vec::new(),
            events_processed: 0,
        }
    }

    /// The report as built so far (not finalized)
    #[must_use]
    pub fn report(&self) -> &FailureReport {
        &self.report
    }

    /// Violations recorded so far
    #[must_use]
    pub fn violations(&self) -> &[SequenceViolation] {
        &self.violations
    }

    /// Number of events processed so far
    #[must_use]
    pub fn events_processed(&self) -> usize {
        self.events_processed
    }

    /// Classify a single event
    ///
    /// The violation policy is not applied here.
    ///
    /// # Errors
    ///
    /// Returns a [`SequenceViolation`] when an Expected-line arrives while one
    /// is pending, or an Actual-line arrives with none pending. Classifier
    /// state is left as it was before the event, except that the line is
    /// kept in the test's raw log buffer.
    pub fn process(&mut self, event: LogEvent) -> Result<Step, SequenceViolation> {
        self.events_processed += 1;

        match event.action {
            Action::Fail => Ok(self.record_fail(event)),
            Action::Output => {
                let test = event.fq_test();
                self.test_logs
                    .entry(test.clone())
                    .or_default()
                    .push(event.output.clone());

                let step = self.classify_output(&event, test)?;
                if self.config.trace_lines && step != Step::Unclassified {
                    debug!(
                        package = %event.package,
                        test = event.test.as_deref().unwrap_or(""),
                        ?step,
                        output = %event.output,
                        "Classified line"
                    );
                }
                Ok(step)
            }
            _ => Ok(Step::Ignored),
        }
    }

    /// Classify every event from an iterator, applying the violation policy
    ///
    /// Returns the number of events consumed by this call. Events committed
    /// before an error stay in the classifier, so a caller may still
    /// [`finalize`](Self::finalize) to get a partial report.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::Decode` on the first malformed record, and
    /// `ClassifyError::Sequence` on a violation under [`ViolationPolicy::Abort`].
    pub fn feed<I>(&mut self, events: I) -> Result<usize, ClassifyError>
    where
        I: IntoIterator<Item = Result<LogEvent, DecodeError>>,
    {
        let mut consumed = 0;
        for event in events {
            let event = event?;
            consumed += 1;
            if let Err(violation) = self.process(event) {
                match self.config.on_violation {
                    ViolationPolicy::Abort => return Err(violation.into()),
                    ViolationPolicy::Record => {
                        warn!(test = %violation.test(), error = %violation, "Skipping malformed assertion line");
                        self.violations.push(violation);
                    }
                }
            }
        }
        Ok(consumed)
    }

    /// Flush partial state and produce the canonical report
    ///
    /// - Expected-lines never followed by an Actual-line become assertions
    ///   with an empty actual text.
    /// - Raw logs are attached only to tests with a classified failure.
    /// - The failing-test list is deduplicated and sorted.
    #[must_use]
    pub fn finalize(mut self) -> ClassificationRun {
        let mut pending: Vec<(FqTest, AssertionFailure)> = self.half_open.drain().collect();
        pending.sort_by(|left, right| left.0.cmp(&right.0));
        for (test, failure) in pending {
            debug!(test = %test, expected = %failure.expected, "Flushing assertion with no Actual line");
            self.report.assertions.entry(test).or_default().push(failure);
        }

        let classified: Vec<FqTest> = self
            .report
            .assertions
            .keys()
            .chain(self.report.timeouts.keys())
            .chain(self.report.dataraces.keys())
            .cloned()
            .collect();
        for test in classified {
            if let Some(lines) = self.test_logs.remove(&test) {
                self.report.logs.insert(test, lines);
            }
        }

        self.report.test_failures = sort_dedup_failures(std::mem::take(&mut self.report.test_failures));

        let unclassified = self.report.unclassified_failures().len();
        if unclassified > 0 {
            debug!(count = unclassified, "Failing tests with no classified failure");
        }

        ClassificationRun {
            report: self.report,
            violations: self.violations,
            events_processed: self.events_processed,
        }
    }

    fn record_fail(&mut self, event: LogEvent) -> Step {
        if event.test.is_none() {
            self.report.package_failures.push(PackageFailure {
                package: event.package,
                elapsed: event.elapsed,
                time: event.time,
            });
            return Step::PackageFailed;
        }

        // The `fail` action is the authoritative failure signal, whether or
        // not any of the test's output is ever classified.
        self.report.test_failures.push(event.fq_test());
        Step::TestFailed
    }

    fn classify_output(&mut self, event: &LogEvent, test: FqTest) -> Result<Step, SequenceViolation> {
        let output = event.output.as_str();

        if let Some(expected) = match_expected(output) {
            if self.filter.skip(event) {
                return Ok(Step::Excluded);
            }
            if self.half_open.contains_key(&test) {
                return Err(SequenceViolation::DuplicateHalfOpenAssertion {
                    test,
                    file: expected.file.to_string(),
                    line: expected.line,
                });
            }

            self.half_open.insert(
                test,
                AssertionFailure {
                    package: event.package.clone(),
                    file: expected.file.to_string(),
                    line: expected.line,
                    expected: expected.expected.to_string(),
                    actual: String::new(),
                },
            );
            return Ok(Step::AssertionOpened);
        }

        if let Some(actual) = match_actual(output) {
            let Some(mut failure) = self.half_open.remove(&test) else {
                if self.filter.skip(event) {
                    return Ok(Step::Excluded);
                }
                return Err(SequenceViolation::UnmatchedActualLine {
                    test,
                    output: output.to_string(),
                });
            };

            failure.actual = actual.trim().to_string();
            self.report
                .assertions
                .entry(test.clone())
                .or_default()
                .push(failure);
            self.report.test_failures.push(test);
            return Ok(Step::AssertionCompleted);
        }

        if TIMEOUT_RE.is_match(output) {
            // A later panic line starts the record over.
            self.report.timeouts.insert(
                test.clone(),
                TimeoutFailure {
                    log_lines: vec![output.to_string()],
                },
            );
            self.report.test_failures.push(test);
            return Ok(Step::TimeoutStarted);
        }

        // Timeout stack traces span many lines; keep them intact.
        if let Some(timeout) = self.report.timeouts.get_mut(&test) {
            timeout.log_lines.push(output.to_string());
            return Ok(Step::TimeoutContinued);
        }

        let package = test.to_package_level();
        if output == DATARACE_MARKER {
            self.report
                .dataraces
                .entry(package)
                .or_insert_with(|| DataraceFailure {
                    package: event.package.clone(),
                    log_lines: Vec::new(),
                })
                .log_lines
                .push(output.to_string());
            self.report.test_failures.push(test);
            return Ok(Step::RaceStarted);
        }

        if let Some(race) = self.report.dataraces.get_mut(&package) {
            race.log_lines.push(output.to_string());
            return Ok(Step::RaceContinued);
        }

        Ok(Step::Unclassified)
    }
}

// ============================================================================
// Convenience Entry Points
// ============================================================================

/// Classify a complete event stream
///
/// # Errors
///
/// See [`Classifier::feed`].
pub fn classify_events<I>(events: I, config: ClassifierConfig) -> Result<ClassificationRun, ClassifyError>
where
    I: IntoIterator<Item = Result<LogEvent, DecodeError>>,
{
    let mut classifier = Classifier::new(config);
    classifier.feed(events)?;
    Ok(classifier.finalize())
}

/// Decode and classify a `go test -json` stream
///
/// # Errors
///
/// See [`Classifier::feed`].
pub fn classify_reader<R: BufRead>(
    reader: R,
    config: ClassifierConfig,
) -> Result<ClassificationRun, ClassifyError> {
    let run = classify_events(EventReader::new(reader), config)?;
    info!(
        events = run.events_processed,
        failing_tests = run.report.test_failures.len(),
        package_failures = run.report.package_failures.len(),
        violations = run.violations.len(),
        "Classified test log"
    );
    Ok(run)
}

/// Decode and classify an in-memory `go test -json` log
///
/// # Errors
///
/// See [`Classifier::feed`].
pub fn classify_str(log: &str, config: ClassifierConfig) -> Result<ClassificationRun, ClassifyError> {
    classify_reader(log.as_bytes(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const PKG: &str = "go.viam.com/rdk/components/arm";

    fn output(test: Option<&str>, text: &str) -> LogEvent {
        LogEvent {
            time: None,
            action: Action::Output,
            package: PKG.to_string(),
            test: test.map(str::to_string),
            output: text.to_string(),
            elapsed: 0.0,
        }
    }

    fn fail(test: Option<&str>) -> LogEvent {
        LogEvent {
            time: None,
            action: Action::Fail,
            package: PKG.to_string(),
            test: test.map(str::to_string),
            output: String::new(),
            elapsed: 1.5,
        }
    }

    fn run(events: Vec<LogEvent>) -> ClassificationRun {
        classify_events(events.into_iter().map(Ok), ClassifierConfig::default())
            .expect("Should classify")
    }

    fn arm() -> FqTest {
        FqTest::for_test(PKG, "TestArm")
    }

    #[test]
    fn test_expected_actual_pair() {
        let run = run(vec![
            output(Some("TestArm"), "    arm_test.go:10: Expected: true"),
            output(Some("TestArm"), "        Actual:   false"),
            fail(Some("TestArm")),
        ]);

        assert_eq!(
            run.report.assertions_for(&arm()).to_vec(),
            vec![AssertionFailure {
                package: PKG.to_string(),
                file: "arm_test.go".to_string(),
                line: 10,
                expected: "true".to_string(),
                actual: "false".to_string(),
            }]
        );
        assert_eq!(run.report.test_failures, vec![arm()]);
        assert!(run.violations.is_empty());
    }

    #[test]
    fn test_expected_without_colon() {
        let run = run(vec![output(
            Some("TestArm"),
            "    gpiostepper_test.go:391: Expected '0' to be between '1' and '20000' or equal to one of them (but it wasn't)!",
        )]);

        let assertions = run.report.assertions_for(&arm());
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].file, "gpiostepper_test.go");
        assert_eq!(assertions[0].line, 391);
        assert_eq!(
            assertions[0].expected,
            "'0' to be between '1' and '20000' or equal to one of them (but it wasn't)!"
        );
    }

    #[test]
    fn test_unterminated_expected_is_flushed() {
        let run = run(vec![
            output(Some("TestArm"), "arm_test.go:10: Expected: nil"),
            fail(Some("TestArm")),
        ]);

        let assertions = run.report.assertions_for(&arm());
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].actual, "");
        assert!(!assertions[0].has_actual());
    }

    #[test]
    fn test_multiple_sequential_assertions() {
        let run = run(vec![
            output(Some("TestArm"), "arm_test.go:10: Expected: 1"),
            output(Some("TestArm"), "Actual: 2"),
            output(Some("TestArm"), "arm_test.go:20: Expected: 3"),
            output(Some("TestArm"), "Actual: 4"),
        ]);

        let lines: Vec<u32> = run
            .report
            .assertions_for(&arm())
            .iter()
            .map(|a| a.line)
            .collect();
        assert_eq!(lines, vec![10, 20]);
        assert_eq!(run.report.test_failures, vec![arm()]);
    }

    #[test]
    fn test_duplicate_expected_is_recorded_and_state_kept() {
        let run = run(vec![
            output(Some("TestArm"), "arm_test.go:10: Expected: 1"),
            output(Some("TestArm"), "arm_test.go:20: Expected: 3"),
            output(Some("TestArm"), "Actual: 2"),
        ]);

        assert_eq!(
            run.violations,
            vec![SequenceViolation::DuplicateHalfOpenAssertion {
                test: arm(),
                file: "arm_test.go".to_string(),
                line: 20,
            }]
        );
        let assertions = run.report.assertions_for(&arm());
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].line, 10);
        assert_eq!(assertions[0].actual, "2");
        // The rejected line is still part of the raw log
        assert_eq!(run.report.logs_for(&arm()).len(), 3);
    }

    #[test]
    fn test_unmatched_actual_is_recorded() {
        let run = run(vec![
            output(Some("TestArm"), "Actual: 2"),
            fail(Some("TestArm")),
        ]);

        assert_eq!(run.violations.len(), 1);
        assert!(matches!(
            run.violations[0],
            SequenceViolation::UnmatchedActualLine { .. }
        ));
        assert!(run.report.assertions.is_empty());
        assert_eq!(run.report.test_failures, vec![arm()]);
    }

    #[test]
    fn test_abort_policy_returns_violation() {
        let config = ClassifierConfig::default().on_violation(ViolationPolicy::Abort);
        let result = classify_events(
            vec![Ok(output(Some("TestArm"), "Actual: 2"))],
            config,
        );
        assert!(matches!(
            result,
            Err(ClassifyError::Sequence(SequenceViolation::UnmatchedActualLine { .. }))
        ));
    }

    #[test]
    fn test_violation_in_one_test_keeps_others() {
        let run = run(vec![
            output(Some("TestBroken"), "Actual: 2"),
            output(Some("TestArm"), "arm_test.go:10: Expected: true"),
            output(Some("TestArm"), "Actual: false"),
        ]);

        assert_eq!(run.violations.len(), 1);
        assert_eq!(run.report.assertions_for(&arm()).len(), 1);
    }

    #[test]
    fn test_excluded_test_opens_no_assertion() {
        let config = ClassifierConfig::default().exclude_test("TestSabertooth");
        let mut classifier = Classifier::new(config);
        let step = classifier
            .process(output(Some("TestSabertoothMotor"), "motor_test.go:5: Expected: 1"))
            .expect("Should process");
        assert_eq!(step, Step::Excluded);
        let step = classifier
            .process(output(Some("TestSabertoothMotor"), "Actual: 2"))
            .expect("Excluded Actual-lines are not violations");
        assert_eq!(step, Step::Excluded);

        let run = classifier.finalize();
        assert!(run.report.assertions.is_empty());
        assert!(run.report.logs.is_empty());
    }

    #[test]
    fn test_custom_filter() {
        let mut classifier = Classifier::with_filter(ClassifierConfig::default(), |event: &LogEvent| {
            event.package.ends_with("/arm")
        });
        let step = classifier
            .process(output(Some("TestArm"), "arm_test.go:10: Expected: true"))
            .expect("Should process");
        assert_eq!(step, Step::Excluded);
    }

    #[test]
    fn test_timeout_collects_following_lines() {
        let run = run(vec![
            output(Some("TestArm"), "panic: test timed out after 10m0s"),
            output(Some("TestArm"), "goroutine 1 [running]:"),
            output(Some("TestArm"), "arm_test.go:99: Expected: nil"),
            output(Some("TestOther"), "unrelated"),
            fail(Some("TestArm")),
        ]);

        let timeout = run.report.timeout_for(&arm()).expect("timeout recorded");
        assert_eq!(
            timeout.log_lines,
            vec![
                "panic: test timed out after 10m0s".to_string(),
                "goroutine 1 [running]:".to_string(),
            ]
        );
        // Expected-lines take priority over timeout continuation
        assert_eq!(run.report.assertions_for(&arm()).len(), 1);
        assert_eq!(run.report.test_failures, vec![arm()]);
    }

    #[test]
    fn test_timeout_restart_replaces_record() {
        let run = run(vec![
            output(Some("TestArm"), "panic: test timed out after 1m0s"),
            output(Some("TestArm"), "goroutine 1 [running]:"),
            output(Some("TestArm"), "panic: test timed out after 2m0s"),
        ]);

        let timeout = run.report.timeout_for(&arm()).expect("timeout recorded");
        assert_eq!(
            timeout.log_lines,
            vec!["panic: test timed out after 2m0s".to_string()]
        );
        assert_eq!(run.report.test_failures, vec![arm()]);
    }

    #[test]
    fn test_feed_exposes_progress() {
        let mut classifier = Classifier::new(ClassifierConfig::default());
        let consumed = classifier
            .feed(
                vec![
                    output(Some("TestArm"), "Actual: 2"),
                    output(Some("TestArm"), "panic: test timed out after 1m0s"),
                    fail(Some("TestArm")),
                ]
                .into_iter()
                .map(Ok),
            )
            .expect("record policy never fails");

        assert_eq!(consumed, 3);
        assert_eq!(classifier.events_processed(), 3);
        assert_eq!(classifier.violations().len(), 1);
        assert!(classifier.report().timeout_for(&arm()).is_some());
        // Failing list is only sorted and deduplicated by finalize
        assert_eq!(classifier.report().test_failures, vec![arm(), arm()]);
        assert_eq!(classifier.finalize().report.test_failures, vec![arm()]);
    }

    #[test]
    fn test_datarace_is_keyed_by_package() {
        let run = run(vec![
            output(Some("TestArm"), "WARNING: DATA RACE"),
            output(Some("TestArm"), "Read at 0x00c000123 by goroutine 7:"),
            output(None, "=================="),
            output(Some("TestGripper"), "WARNING: DATA RACE"),
            output(Some("TestGripper"), "Write at 0x00c000456 by goroutine 9:"),
        ]);

        assert_eq!(run.report.dataraces.len(), 1);
        let race = run
            .report
            .dataraces
            .get(&FqTest::package_level(PKG))
            .expect("race recorded");
        assert_eq!(race.package, PKG);
        assert_eq!(
            race.log_lines,
            vec![
                "WARNING: DATA RACE".to_string(),
                "Read at 0x00c000123 by goroutine 7:".to_string(),
                "==================".to_string(),
                "WARNING: DATA RACE".to_string(),
                "Write at 0x00c000456 by goroutine 9:".to_string(),
            ]
        );
        assert_eq!(
            run.report.test_failures,
            vec![arm(), FqTest::for_test(PKG, "TestGripper")]
        );
        // Logs follow the race record's key, the package
        assert_eq!(
            run.report.logs_for(&FqTest::package_level(PKG)).to_vec(),
            vec!["==================".to_string()]
        );
        assert!(run.report.logs_for(&arm()).is_empty());
    }

    #[test]
    fn test_race_marker_must_be_exact() {
        let run = run(vec![output(Some("TestArm"), "  WARNING: DATA RACE")]);
        assert!(run.report.dataraces.is_empty());
    }

    #[test]
    fn test_package_failure() {
        let run = run(vec![fail(None)]);
        assert_eq!(
            run.report.package_failures,
            vec![PackageFailure {
                package: PKG.to_string(),
                elapsed: 1.5,
                time: None,
            }]
        );
        assert!(run.report.test_failures.is_empty());
    }

    #[test]
    fn test_unclassified_fail_has_no_logs() {
        let run = run(vec![
            output(Some("TestArm"), "=== RUN   TestArm"),
            output(Some("TestArm"), "some log line"),
            fail(Some("TestArm")),
        ]);

        assert_eq!(run.report.test_failures, vec![arm()]);
        assert!(run.report.logs.is_empty());
        assert_eq!(run.report.unclassified_failures(), vec![&arm()]);
    }

    #[test]
    fn test_logs_attached_to_classified_tests() {
        let run = run(vec![
            output(Some("TestArm"), "=== RUN   TestArm"),
            output(Some("TestArm"), "arm_test.go:10: Expected: true"),
            output(Some("TestArm"), "Actual: false"),
            output(Some("TestArm"), "--- FAIL: TestArm (0.01s)"),
        ]);

        assert_eq!(
            run.report.logs_for(&arm()).to_vec(),
            vec![
                "=== RUN   TestArm".to_string(),
                "arm_test.go:10: Expected: true".to_string(),
                "Actual: false".to_string(),
                "--- FAIL: TestArm (0.01s)".to_string(),
            ]
        );
    }

    #[test]
    fn test_other_actions_ignored() {
        let mut classifier = Classifier::new(ClassifierConfig::default());
        let mut event = fail(Some("TestArm"));
        event.action = Action::Pass;
        assert_eq!(classifier.process(event).expect("Should process"), Step::Ignored);
        assert!(classifier.finalize().report.is_success());
    }

    #[test]
    fn test_no_failures_gives_empty_report() {
        let run = classify_str(
            r#"{"Action":"run","Package":"p","Test":"TestA"}
{"Action":"output","Package":"p","Test":"TestA","Output":"=== RUN   TestA\n"}
{"Action":"pass","Package":"p","Test":"TestA","Elapsed":0.01}
{"Action":"pass","Package":"p","Elapsed":0.02}"#,
            ClassifierConfig::default(),
        )
        .expect("Should classify");

        assert!(run.report.is_success());
        assert!(run.report.logs.is_empty());
        assert_eq!(run.events_processed, 4);
    }

    #[test]
    fn test_decode_error_keeps_partial_state() {
        let mut classifier = Classifier::new(ClassifierConfig::default());
        let result = classifier.feed(EventReader::from_text(
            "{\"Action\":\"fail\",\"Package\":\"p\",\"Test\":\"TestA\"}\n{broken\n",
        ));
        assert!(matches!(result, Err(ClassifyError::Decode(_))));

        let run = classifier.finalize();
        assert_eq!(run.report.test_failures, vec![FqTest::for_test("p", "TestA")]);
    }

    #[test]
    fn test_line_number_overflow_is_not_an_assertion() {
        let run = run(vec![output(
            Some("TestArm"),
            "arm_test.go:99999999999: Expected: true",
        )]);
        assert!(run.report.assertions.is_empty());
    }
}
