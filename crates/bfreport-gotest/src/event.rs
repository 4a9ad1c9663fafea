//! `go test -json` event decoding
//!
//! `go test -json` (via `test2json`) writes one JSON object per line:
//!
//! ```text
//! {"Time":"2023-07-31T18:02:06.230836214Z","Action":"output","Package":"go.viam.com/rdk/arm","Test":"TestArm","Output":"    arm_test.go:10: Expected: true\n"}
//! {"Time":"2023-07-31T18:02:06.230876134Z","Action":"fail","Package":"go.viam.com/rdk/arm","Test":"TestArm","Elapsed":5.03}
//! ```
//!
//! [`EventReader`] turns such a stream into [`LogEvent`] values lazily, in
//! stream order, and stops at the first malformed record.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, Lines};
use std::iter::FusedIterator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DecodeError;

// ============================================================================
// Event Types
// ============================================================================

/// The `Action` field of a `test2json` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The test binary is about to be executed
    Start,
    /// A test has started running
    Run,
    /// A test has been paused
    Pause,
    /// A test has continued running
    Cont,
    /// A test passed
    Pass,
    /// A benchmark printed log output
    Bench,
    /// A test or package failed
    Fail,
    /// The test printed output
    Output,
    /// A test was skipped
    Skip,
    /// Any action this crate does not know about
    #[serde(other)]
    Other,
}

/// A single decoded `test2json` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEvent {
    /// When the event was emitted
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// What happened
    pub action: Action,
    /// Go package the event belongs to
    #[serde(default, deserialize_with = "null_as_default")]
    pub package: String,
    /// Test name, absent for package-level events
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub test: Option<String>,
    /// Output text (right-trimmed by [`EventReader`])
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    /// Seconds elapsed, set on pass/fail events
    #[serde(default, deserialize_with = "null_as_default")]
    pub elapsed: f64,
}

impl LogEvent {
    /// Identity of the test (or package) this event belongs to
    #[must_use]
    pub fn fq_test(&self) -> FqTest {
        match self.test.as_deref() {
            Some(test) => FqTest::for_test(&self.package, test),
            None => FqTest::package_level(&self.package),
        }
    }

    /// Check if this is a `fail` event
    #[must_use]
    pub fn is_fail(&self) -> bool {
        self.action == Action::Fail
    }

    /// Check if this is an `output` event
    #[must_use]
    pub fn is_output(&self) -> bool {
        self.action == Action::Output
    }
}

/// Go's decoder leaves fields at their zero value on `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

// ============================================================================
// Fully Qualified Test
// ============================================================================

/// Fully qualified test identity: `<package>.<test>`, or `<package>` alone
/// for package-level failures
///
/// Equality, hashing and ordering use the rendered string only. The package
/// boundary is remembered so the package can be recovered even though Go
/// import paths contain dots.
#[derive(Debug, Clone)]
pub struct FqTest {
    key: String,
    package_len: usize,
}

impl FqTest {
    /// Identity of a named test inside a package
    #[must_use]
    pub fn for_test(package: &str, test: &str) -> Self {
        Self {
            key: format!("{}.{}", package, test),
            package_len: package.len(),
        }
    }

    /// Identity of a package as a whole
    #[must_use]
    pub fn package_level(package: &str) -> Self {
        Self {
            key: package.to_string(),
            package_len: package.len(),
        }
    }

    /// The rendered identity
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The package part
    #[must_use]
    pub fn package(&self) -> &str {
        &self.key[..self.package_len]
    }

    /// The test part, `None` for package-level identities
    #[must_use]
    pub fn test(&self) -> Option<&str> {
        self.key.get(self.package_len + 1..)
    }

    /// Check if this identity names a package rather than a test
    #[must_use]
    pub fn is_package_level(&self) -> bool {
        self.key.len() == self.package_len
    }

    /// The package-level identity of this test's package
    #[must_use]
    pub fn to_package_level(&self) -> Self {
        Self::package_level(self.package())
    }
}

impl PartialEq for FqTest {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FqTest {}

impl Hash for FqTest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for FqTest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FqTest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for FqTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl Serialize for FqTest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Parse a single `test2json` record
///
/// The output text is returned exactly as recorded; [`EventReader`] is what
/// right-trims it.
///
/// # Errors
///
/// Returns `serde_json::Error` if the JSON is invalid or lacks an `Action`.
pub fn parse_event(json: &str) -> Result<LogEvent, serde_json::Error> {
    serde_json::from_str(json)
}

/// Lazy decoder over a newline-delimited `go test -json` stream
///
/// Yields events in stream order. Blank lines are skipped. After the first
/// error the reader is exhausted; to start over, build a new reader.
pub struct EventReader<R> {
    lines: Lines<R>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> EventReader<R> {
    /// Create a decoder over a buffered reader
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            done: false,
        }
    }

    /// Number of input lines consumed so far
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl<'a> EventReader<&'a [u8]> {
    /// Create a decoder over an in-memory log
    #[must_use]
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<LogEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(source)) => {
                    self.done = true;
                    return Some(Err(DecodeError::Io {
                        line: self.line_no + 1,
                        source,
                    }));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };
            self.line_no += 1;

            let record = line.trim();
            if record.is_empty() {
                continue;
            }

            return match parse_event(record) {
                Ok(mut event) => {
                    let trimmed_len = event.output.trim_end().len();
                    event.output.truncate(trimmed_len);
                    Some(Ok(event))
                }
                Err(source) => {
                    self.done = true;
                    Some(Err(DecodeError::Json {
                        line: self.line_no,
                        source,
                    }))
                }
            };
        }
    }
}

impl<R: BufRead> FusedIterator for EventReader<R> {}
