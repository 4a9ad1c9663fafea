// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Error types for bfreport-gotest

use serde::Serialize;
use thiserror::Error;

use crate::event::FqTest;

/// Errors that can occur while decoding a `go test -json` stream
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A record was not valid JSON or did not match the event schema
    #[error("malformed record on line {line}: {source}")]
    Json {
        /// 1-based line number of the offending record
        line: usize,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Error reading from the underlying stream
    #[error("IO error on line {line}: {source}")]
    Io {
        /// 1-based line number being read when the error occurred
        line: usize,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl DecodeError {
    /// Line number the error was raised on
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Json { line, .. } | Self::Io { line, .. } => *line,
        }
    }
}

/// A malformed Expected/Actual sequence for a single test
///
/// These never corrupt the rest of the report: the offending line is kept in
/// the test's raw log buffer and classification state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceViolation {
    /// An Expected-line arrived while another one was still waiting for its Actual-line
    #[error("malformed assertion sequence for {test}: {file}:{line} opened while an assertion was pending")]
    DuplicateHalfOpenAssertion {
        /// Test the lines belong to
        test: FqTest,
        /// Source file named by the rejected Expected-line
        file: String,
        /// Source line named by the rejected Expected-line
        line: u32,
    },

    /// An Actual-line arrived with no pending Expected-line
    #[error("malformed assertion sequence for {test}: Actual line without a pending Expected line")]
    UnmatchedActualLine {
        /// Test the line belongs to
        test: FqTest,
        /// The raw Actual-line
        output: String,
    },
}

impl SequenceViolation {
    /// Test the violation was raised for
    #[must_use]
    pub fn test(&self) -> &FqTest {
        match self {
            Self::DuplicateHalfOpenAssertion { test, .. } | Self::UnmatchedActualLine { test, .. } => {
                test
            }
        }
    }
}

/// Errors that abort a classification run
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The event stream could not be decoded
    #[error("could not decode test log: {0}")]
    Decode(#[from] DecodeError),

    /// An assertion sequence was malformed and the run was configured to abort
    #[error("{0}")]
    Sequence(#[from] SequenceViolation),
}
