// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! bfreport-gotest: Failure classification for `go test -json` logs
//!
//! This library crate decodes `go test -json` event streams and classifies
//! the failures in them (assertion mismatches, timeouts, data races) into a
//! canonical [`FailureReport`].
//!
//! # Example
//!
//! ```no_run
//! use bfreport_gotest::{ClassifierConfig, classify_reader};
//! use std::io::BufReader;
//!
//! let file = std::fs::File::open("test.json").unwrap();
//! let run = classify_reader(BufReader::new(file), ClassifierConfig::default()).unwrap();
//!
//! for test in &run.report.test_failures {
//!     println!("{test}: {} log lines", run.report.logs_for(test).len());
//! }
//! ```

pub mod classifier;
pub mod error;
pub mod event;
pub mod report;

pub use classifier::{
    AssertionFilter, ClassificationRun, Classifier, ClassifierConfig, Step, TestNameFilter,
    ViolationPolicy, classify_events, classify_reader, classify_str,
};
pub use error::{ClassifyError, DecodeError, SequenceViolation};
pub use event::{Action, EventReader, FqTest, LogEvent, parse_event};
pub use report::{
    AssertionFailure, DataraceFailure, FailureReport, PackageFailure, TimeoutFailure,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classifier::{Classifier, ClassifierConfig, ViolationPolicy, classify_reader};
    pub use crate::error::{ClassifyError, DecodeError, SequenceViolation};
    pub use crate::event::{EventReader, FqTest, LogEvent};
    pub use crate::report::FailureReport;
}
