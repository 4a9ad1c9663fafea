// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! bfreport-dedup: Fingerprints and tracked-issue correlation
//!
//! This library crate turns a classified [`FailureReport`] into stable
//! summary fingerprints, matches them against already tracked issues, and
//! drafts tickets for the failures nobody tracks yet.
//!
//! [`FailureReport`]: bfreport_gotest::FailureReport
//!
//! # Example
//!
//! ```no_run
//! use bfreport_dedup::{TrackedIssues, correlate_report};
//! use bfreport_gotest::{ClassifierConfig, classify_str};
//!
//! let log = std::fs::read_to_string("test.json").unwrap();
//! let run = classify_str(&log, ClassifierConfig::default()).unwrap();
//! let tracked = TrackedIssues::from_json("[]").unwrap();
//!
//! for correlation in correlate_report(&run.report, &tracked).into_iter().flatten() {
//!     println!("{}: {:?}", correlation.summary, correlation.decision);
//! }
//! ```

pub mod correlate;
pub mod error;
pub mod fingerprint;
pub mod ticket;

pub use correlate::{
    Correlation, Decision, TrackedIssue, TrackedIssues, correlate_report, correlate_summary,
};
pub use error::{DedupError, Result};
pub use fingerprint::{FailureKind, classify_failure, summary_for_failure};
pub use ticket::{
    CodeHost, DEFAULT_MAX_LOG_BYTES, FLAKY_TEST_LABEL, TicketDraft, TicketOptions, draft_ticket,
    draft_tickets, truncate_logs,
};
