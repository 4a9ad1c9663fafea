// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Error types for bfreport-dedup

use bfreport_gotest::FqTest;
use thiserror::Error;

/// Errors that can occur while fingerprinting or correlating failures
#[derive(Debug, Error)]
pub enum DedupError {
    /// The test is in the failing list but has no assertion, timeout, or race record
    #[error("no classified failure recorded for {test}")]
    UnknownClassification {
        /// The failing test
        test: FqTest,
    },

    /// Tracked issue data could not be parsed
    #[error("invalid tracked issue data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for bfreport-dedup operations
pub type Result<T> = std::result::Result<T, DedupError>;
