// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! CLI parsing tests
//!
//! These tests verify flag parsing, subcommands, and how the parsed flags
//! map onto classifier and ticket settings.

use std::path::{Path, PathBuf};

use bfreport::config::{Command, Config};
use bfreport_gotest::ViolationPolicy;
use clap::Parser;
use tracing::Level;

// ============================================================================
// Subcommand tests
// ============================================================================

#[test]
fn test_analyze_subcommand() {
    let config = Config::try_parse_from(["bfreport", "analyze", "run.json"])
        .expect("parse should succeed");
    match config.command {
        Some(Command::Analyze { ref input }) => assert_eq!(input, &PathBuf::from("run.json")),
        other => panic!("expected analyze, got {other:?}"),
    }
}

#[test]
fn test_summaries_subcommand_stdin() {
    let config =
        Config::try_parse_from(["bfreport", "summaries", "-"]).expect("parse should succeed");
    let command = config.command.expect("subcommand");
    assert!(matches!(command, Command::Summaries { .. }));
    assert_eq!(command.input(), Path::new("-"));
}

#[test]
fn test_subcommand_requires_log() {
    let result = Config::try_parse_from(["bfreport", "analyze"]);
    assert!(result.is_err(), "LOG is required");
}

#[test]
fn test_unknown_subcommand() {
    let result = Config::try_parse_from(["bfreport", "file-tickets", "run.json"]);
    assert!(result.is_err());
}

#[test]
fn test_no_args_shows_help() {
    let err = Config::try_parse_from(["bfreport"]).expect_err("help expected");
    assert_eq!(
        err.kind(),
        clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    );
}

// ============================================================================
// Global flag tests
// ============================================================================

#[test]
fn test_flags_after_subcommand() {
    let config = Config::try_parse_from([
        "bfreport",
        "analyze",
        "run.json",
        "--strict",
        "--tickets",
        "-v",
    ])
    .expect("parse should succeed");
    assert!(config.strict);
    assert!(config.tickets);
    assert!(config.verbose);
}

#[test]
fn test_flags_before_subcommand() {
    let config = Config::try_parse_from(["bfreport", "-q", "--strict", "summaries", "run.json"])
        .expect("parse should succeed");
    assert!(config.quiet);
    assert!(config.strict);
    assert_eq!(config.log_level(), Level::WARN);
}

#[test]
fn test_exclude_test_repeatable() {
    let config = Config::try_parse_from([
        "bfreport",
        "analyze",
        "run.json",
        "--exclude-test",
        "TestFlaky",
        "--exclude-test",
        "TestSlow",
    ])
    .expect("parse should succeed");
    assert_eq!(config.exclude_tests, vec!["TestFlaky", "TestSlow"]);

    let classifier = config.classifier_config();
    assert_eq!(classifier.exclude_tests, vec!["TestFlaky", "TestSlow"]);
    assert_eq!(classifier.on_violation, ViolationPolicy::Record);
}

#[test]
fn test_strict_sets_abort_policy() {
    let config = Config::try_parse_from(["bfreport", "analyze", "run.json", "--strict"])
        .expect("parse should succeed");
    assert_eq!(config.classifier_config().on_violation, ViolationPolicy::Abort);
}

#[test]
fn test_verbose_enables_line_tracing() {
    let config = Config::try_parse_from(["bfreport", "-v", "analyze", "run.json"])
        .expect("parse should succeed");
    assert_eq!(config.log_level(), Level::DEBUG);
    assert!(config.classifier_config().trace_lines);
}

#[test]
fn test_verbose_flag_value_syntax_not_supported() {
    let result = Config::try_parse_from(["bfreport", "--verbose=true", "analyze", "run.json"]);
    assert!(result.is_err(), "Boolean flags don't support =value syntax");
}

#[test]
fn test_max_log_bytes() {
    let config = Config::try_parse_from([
        "bfreport",
        "analyze",
        "run.json",
        "--max-log-bytes",
        "1024",
    ])
    .expect("parse should succeed");
    assert_eq!(config.ticket_options().max_log_bytes, 1024);
}

#[test]
fn test_max_log_bytes_rejects_text() {
    let result = Config::try_parse_from([
        "bfreport",
        "analyze",
        "run.json",
        "--max-log-bytes",
        "lots",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_code_link_options() {
    let config = Config::try_parse_from([
        "bfreport",
        "analyze",
        "run.json",
        "--module-prefix",
        "go.viam.com/rdk",
        "--repo-url",
        "https://github.com/viamrobotics/rdk",
        "--git-hash",
        "abc123",
        "--run-link",
        "https://github.com/viamrobotics/rdk/actions/runs/1/job/2",
    ])
    .expect("parse should succeed");

    let options = config.ticket_options();
    let host = options.code_host.expect("code host");
    assert_eq!(host.module_prefix, "go.viam.com/rdk");
    assert_eq!(host.repo_url, "https://github.com/viamrobotics/rdk");
    assert_eq!(host.git_hash, "abc123");
    assert_eq!(
        options.run_link,
        "https://github.com/viamrobotics/rdk/actions/runs/1/job/2"
    );
}

#[test]
fn test_tracked_flag() {
    let config = Config::try_parse_from([
        "bfreport",
        "analyze",
        "run.json",
        "--tracked",
        "/tmp/tracked.json",
    ])
    .expect("parse should succeed");
    assert_eq!(config.tracked_path(), Some(PathBuf::from("/tmp/tracked.json")));
}
