// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! Fuzz target for the classifier
//!
//! Builds structured event sequences so the fuzzer spends its time on
//! classification state rather than on JSON syntax.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use bfreport_gotest::{Action, Classifier, ClassifierConfig, LogEvent};

#[derive(Debug, Arbitrary)]
struct FuzzEvent {
    fail: bool,
    package: u8,
    test: Option<u8>,
    line: FuzzLine,
}

#[derive(Debug, Arbitrary)]
enum FuzzLine {
    Expected(u16),
    Actual,
    Timeout,
    Race,
    Raw(String),
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    for event in events {
        let output = match event.line {
            FuzzLine::Expected(line) => format!("x_test.go:{line}: Expected: true"),
            FuzzLine::Actual => "    Actual: false".to_string(),
            FuzzLine::Timeout => "panic: test timed out after 1s".to_string(),
            FuzzLine::Race => "WARNING: DATA RACE".to_string(),
            FuzzLine::Raw(text) => text,
        };
        let _ = classifier.process(LogEvent {
            time: None,
            action: if event.fail { Action::Fail } else { Action::Output },
            package: format!("pkg{}", event.package % 4),
            test: event.test.map(|t| format!("Test{}", t % 8)),
            output,
            elapsed: 0.0,
        });
    }

    let run = classifier.finalize();
    for pair in run.report.test_failures.windows(2) {
        assert!(pair[0] < pair[1]);
    }
});
