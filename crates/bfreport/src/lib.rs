// Copyright (c) 2026 - present bfreport developers
// SPDX-License-Identifier: MIT

//! bfreport library
//!
//! This module exports the command line configuration and the analysis
//! pipeline for use in integration tests and as a library.

pub mod analyze;
pub mod config;
