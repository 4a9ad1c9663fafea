//! Configuration for the bfreport command line
//!
//! This module provides the CLI definition and the helpers that turn parsed
//! flags into classifier, correlation and ticket settings.

use std::path::{Path, PathBuf};

use bfreport_dedup::{CodeHost, DEFAULT_MAX_LOG_BYTES, TicketOptions};
use bfreport_gotest::{ClassifierConfig, ViolationPolicy};
use clap::{Parser, Subcommand};

/// Input path that stands for stdin
pub const STDIN_PATH: &str = "-";

/// bfreport - classify and dedup failures in `go test -json` logs
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "bfreport")]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// JSON file of tracked issues: `[{"key": ..., "summary": ...}]`
    ///
    /// Defaults to bfreport/tracked.json in the platform config directory,
    /// used only when that file exists.
    #[arg(long, global = true, env = "BFREPORT_TRACKED")]
    pub tracked: Option<PathBuf>,

    /// Ignore Expected/Actual assertions from tests whose name contains this
    ///
    /// May be given more than once.
    #[arg(long = "exclude-test", value_name = "SUBSTR", global = true)]
    pub exclude_tests: Vec<String>,

    /// Fail on malformed Expected/Actual sequences instead of recording them
    #[arg(long, global = true, default_value = "false")]
    pub strict: bool,

    /// Include ticket drafts for failures that are not tracked yet
    #[arg(long, global = true, default_value = "false")]
    pub tickets: bool,

    /// Link to the CI run, used in ticket descriptions
    #[arg(long, global = true, env = "BFREPORT_RUN_LINK")]
    pub run_link: Option<String>,

    /// Byte budget for the logs in a ticket description [default: 30000]
    #[arg(long, global = true, env = "BFREPORT_MAX_LOG_BYTES")]
    pub max_log_bytes: Option<usize>,

    /// Repository web URL for assertion code links
    #[arg(long, global = true, env = "BFREPORT_REPO_URL")]
    pub repo_url: Option<String>,

    /// Go module path the repository hosts, e.g. go.viam.com/rdk
    #[arg(long, global = true, env = "BFREPORT_MODULE_PREFIX")]
    pub module_prefix: Option<String>,

    /// Commit the run tested, for assertion code links
    #[arg(long, global = true, env = "BFREPORT_GIT_HASH")]
    pub git_hash: Option<String>,

    /// Enable verbose logging (debug level)
    ///
    /// Also traces every classified log line. Logs are written to stderr so
    /// stdout only carries the report.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify a log and print the report as JSON
    ///
    /// Example:
    ///   go test -json ./... | bfreport analyze --tickets -
    Analyze {
        /// `go test -json` log file, or - for stdin
        #[arg(value_name = "LOG")]
        input: PathBuf,
    },

    /// Print one summary line per failing test
    Summaries {
        /// `go test -json` log file, or - for stdin
        #[arg(value_name = "LOG")]
        input: PathBuf,
    },
}

impl Command {
    /// Log file the command reads
    #[must_use]
    pub fn input(&self) -> &Path {
        match self {
            Self::Analyze { input } | Self::Summaries { input } => input,
        }
    }
}

/// Check if a path argument means stdin
#[must_use]
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}

impl Config {
    /// Path of the tracked issue file, if any
    ///
    /// An explicit `--tracked` path is always returned. Otherwise the default
    /// location is returned only if a file exists there:
    /// - macOS: ~/Library/Application Support/bfreport/tracked.json
    /// - Linux: ~/.config/bfreport/tracked.json
    /// - Windows: %APPDATA%\bfreport\tracked.json
    #[must_use]
    pub fn tracked_path(&self) -> Option<PathBuf> {
        if let Some(ref tracked) = self.tracked {
            return Some(tracked.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("bfreport").join("tracked.json"))
            .filter(|path| path.is_file())
    }

    /// Classifier settings derived from the flags
    #[must_use]
    pub fn classifier_config(&self) -> ClassifierConfig {
        let mut config = self
            .exclude_tests
            .iter()
            .fold(ClassifierConfig::default(), |config, substr| {
                config.exclude_test(substr.clone())
            });
        if self.strict {
            config = config.on_violation(ViolationPolicy::Abort);
        }
        if self.verbose {
            config = config.with_line_tracing();
        }
        config
    }

    /// Code host for assertion links, when all of its parts are configured
    #[must_use]
    pub fn code_host(&self) -> Option<CodeHost> {
        match (&self.module_prefix, &self.repo_url, &self.git_hash) {
            (Some(prefix), Some(url), Some(hash)) => Some(CodeHost::new(prefix, url, hash)),
            _ => None,
        }
    }

    /// Ticket drafting settings derived from the flags
    #[must_use]
    pub fn ticket_options(&self) -> TicketOptions {
        TicketOptions {
            run_link: self.run_link.clone().unwrap_or_default(),
            code_host: self.code_host(),
            max_log_bytes: self.max_log_bytes.unwrap_or(DEFAULT_MAX_LOG_BYTES),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input log is a path that doesn't exist
    /// - An explicit tracked issue file doesn't exist
    /// - Only some of the code link options are set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref command) = self.command {
            let input = command.input();
            if !is_stdin(input) && !input.is_file() {
                return Err(ConfigError::InputNotFound(input.to_path_buf()));
            }
        }

        if let Some(ref tracked) = self.tracked
            && !tracked.is_file()
        {
            return Err(ConfigError::TrackedNotFound(tracked.clone()));
        }

        let link_parts = [&self.module_prefix, &self.repo_url, &self.git_hash];
        let set = link_parts.iter().filter(|part| part.is_some()).count();
        if set != 0 && set != link_parts.len() {
            return Err(ConfigError::IncompleteCodeHost);
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input log not found
    #[error("Input log not found: {0}")]
    InputNotFound(PathBuf),

    /// Tracked issue file not found
    #[error("Tracked issue file not found: {0}")]
    TrackedNotFound(PathBuf),

    /// Code links need all of --module-prefix, --repo-url and --git-hash
    #[error("Code links need --module-prefix, --repo-url and --git-hash together")]
    IncompleteCodeHost,
}
