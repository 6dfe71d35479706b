//! Minimal CLI parsing for run mode overrides.

use std::env;

use crate::app_mode::RunMode;
use crate::services::LogFormat;

#[derive(Debug, Default)]
pub struct CliOptions {
    pub run_mode_override: Option<RunMode>,
    pub verbose: bool,
    pub log_format_override: Option<LogFormat>,
}

impl CliOptions {
    pub fn from_args() -> Self {
        Self::parse(env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dry-run" => options.run_mode_override = Some(RunMode::DryRun),
                "--verbose" | "-v" => options.verbose = true,
                "--lookup" => {
                    if let Some(value) = args.next() {
                        options.run_mode_override = Some(RunMode::Lookup(value));
                    }
                }
                "--find" => {
                    if let Some(value) = args.next() {
                        options.run_mode_override = Some(RunMode::Find(value));
                    }
                }
                "--log-format" => {
                    if let Some(value) = args.next() {
                        options.log_format_override = LogFormat::from_arg(&value);
                    }
                }
                _ if arg.starts_with("--lookup=") => {
                    if let Some(value) = arg.split_once('=').map(|(_, v)| v) {
                        options.run_mode_override = Some(RunMode::Lookup(value.to_string()));
                    }
                }
                _ if arg.starts_with("--find=") => {
                    if let Some(value) = arg.split_once('=').map(|(_, v)| v) {
                        options.run_mode_override = Some(RunMode::Find(value.to_string()));
                    }
                }
                _ if arg.starts_with("--log-format=") => {
                    if let Some(value) = arg.split_once('=').map(|(_, v)| v) {
                        options.log_format_override = LogFormat::from_arg(value);
                    }
                }
                _ => {}
            }
        }
        options
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode_override.clone().unwrap_or_else(RunMode::from_env)
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format_override.unwrap_or_else(LogFormat::from_env)
    }
}
