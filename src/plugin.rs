//! Running a check program so that it always ends with a defined status.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use color_eyre::Report;
use tracing::{error, info};

use crate::{
    config_file::PluginConfig, CheckError, PerfData, Status, StatusAggregator, Threshold,
};

const DEFAULT_MESSAGE: &str = "MESSAGE NOT DEFINED";

/// A concrete check program, handed the configuration of the [`Plugin`]
/// driving it.
pub trait Runnable {
    fn run(&mut self, check: &mut CheckContext, config: &PluginConfig) -> Result<(), Report>;
}

/// Mutable state of one check run.
#[derive(Debug, Default)]
pub struct CheckContext {
    status: StatusAggregator,
    message: Option<String>,
    perfdata: Vec<PerfData>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &StatusAggregator {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusAggregator {
        &mut self.status
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn push_perfdata(&mut self, perfdata: PerfData) {
        self.perfdata.push(perfdata);
    }

    /// Evaluate `value` against the threshold registered as `name` in the
    /// program's own map, escalating on breach.
    pub fn check_threshold(
        &mut self,
        thresholds: &HashMap<String, Threshold>,
        name: &str,
        value: f64,
    ) -> Result<bool, CheckError> {
        let threshold = thresholds.get(name).ok_or_else(|| {
            CheckError::Coding(format!("threshold '{}' does not exist, typo?", name))
        })?;
        self.status.observe(threshold, value)
    }

    fn finish(self) -> Outcome {
        Outcome {
            status: self.status.finish(),
            message: self
                .message
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned()),
            perfdata: self.perfdata,
        }
    }
}

/// Final status line of a check run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    pub perfdata: Vec<PerfData>,
}

impl Outcome {
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            status: Status::Unknown,
            message: message.into(),
            perfdata: Vec::new(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    /// Print the status line on stdout and exit with the status code.
    pub fn print_and_exit(self) -> ! {
        println!("{}", self);
        std::process::exit(self.exit_code())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)?;
        if !self.perfdata.is_empty() {
            f.write_str(" |")?;
            for p in &self.perfdata {
                write!(f, " {}", p)?;
            }
        }
        Ok(())
    }
}

/// Drives a [`Runnable`], converting errors and panics into UNKNOWN.
#[derive(Debug, Clone, Default)]
pub struct Plugin {
    config: PluginConfig,
}

impl Plugin {
    pub fn new(config: PluginConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Set up logging from the config, then run `check` to an [`Outcome`].
    pub fn main(&self, check: &mut impl Runnable) -> Outcome {
        init_tracing(self.config.verbose);
        info!(timeout = ?self.config.timeout, "start");
        let mut ctx = CheckContext::new();
        let result =
            panic::catch_unwind(AssertUnwindSafe(|| check.run(&mut ctx, &self.config)));
        let outcome = match result {
            Ok(Ok(())) => ctx.finish(),
            Ok(Err(report)) => Outcome::unknown(describe_failure(&report)),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unidentified panic".to_owned());
                error!(panic = %msg, "check panicked");
                Outcome::unknown(format!("check panicked: {}", msg))
            }
        };
        info!(status = %outcome.status, "end");
        outcome
    }
}

fn describe_failure(report: &Report) -> String {
    match report.downcast_ref::<CheckError>() {
        Some(e) if e.is_usage() => e.to_string(),
        Some(e) => {
            error!(error = %e, "check program misused the API");
            e.to_string()
        }
        None => {
            error!(error = ?report, "check failed");
            format!("{:#}", report)
        }
    }
}

/// Log to stderr, leaving stdout to the status line.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
