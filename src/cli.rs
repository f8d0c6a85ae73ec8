//! Command line of `check_value`, which holds one value to its thresholds.

use std::ffi::OsString;

use clap::{error::ErrorKind, ArgAction, Parser};
use color_eyre::Report;

use crate::{
    config_file::PluginConfig, thresholds_from, validate_float, validate_units, CheckContext,
    OptionSource, Outcome, PerfData, Runnable, Status,
};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "check_value")]
#[command(about = "Hold a single measured value to warning and critical thresholds", long_about = None)]
#[command(version)]
pub struct ValueArgs {
    /// Warning threshold or ran:ge (inclusive)
    #[arg(short, long, allow_hyphen_values = true)]
    pub warning: Option<String>,

    /// Critical threshold or ran:ge (inclusive)
    #[arg(short, long, allow_hyphen_values = true)]
    pub critical: Option<String>,

    /// Label used in the status line and performance data
    #[arg(short, long, default_value = "value")]
    pub label: String,

    /// Unit of measure: %, s, ms, us, B, KB, MB, GB, TB or c
    #[arg(short, long)]
    pub units: Option<String>,

    /// Accept a bare negative threshold N, meaning N:0
    #[arg(long)]
    pub allow_negative: bool,

    /// Log more to stderr, repeatable
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// The measured value
    #[arg(allow_negative_numbers = true)]
    pub value: String,
}

impl ValueArgs {
    /// Parse `args` (program name first). Help and version requests exit the
    /// process; anything else malformed becomes an UNKNOWN outcome.
    pub fn parse_args<I, T>(args: I) -> Result<Self, Outcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|err| match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => usage_outcome(&err),
        })
    }

    pub fn plugin_config(&self) -> PluginConfig {
        let mut config = PluginConfig {
            verbose: self.verbose,
            ..Default::default()
        };
        config.thresholds.allow_negative = self.allow_negative;
        config
    }
}

/// First line of a clap error, without its `error: ` lead-in.
fn usage_outcome(err: &clap::Error) -> Outcome {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    Outcome::unknown(first.strip_prefix("error: ").unwrap_or(first).to_owned())
}

impl OptionSource for ValueArgs {
    fn value_of(&self, name: &str) -> Option<&str> {
        match name {
            "warning" => self.warning.as_deref(),
            "critical" => self.critical.as_deref(),
            "label" => Some(self.label.as_str()),
            "units" => self.units.as_deref(),
            _ => None,
        }
    }
}

impl Runnable for ValueArgs {
    fn run(&mut self, check: &mut CheckContext, config: &PluginConfig) -> Result<(), Report> {
        let thresholds = thresholds_from(&*self, None, config)?;
        let value = validate_float("value", Some(self.value.as_str()), f64::MIN, f64::MAX)?;
        let unit = self.units.as_deref().map(|u| validate_units(Some(u))).transpose()?;

        let outcome = thresholds.apply(value, check.status_mut())?;
        if outcome == Status::Ok {
            check.status_mut().set_ok();
        }

        let unit_suffix = unit.map(|u| u.to_string()).unwrap_or_default();
        let mut message = format!("{} = {}{}", self.label, value, unit_suffix);
        let described = thresholds.describe();
        if outcome != Status::Ok && !described.is_empty() {
            message.push_str(&format!(" ({})", described));
        }
        check.set_message(message);
        check.push_perfdata(
            PerfData::new(self.label.clone(), value)
                .with_unit(unit)
                .with_thresholds(&thresholds),
        );
        Ok(())
    }
}
