//! Glue between command-line style options and [`Threshold`]s.
//!
//! Option parsing itself belongs to the check program; it only needs to hand
//! raw values over through [`OptionSource`].

use std::collections::HashMap;

use tracing::debug;

use crate::{
    config_file::PluginConfig, parse_threshold, CheckError, Status, StatusAggregator, Threshold,
    ThresholdOptions,
};

/// Where raw option values come from.
pub trait OptionSource {
    fn value_of(&self, name: &str) -> Option<&str>;
}

impl OptionSource for HashMap<String, String> {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A user-facing option a check program should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Long name without dashes, e.g. `disk-warning`.
    pub name: String,
    pub help: String,
}

/// `warning`/`critical`, or `<prefix>-warning`/`<prefix>-critical`.
pub fn threshold_option_names(prefix: Option<&str>) -> (String, String) {
    match prefix.filter(|p| !p.is_empty()) {
        Some(p) => (format!("{}-warning", p), format!("{}-critical", p)),
        None => ("warning".to_owned(), "critical".to_owned()),
    }
}

/// The warning and critical options for one metric.
pub fn register_thresholds(prefix: Option<&str>) -> [OptionSpec; 2] {
    let (warning, critical) = threshold_option_names(prefix);
    let subject = prefix.map(|p| format!("{} ", p)).unwrap_or_default();
    [
        OptionSpec {
            name: warning,
            help: format!("{}warning threshold or ran:ge (inclusive)", subject),
        },
        OptionSpec {
            name: critical,
            help: format!("{}critical threshold or ran:ge (inclusive)", subject),
        },
    ]
}

/// Parse one named threshold, reporting bad input as a usage error.
pub fn validate_threshold(
    name: &str,
    raw: Option<&str>,
    optional: bool,
    config: &PluginConfig,
) -> Result<Threshold, CheckError> {
    let options = ThresholdOptions::new(name)
        .optional(optional)
        .allow_negative(config.thresholds.allow_negative);
    let threshold = parse_threshold(raw, &options).map_err(|e| {
        if raw.map_or(true, |r| r.trim().is_empty()) {
            CheckError::Usage(format!("{} threshold not defined", name))
        } else {
            e.into()
        }
    })?;
    vlog_option(&format!("{} threshold", name), threshold.raw_expression());
    Ok(threshold)
}

/// Parse the warning and critical thresholds of one metric. Both are optional
/// unless the config requires them.
pub fn validate_thresholds(
    prefix: Option<&str>,
    warning_raw: Option<&str>,
    critical_raw: Option<&str>,
    config: &PluginConfig,
) -> Result<Thresholds, CheckError> {
    let (warning_name, critical_name) = threshold_option_names(prefix);
    let optional = !config.thresholds.required;
    Ok(Thresholds {
        warning: validate_threshold(&warning_name, warning_raw, optional, config)?,
        critical: validate_threshold(&critical_name, critical_raw, optional, config)?,
    })
}

/// Fetch the registered threshold options for `prefix` from `source`.
pub fn thresholds_from(
    source: &impl OptionSource,
    prefix: Option<&str>,
    config: &PluginConfig,
) -> Result<Thresholds, CheckError> {
    let (warning, critical) = threshold_option_names(prefix);
    validate_thresholds(
        prefix,
        source.value_of(&warning),
        source.value_of(&critical),
        config,
    )
}

/// Warning and critical thresholds of a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub warning: Threshold,
    pub critical: Threshold,
}

impl Thresholds {
    /// Status of `value` on its own: CRITICAL beats WARNING beats OK.
    pub fn classify(&self, value: f64) -> Result<Status, CheckError> {
        if self.critical.check(value)? {
            Ok(Status::Critical)
        } else if self.warning.check(value)? {
            Ok(Status::Warning)
        } else {
            Ok(Status::Ok)
        }
    }

    /// Classify `value` and escalate `status` on a breach. OK results are
    /// left for the caller to confirm with [`StatusAggregator::set_ok`].
    pub fn apply(&self, value: f64, status: &mut StatusAggregator) -> Result<Status, CheckError> {
        let outcome = self.classify(value)?;
        if outcome != Status::Ok {
            status.escalate(outcome);
        }
        Ok(outcome)
    }

    /// `w=<warning>/c=<critical>` for status messages, skipping unset sides.
    pub fn describe(&self) -> String {
        [("w", &self.warning), ("c", &self.critical)]
            .into_iter()
            .filter(|(_, t)| !t.is_optional())
            .map(|(k, t)| format!("{}={}", k, t))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Parse a floating point option within `[min, max]`.
pub fn validate_float(name: &str, raw: Option<&str>, min: f64, max: f64) -> Result<f64, CheckError> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(CheckError::Coding(format!(
            "invalid min/max ({}/{}) passed for {}",
            min, max, name
        )));
    }
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| CheckError::Usage(format!("{} not defined", name)))?;
    let value: f64 = raw
        .parse()
        .ok()
        .filter(|v: &f64| !v.is_nan())
        .ok_or_else(|| CheckError::Usage(format!("invalid {} defined: must be a real number", name)))?;
    if value < min || value > max {
        return Err(CheckError::Usage(format!(
            "invalid {} defined: must be real number between {} and {}",
            name, min, max
        )));
    }
    vlog_option(name, raw);
    Ok(value)
}

/// Parse an integer option within `[min, max]`.
pub fn validate_int(name: &str, raw: Option<&str>, min: i64, max: i64) -> Result<i64, CheckError> {
    if min > max {
        return Err(CheckError::Coding(format!(
            "invalid min/max ({}/{}) passed for {}",
            min, max, name
        )));
    }
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| CheckError::Usage(format!("{} not defined", name)))?;
    let value: i64 = raw
        .parse()
        .map_err(|_| CheckError::Usage(format!("invalid {} defined: must be an integer", name)))?;
    if value < min || value > max {
        return Err(CheckError::Usage(format!(
            "invalid {} defined: must be integer between {} and {}",
            name, min, max
        )));
    }
    vlog_option(name, raw);
    Ok(value)
}

fn vlog_option(name: &str, value: &str) {
    debug!(option = name, value, "option set");
}
