//! Nagios performance data: `'label'=value[UOM];warn;crit;min;max`.

use std::fmt;
use std::str::FromStr;

use crate::{CheckError, Thresholds};

/// Units of measure accepted in performance data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Seconds,
    Milliseconds,
    Microseconds,
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
    Counter,
}

impl Unit {
    pub const ALL: [Unit; 10] = [
        Unit::Percent,
        Unit::Seconds,
        Unit::Milliseconds,
        Unit::Microseconds,
        Unit::Bytes,
        Unit::Kilobytes,
        Unit::Megabytes,
        Unit::Gigabytes,
        Unit::Terabytes,
        Unit::Counter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Microseconds => "us",
            Self::Bytes => "B",
            Self::Kilobytes => "KB",
            Self::Megabytes => "MB",
            Self::Gigabytes => "GB",
            Self::Terabytes => "TB",
            Self::Counter => "c",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_units(Some(s))
    }
}

/// Case sensitive: `ms` and `MB` differ by more than scale.
pub fn validate_units(raw: Option<&str>) -> Result<Unit, CheckError> {
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| CheckError::Usage("units not defined".to_owned()))?;
    Unit::ALL
        .into_iter()
        .find(|u| u.as_str() == raw)
        .ok_or_else(|| {
            let valid: Vec<_> = Unit::ALL.iter().map(Unit::as_str).collect();
            CheckError::Usage(format!(
                "invalid units '{}' defined: must be one of: {}",
                raw,
                valid.join(", ")
            ))
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerfData {
    pub label: String,
    pub value: f64,
    pub unit: Option<Unit>,
    pub warning: Option<String>,
    pub critical: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PerfData {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            unit: None,
            warning: None,
            critical: None,
            min: None,
            max: None,
        }
    }

    pub fn with_unit(mut self, unit: Option<Unit>) -> Self {
        self.unit = unit;
        self
    }

    /// Copy the raw expressions of any set thresholds.
    pub fn with_thresholds(mut self, thresholds: &Thresholds) -> Self {
        let raw = |t: &crate::Threshold| {
            (!t.is_optional()).then(|| t.raw_expression().to_owned())
        };
        self.warning = raw(&thresholds.warning);
        self.critical = raw(&thresholds.critical);
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self
            .label
            .chars()
            .any(|c| c.is_whitespace() || c == '=' || c == '\'')
        {
            write!(f, "'{}'", self.label.replace('\'', "''"))?;
        } else {
            f.write_str(&self.label)?;
        }
        write!(f, "={}", self.value)?;
        if let Some(unit) = self.unit {
            write!(f, "{}", unit)?;
        }

        let optional = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        let fields = [
            self.warning.clone().unwrap_or_default(),
            self.critical.clone().unwrap_or_default(),
            optional(self.min),
            optional(self.max),
        ];
        let used = fields.iter().rposition(|s| !s.is_empty()).map_or(0, |i| i + 1);
        for field in &fields[..used] {
            write!(f, ";{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{config_file::PluginConfig, validate_thresholds};

    #[test]
    fn units_are_case_sensitive() {
        assert_eq!(validate_units(Some("MB")).unwrap(), Unit::Megabytes);
        assert_eq!("%".parse::<Unit>().unwrap(), Unit::Percent);
        assert_matches!(validate_units(Some("mb")), Err(CheckError::Usage(_)));
        assert_matches!(validate_units(None), Err(CheckError::Usage(_)));
    }

    #[test]
    fn renders_thresholds_and_trims_trailing_fields() {
        let t = validate_thresholds(None, Some("80"), Some("@0:5"), &PluginConfig::default())
            .unwrap();
        let p = PerfData::new("used", 42.5)
            .with_unit(Some(Unit::Percent))
            .with_thresholds(&t);
        assert_eq!(p.to_string(), "used=42.5%;80;@0:5");

        let p = PerfData::new("queue", 3.).with_range(Some(0.), None);
        assert_eq!(p.to_string(), "queue=3;;;0");

        assert_eq!(PerfData::new("bare", 1.).to_string(), "bare=1");
    }

    #[test]
    fn quotes_awkward_labels() {
        assert_eq!(PerfData::new("disk /var", 1.).to_string(), "'disk /var'=1");
        assert_eq!(PerfData::new("it's", 1.).to_string(), "'it''s'=1");
    }
}
