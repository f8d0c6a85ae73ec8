//! A TOML config describing how check programs read thresholds and which
//! Prometheus metrics to check.
//!
//! Format of config file:
//! ```rust
//! let cfg = "
//! [plugin]
//! verbose = 1
//! timeout = \"5s\"
//!
//! [plugin.thresholds]
//! allow_negative = true
//!
//! [[elements]]
//! url = \"http://localhost:9419/metrics\"
//!
//! [[elements.metrics]]
//! metric_name = \"rabbitmq_queue_messages_ready\"
//! labels = {\"queue\" = \"orders\"}
//! warning = \"100\"
//! critical = \"500\"
//! unit = \"c\"
//! ";
//! let cfg = wtf_nagios_plugin::parse_config_str(cfg).unwrap();
//! assert_eq!(cfg.plugin.timeout, std::time::Duration::from_secs(5));
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use color_eyre::{eyre::WrapErr, Report};
use serde::Deserialize;

pub fn parse_config(config_file: impl AsRef<Path>) -> Result<Config, Report> {
    let path = config_file.as_ref();
    let cfg = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config file {}", path.display()))?;
    parse_config_str(&cfg)
}

pub fn parse_config_str(cfg: &str) -> Result<Config, Report> {
    toml::from_str::<Config>(cfg)
        .wrap_err("TOML file did not match deserialization struct, or was malformed")
}

// rust toml uses serde, so we define structs to deserialize into.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub plugin: PluginConfig,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// Settings handed to a check program and the threshold helpers.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PluginConfig {
    /// 0 = warn, 1 = info, 2 = debug, 3+ = trace
    #[serde(default)]
    pub verbose: u8,
    #[serde(
        default = "default_timeout",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub timeout: Duration,
    #[serde(default)]
    pub thresholds: ThresholdPolicy,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            timeout: default_timeout(),
            thresholds: Default::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ThresholdPolicy {
    /// Accept bare negative simple thresholds.
    #[serde(default)]
    pub allow_negative: bool,
    /// Fail when a warning or critical threshold is not given.
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Element {
    pub url: String,
    pub metrics: Vec<MetricSpec>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetricSpec {
    pub metric_name: String,
    pub labels: Option<HashMap<String, String>>,
    pub warning: Option<String>,
    pub critical: Option<String>,
    pub unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let cfg = parse_config_str("").unwrap();
        assert_eq!(cfg.plugin, PluginConfig::default());
        assert!(cfg.elements.is_empty());
        assert_eq!(cfg.plugin.timeout, Duration::from_secs(10));
        assert!(!cfg.plugin.thresholds.allow_negative);
    }

    #[test]
    fn metrics_without_thresholds() {
        let cfg = parse_config_str(
            r#"
            [[elements]]
            url = "http://localhost:9100/metrics"

            [[elements.metrics]]
            metric_name = "node_load1"
            critical = "@0:0.5"
            "#,
        )
        .unwrap();
        let metric = &cfg.elements[0].metrics[0];
        assert_eq!(metric.metric_name, "node_load1");
        assert_eq!(metric.warning, None);
        assert_eq!(metric.critical.as_deref(), Some("@0:0.5"));
        assert!(metric.labels.is_none());
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config_str("[plugin]\ntimeout = \"soon\"").is_err());
        assert!(parse_config_str("[[elements]]\nmetrics = []").is_err());
    }
}
