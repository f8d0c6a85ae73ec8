//! Check individual Prometheus-compatible endpoints against thresholds

use std::collections::HashMap;
use std::time::Duration;

use color_eyre::eyre::{eyre, Context, Report};
use prometheus_parse::{Sample, Value};
use reqwest::{IntoUrl, Url};
use tracing::debug;

use crate::{
    config_file::{self, PluginConfig},
    validate_thresholds, validate_units, PerfData, Status, StatusAggregator, Thresholds, Unit,
};

/// Selects samples of one metric and the thresholds they are held to.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFilter {
    pub metric_name: String,
    /// Every listed label must match exactly.
    pub labels: HashMap<String, String>,
    pub thresholds: Thresholds,
    pub unit: Option<Unit>,
}

impl MetricFilter {
    pub fn from_spec(spec: config_file::MetricSpec, config: &PluginConfig) -> Result<Self, Report> {
        let thresholds = validate_thresholds(
            Some(&spec.metric_name),
            spec.warning.as_deref(),
            spec.critical.as_deref(),
            config,
        )?;
        let unit = spec
            .unit
            .as_deref()
            .map(|u| validate_units(Some(u)))
            .transpose()?;
        Ok(Self {
            metric_name: spec.metric_name,
            labels: spec.labels.unwrap_or_default(),
            thresholds,
            unit,
        })
    }

    fn matches(&self, sample: &Sample) -> bool {
        sample.metric == self.metric_name
            && self
                .labels
                .iter()
                .all(|(k, v)| sample.labels.get(k) == Some(v.as_str()))
    }
}

/// One evaluated sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub label: String,
    pub value: f64,
    pub status: Status,
    pub thresholds: Thresholds,
    pub perfdata: PerfData,
}

/// Scrapes a single Prometheus endpoint and evaluates the configured metrics.
pub struct ElementCheck {
    /// the prometheus-exporting endpoint to query
    url: Url,
    client: reqwest::Client,
    filters: Vec<MetricFilter>,
}

impl ElementCheck {
    pub fn new(
        url: impl IntoUrl,
        filters: impl IntoIterator<Item = MetricFilter>,
        timeout: Duration,
    ) -> Result<Self, Report> {
        Ok(Self {
            url: url.into_url()?,
            client: reqwest::Client::builder().timeout(timeout).build()?,
            filters: filters.into_iter().collect(),
        })
    }

    pub fn from_config(element: config_file::Element, config: &PluginConfig) -> Result<Self, Report> {
        let filters = element
            .metrics
            .into_iter()
            .map(|m| MetricFilter::from_spec(m, config))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(element.url, filters, config.timeout)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn check(&self, status: &mut StatusAggregator) -> Result<Vec<Reading>, Report> {
        let scrape = self.collect_prometheus_metrics().await?;
        self.evaluate(&scrape, status)
    }

    async fn collect_prometheus_metrics(&self) -> Result<prometheus_parse::Scrape, Report> {
        let body = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .wrap_err("ElementCheck: Network request to get prometheus metrics endpoint")?
            .error_for_status()
            .wrap_err("ElementCheck: prometheus metrics endpoint returned an error status")?
            .text()
            .await
            .wrap_err("ElementCheck: Reading response from prometheus metrics endpoint")?;
        parse_scrape(&body)
    }

    /// Evaluate every filter against `scrape`. A filter matching no numeric
    /// sample is an error: the check cannot vouch for a metric it never saw.
    pub fn evaluate(
        &self,
        scrape: &prometheus_parse::Scrape,
        status: &mut StatusAggregator,
    ) -> Result<Vec<Reading>, Report> {
        let mut readings = Vec::new();
        for filter in &self.filters {
            let values: Vec<f64> = scrape
                .samples
                .iter()
                .filter(|s| filter.matches(s))
                .filter_map(|s| numeric_value(&s.value))
                .collect();
            if values.is_empty() {
                return Err(eyre!(
                    "metric {} not exposed by {}",
                    filter.metric_name,
                    self.url
                ));
            }

            for (i, value) in values.iter().copied().enumerate() {
                let label = if values.len() == 1 {
                    filter.metric_name.clone()
                } else {
                    format!("{}_{}", filter.metric_name, i)
                };
                let outcome = filter.thresholds.apply(value, status)?;
                debug!(metric = %label, value, status = %outcome, "evaluated sample");
                readings.push(Reading {
                    perfdata: PerfData::new(label.clone(), value)
                        .with_unit(filter.unit)
                        .with_thresholds(&filter.thresholds),
                    label,
                    value,
                    status: outcome,
                    thresholds: filter.thresholds.clone(),
                });
            }
        }
        Ok(readings)
    }
}

pub fn parse_scrape(body: &str) -> Result<prometheus_parse::Scrape, Report> {
    let lines = body.lines().map(|s| Ok(s.to_owned()));
    prometheus_parse::Scrape::parse(lines).wrap_err("parsing prometheus exposition format")
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Counter(num) | Value::Gauge(num) | Value::Untyped(num) if !num.is_nan() => {
            Some(*num)
        }
        _ => None,
    }
}
