//! Helpers for writing Nagios-style check programs.
//!
//! Parse range expressions into [`Threshold`]s, evaluate measurements against
//! them, and fold the outcomes into one final [`Status`] with a
//! [`StatusAggregator`]:
//!
//! ```rust
//! use wtf_nagios_plugin::{Status, StatusAggregator, Threshold};
//!
//! let warning: Threshold = "10:20".parse().unwrap();
//! let mut status = StatusAggregator::new();
//! if warning.evaluate(25.) {
//!     status.escalate_warning();
//! }
//! assert_eq!(status.finish(), Status::Warning);
//! ```

pub mod bound;
pub mod cli;
pub mod config_file;
pub mod element;
pub mod error;
pub mod options;
pub mod perfdata;
pub mod plugin;
pub mod status;
pub mod threshold;

pub use bound::Bound;
pub use cli::ValueArgs;
pub use config_file::{parse_config, parse_config_str, Config, PluginConfig, ThresholdPolicy};
pub use element::{ElementCheck, MetricFilter, Reading};
pub use error::{CheckError, InvalidThresholdError};
pub use options::{
    register_thresholds, threshold_option_names, thresholds_from, validate_float, validate_int,
    validate_threshold, validate_thresholds, OptionSource, OptionSpec, Thresholds,
};
pub use perfdata::{validate_units, PerfData, Unit};
pub use plugin::{init_tracing, CheckContext, Outcome, Plugin, Runnable};
pub use status::{Status, StatusAggregator};
pub use threshold::{parse_threshold, Threshold, ThresholdOptions};
