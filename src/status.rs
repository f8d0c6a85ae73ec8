//! Check status vocabulary and the escalate-only status machine.

use std::fmt;
use std::str::FromStr;

use tracing::{trace, warn};

use crate::{CheckError, Threshold};

/// Outward status of a check program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
    /// Part of the exit code vocabulary, never produced by [`StatusAggregator`].
    Dependent,
}

impl Status {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
            Self::Dependent => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
            Self::Dependent => "DEPENDENT",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Ok(Self::Ok),
            "warning" | "warn" => Ok(Self::Warning),
            "critical" | "crit" => Ok(Self::Critical),
            "unknown" => Ok(Self::Unknown),
            "dependent" => Ok(Self::Dependent),
            other => Err(CheckError::Usage(format!("unexpected status '{}'", other))),
        }
    }
}

/// Worst status observed during one check run.
///
/// Starts at UNKNOWN. `escalate_*` calls only ever move towards a worse
/// outcome; only [`StatusAggregator::set_ok`] may establish OK, and only
/// before anything degraded the run.
#[derive(Debug)]
pub struct StatusAggregator {
    current: Status,
}

impl Default for StatusAggregator {
    fn default() -> Self {
        Self {
            current: Status::Unknown,
        }
    }
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_status(&self) -> Status {
        self.current
    }

    /// Read the final status, ending the run.
    pub fn finish(self) -> Status {
        self.current
    }

    pub fn escalate_warning(&mut self) {
        if self.current != Status::Critical {
            self.transition(Status::Warning);
        }
    }

    pub fn escalate_critical(&mut self) {
        self.transition(Status::Critical);
    }

    /// Never changes the status: UNKNOWN is only ever the initial state, and
    /// every other state already carries more information.
    pub fn escalate_unknown(&mut self) {
        trace!(status = %self.current, "unknown escalation leaves status unchanged");
    }

    /// Record confirmed success. Ignored once the run has degraded.
    pub fn set_ok(&mut self) {
        match self.current {
            Status::Unknown | Status::Ok => self.transition(Status::Ok),
            degraded => warn!(status = %degraded, "ignoring ok() after status already degraded"),
        }
    }

    /// Dispatch to the matching transition. DEPENDENT is not part of the machine.
    pub fn escalate(&mut self, status: Status) {
        match status {
            Status::Ok => self.set_ok(),
            Status::Warning => self.escalate_warning(),
            Status::Critical => self.escalate_critical(),
            Status::Unknown | Status::Dependent => self.escalate_unknown(),
        }
    }

    /// Evaluate `value` against `threshold`, escalating per the threshold's
    /// name on breach. Returns whether it was breached.
    pub fn observe(&mut self, threshold: &Threshold, value: f64) -> Result<bool, CheckError> {
        let breached = threshold.check(value)?;
        if breached {
            self.escalate(threshold.escalation());
        }
        Ok(breached)
    }

    pub fn is_ok(&self) -> bool {
        self.current == Status::Ok
    }

    pub fn is_warning(&self) -> bool {
        self.current == Status::Warning
    }

    pub fn is_critical(&self) -> bool {
        self.current == Status::Critical
    }

    pub fn is_unknown(&self) -> bool {
        self.current == Status::Unknown
    }

    fn transition(&mut self, next: Status) {
        trace!(from = %self.current, to = %next, "status transition");
        self.current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_threshold, ThresholdOptions};

    #[test]
    fn starts_unknown() {
        assert_eq!(StatusAggregator::new().finish(), Status::Unknown);
    }

    #[test]
    fn critical_wins_over_later_warning() {
        let mut s = StatusAggregator::new();
        s.escalate_warning();
        assert!(s.is_warning());
        s.escalate_critical();
        s.escalate_warning();
        assert_eq!(s.finish(), Status::Critical);
    }

    #[test]
    fn unknown_is_noop_from_ok() {
        let mut s = StatusAggregator::new();
        s.set_ok();
        s.escalate_unknown();
        assert_eq!(s.finish(), Status::Ok);
    }

    #[test]
    fn transition_table() {
        type Event = fn(&mut StatusAggregator);
        let events: [(&str, Event); 4] = [
            ("warn", StatusAggregator::escalate_warning),
            ("crit", StatusAggregator::escalate_critical),
            ("unknown", StatusAggregator::escalate_unknown),
            ("ok", StatusAggregator::set_ok),
        ];
        use Status::*;
        let table = [
            (Ok, [Warning, Critical, Ok, Ok]),
            (Warning, [Warning, Critical, Warning, Warning]),
            (Critical, [Critical, Critical, Critical, Critical]),
            (Unknown, [Warning, Critical, Unknown, Ok]),
        ];
        for (start, expected) in table {
            for ((event_name, event), want) in events.iter().zip(expected) {
                let mut s = StatusAggregator::new();
                match start {
                    Ok => s.set_ok(),
                    Warning => s.escalate_warning(),
                    Critical => s.escalate_critical(),
                    _ => {}
                }
                assert_eq!(s.current_status(), start);
                event(&mut s);
                assert_eq!(s.current_status(), want, "{} from {}", event_name, start);
            }
        }
    }

    #[test]
    fn observe_escalates_by_threshold_name() {
        let warning =
            parse_threshold(Some("10"), &ThresholdOptions::new("warning")).unwrap();
        let critical =
            parse_threshold(Some("20"), &ThresholdOptions::new("critical")).unwrap();

        let mut s = StatusAggregator::new();
        assert!(!s.observe(&critical, 15.).unwrap());
        assert!(s.observe(&warning, 15.).unwrap());
        assert!(s.is_warning());
        assert!(s.observe(&critical, 25.).unwrap());
        assert!(s.is_critical());
        assert!(s.observe(&warning, f64::NAN).is_err());
    }

    #[test]
    fn status_words_and_codes() {
        assert_eq!("warn".parse::<Status>().unwrap(), Status::Warning);
        assert_eq!("CRITICAL".parse::<Status>().unwrap(), Status::Critical);
        assert!("fine".parse::<Status>().is_err());
        let codes: Vec<i32> = [
            Status::Ok,
            Status::Warning,
            Status::Critical,
            Status::Unknown,
            Status::Dependent,
        ]
        .iter()
        .map(Status::exit_code)
        .collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
        assert_eq!(Status::Unknown.to_string(), "UNKNOWN");
    }
}
