//! Nagios range expressions.
//!
//! ```text
//! threshold := ["@"] simple | ["@"] range
//! simple    := number                 ; [0, number]
//! range     := [number] ":" [number]  ; omitted side is unbounded
//! number    := ["-"] digits ["." digits]
//! ```
//!
//! A threshold is breached when the value falls outside the closed range, or
//! inside it when the expression starts with `@`.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::{Bound, InvalidThresholdError, Status};

/// How a threshold expression should be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdOptions {
    /// Logical label, e.g. "warning" or "disk-critical".
    pub name: String,
    /// An absent or empty expression yields a threshold that is never breached.
    pub optional: bool,
    /// Accept a bare negative number `N`, read as the range `[N, 0]`.
    pub allow_negative: bool,
}

impl ThresholdOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            allow_negative: false,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn allow_negative(mut self, allow_negative: bool) -> Self {
        self.allow_negative = allow_negative;
        self
    }
}

impl Default for ThresholdOptions {
    fn default() -> Self {
        Self::new("threshold")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    lower: Bound,
    upper: Bound,
    inverted: bool,
}

impl Range {
    fn contains(&self, value: f64) -> bool {
        self.lower.admits_as_lower(value) && self.upper.admits_as_upper(value)
    }
}

/// A parsed alerting boundary. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    name: String,
    raw: String,
    /// `None` for an unset optional threshold.
    range: Option<Range>,
}

/// Parse `expression` according to `options`.
pub fn parse_threshold(
    expression: Option<&str>,
    options: &ThresholdOptions,
) -> Result<Threshold, InvalidThresholdError> {
    let raw = expression.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        if options.optional {
            debug!(threshold = %options.name, "optional threshold not set");
            return Ok(Threshold {
                name: options.name.clone(),
                raw: String::new(),
                range: None,
            });
        }
        return Err(InvalidThresholdError::new(raw, "threshold not defined"));
    }

    let range = parse_range(raw, options.allow_negative)
        .map_err(|reason| InvalidThresholdError::new(raw, reason))?;
    debug!(
        threshold = %options.name,
        expression = raw,
        lower = %range.lower,
        upper = %range.upper,
        inverted = range.inverted,
        "parsed threshold"
    );
    Ok(Threshold {
        name: options.name.clone(),
        raw: raw.to_owned(),
        range: Some(range),
    })
}

fn parse_range(raw: &str, allow_negative: bool) -> Result<Range, String> {
    if raw.chars().any(char::is_whitespace) {
        return Err("whitespace is not allowed inside a threshold".to_owned());
    }

    let (inverted, body) = match raw.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if body.is_empty() {
        return Err("missing range after '@'".to_owned());
    }

    let (lower, upper) = match body.split_once(':') {
        None => {
            let n = parse_number(body)?;
            if n < 0. {
                if !allow_negative {
                    return Err(format!(
                        "negative simple threshold {} is not permitted, use a range such as '{}:'",
                        body, body
                    ));
                }
                (Bound::Inclusive(n), Bound::Inclusive(0.))
            } else {
                (Bound::Inclusive(0.), Bound::Inclusive(n))
            }
        }
        Some((lo, hi)) => {
            if hi.contains(':') {
                return Err("more than one ':' in range".to_owned());
            }
            if lo.is_empty() && hi.is_empty() {
                return Err("range needs at least one bound around ':'".to_owned());
            }
            let lower = match lo {
                "" => Bound::Unbounded,
                lo => Bound::Inclusive(parse_number(lo)?),
            };
            let upper = match hi {
                "" => Bound::Unbounded,
                hi => Bound::Inclusive(parse_number(hi)?),
            };
            (lower, upper)
        }
    };

    if let (Some(lo), Some(hi)) = (lower.value(), upper.value()) {
        if lo > hi {
            return Err(format!("lower bound {} exceeds upper bound {}", lo, hi));
        }
    }

    Ok(Range {
        lower,
        upper,
        inverted,
    })
}

/// `["-"] digits ["." digits]`. Rejects forms `f64::from_str` would accept
/// such as `+1`, `1e3`, `.5` or `inf`.
fn parse_number(text: &str) -> Result<f64, String> {
    let non_numeric = || format!("'{}' is not a number", text);
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || frac_part.is_some_and(|f| !all_digits(f)) {
        return Err(non_numeric());
    }
    let value = text.parse::<f64>().map_err(|_| non_numeric())?;
    if !value.is_finite() {
        return Err(format!("'{}' is out of range", text));
    }
    Ok(value)
}

impl Threshold {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The trimmed expression this threshold was parsed from; empty when unset.
    pub fn raw_expression(&self) -> &str {
        &self.raw
    }

    /// Unset optional thresholds are never breached.
    pub fn is_optional(&self) -> bool {
        self.range.is_none()
    }

    pub fn lower_bound(&self) -> Bound {
        self.range.map_or(Bound::Unbounded, |r| r.lower)
    }

    pub fn upper_bound(&self) -> Bound {
        self.range.map_or(Bound::Unbounded, |r| r.upper)
    }

    /// Finite bounds are closed in this grammar.
    pub fn lower_inclusive(&self) -> bool {
        true
    }

    pub fn upper_inclusive(&self) -> bool {
        true
    }

    /// True when the threshold alerts on values inside the range.
    pub fn is_inverted(&self) -> bool {
        self.range.is_some_and(|r| r.inverted)
    }

    /// Whether `value` breaches this threshold.
    ///
    /// `value` must not be NaN; validate measurements with
    /// [`Threshold::check`] or [`crate::validate_float`] first.
    pub fn evaluate(&self, value: f64) -> bool {
        match self.range {
            None => false,
            Some(range) => range.contains(value) == range.inverted,
        }
    }

    /// Like [`Threshold::evaluate`], but rejects NaN as a caller error.
    pub fn check(&self, value: f64) -> Result<bool, crate::CheckError> {
        if value.is_nan() {
            return Err(crate::CheckError::Coding(format!(
                "NaN passed for evaluation against threshold '{}'",
                self.name
            )));
        }
        Ok(self.evaluate(value))
    }

    /// Status a breach of this threshold escalates to: names containing
    /// "warning" escalate to WARNING, all others to CRITICAL.
    pub fn escalation(&self) -> Status {
        if self.name.to_lowercase().contains("warning") {
            Status::Warning
        } else {
            Status::Critical
        }
    }
}

impl FromStr for Threshold {
    type Err = InvalidThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_threshold(Some(s), &ThresholdOptions::default())
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn parse(expr: &str) -> Threshold {
        expr.parse().unwrap()
    }

    fn reason(expr: &str, options: &ThresholdOptions) -> String {
        parse_threshold(Some(expr), options).unwrap_err().reason
    }

    #[test]
    fn closed_range_breaches_outside_only() {
        let t = parse("10:20");
        for v in [-1., 0., 9., 9.999, 20.001, 21., 1e9] {
            assert!(t.evaluate(v), "{} should breach 10:20", v);
        }
        for v in [10., 10.5, 15., 19.999, 20.] {
            assert!(!t.evaluate(v), "{} should not breach 10:20", v);
        }
    }

    #[test]
    fn inverted_range_is_complement() {
        let plain = parse("10:20");
        let inverted = parse("@10:20");
        assert!(inverted.is_inverted());
        for v in [-5., 9.9, 10., 12., 20., 20.1, 100.] {
            assert_eq!(inverted.evaluate(v), !plain.evaluate(v), "value {}", v);
        }
    }

    #[test]
    fn simple_threshold_spans_zero_to_n() {
        let t = parse("5");
        assert_eq!(t.lower_bound(), Bound::Inclusive(0.));
        assert_eq!(t.upper_bound(), Bound::Inclusive(5.));
        assert!(t.lower_inclusive() && t.upper_inclusive());
        assert!(!t.evaluate(0.));
        assert!(!t.evaluate(5.));
        assert!(t.evaluate(5.1));
        assert!(t.evaluate(-0.1));
    }

    #[test]
    fn open_ended_ranges() {
        let t = parse(":20");
        assert_eq!(t.lower_bound(), Bound::Unbounded);
        assert!(t.evaluate(25.));
        assert!(!t.evaluate(-5.));
        assert!(!t.evaluate(f64::NEG_INFINITY));

        let t = parse("10:");
        assert_eq!(t.upper_bound(), Bound::Unbounded);
        assert!(t.evaluate(9.));
        assert!(!t.evaluate(f64::INFINITY));
    }

    #[test]
    fn negative_bounds_in_ranges() {
        let t = parse("-10:-2.5");
        assert!(!t.evaluate(-10.));
        assert!(!t.evaluate(-2.5));
        assert!(t.evaluate(0.));
    }

    #[test]
    fn lower_above_upper_is_rejected() {
        let err = "20:10".parse::<Threshold>().unwrap_err();
        assert_eq!(err.raw, "20:10");
        assert!(err.reason.contains("exceeds"));
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        let opts = ThresholdOptions::default();
        for expr in [
            ":", "@", "@:", "1:2:3", "abc", "1..2", "+5", "1e3", ".5", "5.", "inf", "1 :2",
            "@@5", "--1",
        ] {
            assert_matches!(
                parse_threshold(Some(expr), &opts),
                Err(InvalidThresholdError { .. }),
                "{:?} should be rejected",
                expr
            );
        }
        assert!(reason("1:2:3", &opts).contains("more than one"));
        assert!(reason("1 :2", &opts).contains("whitespace"));

        let huge = "9".repeat(400);
        for expr in [huge.clone(), format!("{}:{}", huge, huge), format!(":-{}", huge)] {
            assert!(
                reason(&expr, &opts).contains("out of range"),
                "{} digits should not become infinite",
                expr.len()
            );
        }
    }

    #[test]
    fn empty_expression_depends_on_optional() {
        let required = ThresholdOptions::new("critical");
        assert_matches!(parse_threshold(Some(""), &required), Err(_));
        assert_matches!(parse_threshold(None, &required), Err(_));
        assert_matches!(parse_threshold(Some("   "), &required), Err(_));

        let optional = ThresholdOptions::new("critical").optional(true);
        let t = parse_threshold(None, &optional).unwrap();
        assert!(t.is_optional());
        assert_eq!(t.raw_expression(), "");
        for v in [f64::NEG_INFINITY, -1., 0., 1e12, f64::INFINITY] {
            assert!(!t.evaluate(v));
        }
    }

    #[test]
    fn negative_simple_threshold() {
        let opts = ThresholdOptions::default();
        assert!(reason("-5", &opts).contains("not permitted"));

        let t = parse_threshold(Some("-5"), &opts.allow_negative(true)).unwrap();
        assert_eq!(t.lower_bound(), Bound::Inclusive(-5.));
        assert_eq!(t.upper_bound(), Bound::Inclusive(0.));
        assert!(!t.evaluate(-3.));
        assert!(t.evaluate(1.));
        assert!(t.evaluate(-6.));
    }

    #[test]
    fn raw_expression_is_trimmed_input() {
        for expr in ["10:20", "@10:20", "5", ":20", "10:", "@-1.5:3.25", "007"] {
            let padded = format!("  {}\t", expr);
            let t: Threshold = padded.parse().unwrap();
            assert_eq!(t.raw_expression(), expr);
            assert_eq!(t.to_string(), expr);
        }
    }

    #[test]
    fn nan_is_a_caller_error() {
        let t = parse("10");
        assert_matches!(t.check(f64::NAN), Err(crate::CheckError::Coding(_)));
        assert_matches!(t.check(11.), Ok(true));
    }

    #[test]
    fn escalation_follows_name() {
        let opts = |name: &str| ThresholdOptions::new(name);
        let warn = parse_threshold(Some("1"), &opts("disk-warning")).unwrap();
        let crit = parse_threshold(Some("1"), &opts("disk-critical")).unwrap();
        assert_eq!(warn.escalation(), Status::Warning);
        assert_eq!(crit.escalation(), Status::Critical);
    }
}
