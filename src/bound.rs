//! Express bounds on metrics.

use std::fmt;

/// One side of a threshold range. Finite bounds are always closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(f64),
}

impl Bound {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Unbounded => None,
            Self::Inclusive(v) => Some(*v),
        }
    }

    /// Whether `value` lies on the admitted side of this bound used as a minimum.
    pub fn admits_as_lower(&self, value: f64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Inclusive(lower_bound) => value >= *lower_bound,
        }
    }

    /// Whether `value` lies on the admitted side of this bound used as a maximum.
    pub fn admits_as_upper(&self, value: f64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Inclusive(upper_bound) => value <= *upper_bound,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("~"),
            Self::Inclusive(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_admits_everything() {
        for v in [f64::NEG_INFINITY, -1e300, 0., 1e300, f64::INFINITY] {
            assert!(Bound::Unbounded.admits_as_lower(v));
            assert!(Bound::Unbounded.admits_as_upper(v));
        }
    }

    #[test]
    fn inclusive_endpoints_are_admitted() {
        let b = Bound::Inclusive(10.);
        assert!(b.admits_as_lower(10.));
        assert!(b.admits_as_upper(10.));
        assert!(!b.admits_as_lower(9.99));
        assert!(!b.admits_as_upper(10.01));
        assert_eq!(b.value(), Some(10.));
    }
}
