use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CfnError;

/// A span of time as written in configuration
///
/// Deserializes from `{ seconds: 30 }`, `{ minutes: 10 }` or `{ days: 30 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    Seconds(u64),
    Minutes(u64),
    Days(u64),
}

impl Duration {
    #[inline]
    #[must_use]
    pub const fn seconds(amount: u64) -> Self {
        Self::Seconds(amount)
    }

    #[inline]
    #[must_use]
    pub const fn minutes(amount: u64) -> Self {
        Self::Minutes(amount)
    }

    #[inline]
    #[must_use]
    pub const fn days(amount: u64) -> Self {
        Self::Days(amount)
    }

    /// Length in seconds
    ///
    /// # Errors
    /// Returns [`CfnError::DurationOverflow`] when the span does not fit in a `u64` of seconds
    pub fn to_seconds(self) -> Result<u64, CfnError> {
        let secs = match self {
            Self::Seconds(s) => Some(s),
            Self::Minutes(m) => m.checked_mul(60),
            Self::Days(d) => d.checked_mul(86_400),
        };
        secs.ok_or_else(|| CfnError::DurationOverflow(self.to_string()))
    }

    /// Whole days
    ///
    /// # Errors
    /// - [`CfnError::DurationOverflow`] when the span does not fit in seconds
    /// - [`CfnError::FractionalDuration`] unless the span is a whole number of days
    pub fn to_days(self) -> Result<u64, CfnError> {
        let secs = self.to_seconds()?;
        if secs % 86_400 != 0 {
            return Err(CfnError::FractionalDuration {
                duration: self.to_string(),
                unit: "days",
            });
        }
        Ok(secs / 86_400)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{s}s"),
            Self::Minutes(m) => write!(f, "{m}m"),
            Self::Days(d) => write!(f, "{d}d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Duration::minutes(10).to_seconds().unwrap(), 600);
        assert_eq!(Duration::days(30).to_days().unwrap(), 30);
        assert_eq!(Duration::seconds(172_800).to_days().unwrap(), 2);
        assert!(Duration::minutes(90).to_days().is_err());
    }

    #[test]
    fn oversized_spans_overflow() {
        let huge = Duration::days(u64::MAX / 1000);
        assert!(matches!(huge.to_seconds(), Err(CfnError::DurationOverflow(_))));
        assert!(matches!(huge.to_days(), Err(CfnError::DurationOverflow(_))));
        assert!(Duration::minutes(u64::MAX).to_seconds().is_err());
        assert_eq!(Duration::seconds(u64::MAX).to_seconds().unwrap(), u64::MAX);
    }

    #[test]
    fn deserializes_from_unit_map() {
        let d: Duration = serde_json::from_str(r#"{"days": 30}"#).unwrap();
        assert_eq!(d, Duration::days(30));
    }
}
