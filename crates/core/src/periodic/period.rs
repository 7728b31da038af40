//! Recurrence periods.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How often a periodic transaction recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Every day.
    Day,
    /// Every seven days.
    Week,
    /// Every calendar month.
    Month,
    /// Every calendar year.
    Year,
}

/// Error for an unknown period name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period: {0}")]
pub struct PeriodParseError(pub String);

impl Period {
    /// Returns the wire name of the period.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Moves `at` forward by one period.
    ///
    /// Month and year steps land on the last day of the target month when the
    /// source day does not exist there. Returns `None` past the end of the
    /// supported calendar.
    #[must_use]
    pub fn advance(self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => at.checked_add_signed(Duration::days(1)),
            Self::Week => at.checked_add_signed(Duration::weeks(1)),
            Self::Month => at.checked_add_months(Months::new(1)),
            Self::Year => at.checked_add_months(Months::new(12)),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(PeriodParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
