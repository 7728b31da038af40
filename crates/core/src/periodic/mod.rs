//! Recurring transaction expansion.
//!
//! A periodic transaction is stored as a fixed-length series of ordinary rows.
//! This module computes the dates of that series; persistence happens in the
//! database layer inside a single unit of work.

mod period;

#[cfg(test)]
mod expand_props;

pub use period::{Period, PeriodParseError};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Number of rows materialized for one periodic transaction.
pub const DEFAULT_SERIES_LENGTH: usize = 500;

/// Errors raised while expanding a series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// A series must contain at least one row.
    #[error("series length must be at least 1")]
    EmptySeries,

    /// A date in the series is beyond the supported calendar range.
    #[error("series runs past the supported date range at index {index}")]
    OutOfRange {
        /// Index of the first date that could not be computed.
        index: usize,
    },
}

/// Computes `length` occurrence dates starting at `first`.
///
/// Each date is the previous one advanced by one `period`. Because month and
/// year steps clamp to the end of short months, a series started on the 31st
/// settles on an earlier day after the first short month.
///
/// # Errors
///
/// Returns `ExpandError::EmptySeries` when `length` is zero and
/// `ExpandError::OutOfRange` if the series leaves the representable range.
pub fn expand(
    first: DateTime<Utc>,
    period: Period,
    length: usize,
) -> Result<Vec<DateTime<Utc>>, ExpandError> {
    if length == 0 {
        return Err(ExpandError::EmptySeries);
    }

    let mut dates = Vec::with_capacity(length);
    let mut current = first;
    dates.push(current);

    for index in 1..length {
        current = period
            .advance(current)
            .ok_or(ExpandError::OutOfRange { index })?;
        dates.push(current);
    }

    Ok(dates)
}
