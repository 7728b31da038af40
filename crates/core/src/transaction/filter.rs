//! Filters for listing an account's transactions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Income or expense, derived from the sign of the amount. Zero is neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Positive amounts.
    Income,
    /// Negative amounts.
    Expense,
}

impl FromStr for TransactionKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(FilterError::UnknownKind(other.to_string())),
        }
    }
}

/// Invalid filter input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// `type` is neither `income` nor `expense`.
    #[error("unknown transaction type: {0}")]
    UnknownKind(String),

    /// `date_from` is after `date_to`.
    #[error("date_from must not be after date_to")]
    InvertedRange,
}

/// Optional predicates for a transaction listing.
///
/// Only the predicates that are set narrow the result; an empty filter lists
/// every transaction of the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Inclusive lower bound on `occurred_at`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `occurred_at`.
    pub date_to: Option<DateTime<Utc>>,
    /// Income or expense only.
    pub kind: Option<TransactionKind>,
    /// Any of these categories.
    pub categories: Vec<String>,
    /// Only periodic (`true`) or only one-off (`false`) transactions.
    pub is_periodic: Option<bool>,
    /// Only transactions created by this user.
    pub user_id: Option<Uuid>,
}

impl TransactionFilter {
    /// Checks that the predicates are consistent.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvertedRange` if the date bounds are reversed.
    pub fn validate(&self) -> Result<(), FilterError> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) if from > to => Err(FilterError::InvertedRange),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("income".parse(), Ok(TransactionKind::Income));
        assert_eq!("expense".parse(), Ok(TransactionKind::Expense));
        assert_eq!(
            "refund".parse::<TransactionKind>(),
            Err(FilterError::UnknownKind("refund".to_string()))
        );
    }

    #[test]
    fn test_validate_date_range() {
        let now = Utc::now();
        let ok = TransactionFilter {
            date_from: Some(now - Duration::days(1)),
            date_to: Some(now),
            ..TransactionFilter::default()
        };
        let same_instant = TransactionFilter {
            date_from: Some(now),
            date_to: Some(now),
            ..TransactionFilter::default()
        };
        let inverted = TransactionFilter {
            date_from: Some(now),
            date_to: Some(now - Duration::days(1)),
            ..TransactionFilter::default()
        };

        assert_eq!(ok.validate(), Ok(()));
        assert_eq!(same_instant.validate(), Ok(()));
        assert_eq!(inverted.validate(), Err(FilterError::InvertedRange));
    }
}
