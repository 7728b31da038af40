//! Property-based tests for series expansion.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::{Period, expand};

fn period_strategy() -> impl Strategy<Value = Period> {
    prop_oneof![
        Just(Period::Day),
        Just(Period::Week),
        Just(Period::Month),
        Just(Period::Year),
    ]
}

/// Start dates between 1970 and roughly 2100.
fn start_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The series has exactly the requested length and starts at the template date.
    #[test]
    fn prop_length_and_first(
        first in start_strategy(),
        period in period_strategy(),
        length in 1usize..600,
    ) {
        let dates = expand(first, period, length).unwrap();

        prop_assert_eq!(dates.len(), length);
        prop_assert_eq!(dates[0], first);
    }

    /// Dates strictly increase.
    #[test]
    fn prop_strictly_increasing(
        first in start_strategy(),
        period in period_strategy(),
        length in 2usize..200,
    ) {
        let dates = expand(first, period, length).unwrap();

        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    /// Fixed-length periods advance by a constant step.
    #[test]
    fn prop_fixed_step(
        first in start_strategy(),
        weekly in any::<bool>(),
        length in 1usize..500,
    ) {
        let (period, step) = if weekly {
            (Period::Week, Duration::days(7))
        } else {
            (Period::Day, Duration::days(1))
        };
        let dates = expand(first, period, length).unwrap();

        for (i, date) in dates.iter().enumerate() {
            let i = i32::try_from(i).unwrap();
            prop_assert_eq!(*date, first + step * i);
        }
    }

    /// Monthly steps move exactly one calendar month and never raise the day.
    #[test]
    fn prop_monthly_calendar_step(
        first in start_strategy(),
        length in 2usize..60,
    ) {
        let dates = expand(first, Period::Month, length).unwrap();

        for pair in dates.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let prev_index = prev.year() * 12 + i32::try_from(prev.month()).unwrap();
            let next_index = next.year() * 12 + i32::try_from(next.month()).unwrap();

            prop_assert_eq!(next_index - prev_index, 1);
            prop_assert!(next.day() <= prev.day());
            prop_assert_eq!(next.time(), prev.time());
        }
    }
}
