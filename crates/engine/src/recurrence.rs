//! Recurrence schedule arithmetic.
//!
//! A recurring transaction template carries a [`RecurringInterval`] and a
//! `next_recurring_date`; [`next_occurrence`] advances that date by one step.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// How often a recurring transaction fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl TryFrom<&str> for RecurringInterval {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidInterval(format!(
                "invalid recurring interval: {other}"
            ))),
        }
    }
}

/// Returns the occurrence one interval after `date`.
///
/// Dates are civil UTC dates; no timezone conversion happens here. Calendar
/// arithmetic clamps to the last existing day of the target month: Jan 31
/// plus one month lands on the last day of February, and a Feb 29 anchor
/// plus one year lands on Feb 28 when the target year is not a leap year.
pub fn next_occurrence(
    date: DateTime<Utc>,
    interval: RecurringInterval,
) -> ResultEngine<DateTime<Utc>> {
    let next = match interval {
        RecurringInterval::Daily => date.checked_add_signed(Duration::days(1)),
        RecurringInterval::Weekly => date.checked_add_signed(Duration::days(7)),
        RecurringInterval::Monthly => date.checked_add_months(Months::new(1)),
        RecurringInterval::Yearly => date.checked_add_months(Months::new(12)),
    };

    next.ok_or_else(|| {
        EngineError::Validation(format!("next occurrence after {date} is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn every_interval_strictly_increases_the_date() {
        let anchor = date(2026, 8, 15);
        for interval in [
            RecurringInterval::Daily,
            RecurringInterval::Weekly,
            RecurringInterval::Monthly,
            RecurringInterval::Yearly,
        ] {
            assert!(next_occurrence(anchor, interval).unwrap() > anchor);
        }
    }

    #[test]
    fn daily_and_weekly_add_calendar_days() {
        let anchor = date(2026, 8, 28);
        assert_eq!(
            next_occurrence(anchor, RecurringInterval::Daily).unwrap(),
            date(2026, 8, 29)
        );
        assert_eq!(
            next_occurrence(anchor, RecurringInterval::Weekly).unwrap(),
            date(2026, 9, 4)
        );
    }

    #[test]
    fn twelve_monthly_steps_match_one_yearly_step_mid_month() {
        let anchor = date(2026, 3, 15);
        let mut stepped = anchor;
        for _ in 0..12 {
            stepped = next_occurrence(stepped, RecurringInterval::Monthly).unwrap();
        }
        assert_eq!(
            stepped,
            next_occurrence(anchor, RecurringInterval::Yearly).unwrap()
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_short_months() {
        assert_eq!(
            next_occurrence(date(2026, 1, 31), RecurringInterval::Monthly).unwrap(),
            date(2026, 2, 28)
        );
        assert_eq!(
            next_occurrence(date(2024, 1, 31), RecurringInterval::Monthly).unwrap(),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn yearly_clamps_leap_day_anchors() {
        assert_eq!(
            next_occurrence(date(2024, 2, 29), RecurringInterval::Yearly).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn unknown_interval_string_is_rejected() {
        let err = RecurringInterval::try_from("FORTNIGHTLY").unwrap_err();
        assert!(matches!(err, EngineError::InvalidInterval(_)));
    }

    #[test]
    fn interval_round_trips_through_as_str() {
        for interval in [
            RecurringInterval::Daily,
            RecurringInterval::Weekly,
            RecurringInterval::Monthly,
            RecurringInterval::Yearly,
        ] {
            assert_eq!(
                RecurringInterval::try_from(interval.as_str()).unwrap(),
                interval
            );
        }
    }
}
