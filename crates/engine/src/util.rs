//! Small date helpers shared by the ops modules.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};

use crate::{EngineError, ResultEngine};

/// Inclusive `[start, end]` bounds of the calendar month containing `now`.
pub(crate) fn month_bounds(now: DateTime<Utc>) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .ok_or_else(|| EngineError::Validation(format!("invalid month anchor: {now}")))?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_signed(Duration::seconds(1)))
        .ok_or_else(|| EngineError::Validation(format!("month end out of range: {now}")))?;
    Ok((start, end))
}

/// True when both timestamps fall in the same calendar (year, month).
pub(crate) fn is_same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_the_whole_month() {
        let now = Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap();
        let (start, end) = month_bounds(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 28, 23, 59, 59).unwrap());
    }

    #[test]
    fn same_month_ignores_day_and_time() {
        let a = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 8, 31, 23, 0, 0).unwrap();
        let c = Utc.with_ymd_and_hms(2025, 8, 15, 0, 0, 0).unwrap();
        assert!(is_same_month(a, b));
        assert!(!is_same_month(a, c));
    }
}
