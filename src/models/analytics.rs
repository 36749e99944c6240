use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Inclusive window over order creation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn day(date: NaiveDate) -> Self {
        Self::spanning(date, date)
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        let monday = date - Duration::days(offset);
        Self::spanning(monday, monday + Duration::days(6))
    }

    pub fn month_of(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let next_month = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        };
        let last = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(first);
        Self::spanning(first, last)
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::Validation(
                "end date must not be before start date".to_string(),
            ));
        }
        Ok(Self::spanning(start, end))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    fn spanning(first: NaiveDate, last: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        Self {
            start: Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&last.and_time(end_of_day)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub pending: usize,
    pub active: usize,
    pub complete: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSummary {
    pub window: DateWindow,
    pub total_earnings: f64,
    pub total_orders: usize,
    pub total_hours: i64,
    pub average_delivery_hours: f64,
    pub breakdown: StatusBreakdown,
}
