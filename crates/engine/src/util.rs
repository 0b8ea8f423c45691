//! Internal helpers for input validation and date handling.
//!
//! Apart from [`DateRange`] these utilities are **not** part of the public
//! API. They centralize validation so every operation enforces the same
//! rules.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{EngineError, ResultEngine};

/// Trim a required text field and reject it when empty.
pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank values become `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Quantities moved by the ledger are strictly positive.
pub(crate) fn ensure_positive_quantity(quantity: i64) -> ResultEngine<()> {
    if quantity <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "quantity must be > 0, got {quantity}"
        )));
    }
    Ok(())
}

/// `LIKE` pattern matching `keyword` anywhere in a column.
pub(crate) fn like_pattern(keyword: &str) -> String {
    format!("%{}%", keyword.trim())
}

/// Midnight UTC of `date`.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Inclusive range of calendar days (UTC). Missing bounds are open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)`.
    pub(crate) fn bounds(&self) -> ResultEngine<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            return Err(EngineError::InvalidAmount(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        let lower = self.start.map(day_start);
        let upper = match self.end {
            Some(end) => Some(day_start(end.succ_opt().ok_or_else(|| {
                EngineError::InvalidAmount(format!("end_date out of range: {end}"))
            })?)),
            None => None,
        };
        Ok((lower, upper))
    }
}
