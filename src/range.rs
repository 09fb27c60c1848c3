// 📅 Date Range Resolution
//
// Optional `from`/`to` (ISO yyyy-MM-dd) → validated inclusive window, plus the
// immediately preceding window of identical length for period-over-period
// comparison.
//
//   previous.end   = start - 1 day
//   previous.start = previous.end - (end - start) days

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Length of the default trailing window, in days before today.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest window a caller may request; every day becomes a series entry.
pub const MAX_WINDOW_DAYS: i64 = 3660;

/// Inclusive `[start, end]` date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LedgerError::invalid_range(
                "from",
                format!("{} is after {}", start, end),
            ));
        }
        Ok(DateWindow { start, end })
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every calendar day in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len_days() as usize)
    }

    /// The window of identical length ending the day before this one starts.
    pub fn preceding(&self) -> Result<DateWindow> {
        let span = self.end - self.start;
        let previous_end = self
            .start
            .checked_sub_signed(Duration::days(1))
            .ok_or_else(|| LedgerError::invalid_range("from", "no room for a previous period"))?;
        let previous_start = previous_end
            .checked_sub_signed(span)
            .ok_or_else(|| LedgerError::invalid_range("from", "no room for a previous period"))?;

        Ok(DateWindow {
            start: previous_start,
            end: previous_end,
        })
    }
}

/// Current window and the comparison window that precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindows {
    pub current: DateWindow,
    pub previous: DateWindow,
}

/// Resolve against today's UTC date.
pub fn resolve(from: Option<&str>, to: Option<&str>) -> Result<PeriodWindows> {
    resolve_at(from, to, Utc::now().date_naive())
}

/// Resolve against an explicit "today". Each absent bound falls back to the
/// trailing default window independently.
pub fn resolve_at(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> Result<PeriodWindows> {
    let default_start = today
        .checked_sub_signed(Duration::days(DEFAULT_WINDOW_DAYS))
        .ok_or_else(|| LedgerError::invalid_range("from", "default window out of range"))?;

    let start = match non_blank(from) {
        Some(raw) => parse_bound("from", raw)?,
        None => default_start,
    };
    let end = match non_blank(to) {
        Some(raw) => parse_bound("to", raw)?,
        None => today,
    };

    let current = DateWindow::new(start, end)?;
    if current.len_days() > MAX_WINDOW_DAYS {
        return Err(LedgerError::invalid_range(
            "from",
            format!("window spans {} days, at most {} allowed", current.len_days(), MAX_WINDOW_DAYS),
        ));
    }
    let previous = current.preceding()?;

    Ok(PeriodWindows { current, previous })
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(field: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| LedgerError::invalid_range(field, format!("'{}' is not yyyy-MM-dd ({})", raw, e)))
}
