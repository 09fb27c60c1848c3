// 📊 Daily time series - dense, gap-filled

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::range::DateWindow;

/// Activity for one calendar day. Both values are non-negative chart magnitudes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub income: i64,
    pub expenses: i64,
}

impl DailyActivity {
    pub fn empty(date: NaiveDate) -> Self {
        DailyActivity {
            date,
            income: 0,
            expenses: 0,
        }
    }
}

/// One entry per day of `window`, ascending. Days without activity are zeros;
/// entries outside the window are dropped. Length is always `window.len_days()`.
pub fn fill_missing_days(active: &[DailyActivity], window: &DateWindow) -> Vec<DailyActivity> {
    let by_date: HashMap<NaiveDate, &DailyActivity> =
        active.iter().map(|day| (day.date, day)).collect();

    window
        .days()
        .map(|date| match by_date.get(&date) {
            Some(day) => (*day).clone(),
            None => DailyActivity::empty(date),
        })
        .collect()
}
