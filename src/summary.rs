// 📋 Summary - period-over-period dashboard data for one owner
//
// range → two windows → totals for each → percent deltas
//                     → category rollup + gap-filled days for the current window

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{category_spend, daily_activity, period_totals};
use crate::change::percent_change;
use crate::error::Result;
use crate::identity::OwnerId;
use crate::range::resolve_at;
use crate::rollup::{rollup_categories, CategorySpend};
use crate::scope::OwnerScope;
use crate::timeseries::{fill_missing_days, DailyActivity};

/// Optional narrowing for a summary. Dates are ISO `yyyy-MM-dd`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub remaining_amount: i64,
    pub remaining_change: f64,
    pub income_amount: i64,
    pub income_change: f64,
    pub expenses_amount: i64,
    pub expenses_change: f64,
    pub categories: Vec<CategorySpend>,
    pub days: Vec<DailyActivity>,
}

pub fn summarize(conn: &Connection, owner: &OwnerId, request: &SummaryRequest) -> Result<Summary> {
    summarize_at(conn, owner, request, Utc::now().date_naive())
}

/// Same as `summarize` with "today" pinned, for the default window.
pub fn summarize_at(
    conn: &Connection,
    owner: &OwnerId,
    request: &SummaryRequest,
    today: NaiveDate,
) -> Result<Summary> {
    let windows = resolve_at(request.from.as_deref(), request.to.as_deref(), today)?;
    let account_id = request.account_id.as_deref();
    let scope = OwnerScope::new(conn, owner);

    // The two windows are independent; order does not matter.
    let current = period_totals(&scope, &windows.current, account_id)?;
    let previous = period_totals(&scope, &windows.previous, account_id)?;

    let categories = rollup_categories(category_spend(&scope, &windows.current, account_id)?);
    let active_days = daily_activity(&scope, &windows.current, account_id)?;
    let days = fill_missing_days(&active_days, &windows.current);

    debug!(
        owner = %owner,
        start = %windows.current.start,
        end = %windows.current.end,
        categories = categories.len(),
        active_days = active_days.len(),
        "summary built"
    );

    Ok(Summary {
        remaining_amount: current.remaining,
        remaining_change: percent_change(current.remaining, previous.remaining),
        income_amount: current.income,
        income_change: percent_change(current.income, previous.income),
        expenses_amount: current.expenses,
        expenses_change: percent_change(current.expenses, previous.expenses),
        categories,
        days,
    })
}
