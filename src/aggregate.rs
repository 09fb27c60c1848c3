// 🧮 Period Aggregation - owner-scoped sums over a window
//
// All three queries go through `OwnerScope`, so a row is only counted when
// its account belongs to the requesting owner. Read-only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::range::DateWindow;
use crate::rollup::CategorySpend;
use crate::scope::{OwnerScope, TransactionFilter};
use crate::timeseries::DailyActivity;

/// Totals for one window, in minor units.
///
/// `expenses` keeps its sign (≤ 0). A zero amount lands in neither income nor
/// expenses but still counts toward `remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub income: i64,
    pub expenses: i64,
    pub remaining: i64,
}

pub fn period_totals(
    scope: &OwnerScope<'_>,
    window: &DateWindow,
    account_id: Option<&str>,
) -> Result<PeriodTotals> {
    let query = scope.query(
        "COALESCE(SUM(CASE WHEN t.amount > 0 THEN t.amount ELSE 0 END), 0), \
         COALESCE(SUM(CASE WHEN t.amount < 0 THEN t.amount ELSE 0 END), 0), \
         COALESCE(SUM(t.amount), 0)",
        "",
        &TransactionFilter::window(window, account_id),
        "",
    );

    let totals = query.fetch_one(scope.conn(), |row| {
        Ok(PeriodTotals {
            income: row.get(0)?,
            expenses: row.get(1)?,
            remaining: row.get(2)?,
        })
    })?;

    debug!(
        owner = %scope.owner(),
        start = %window.start,
        end = %window.end,
        ?totals,
        "period totals"
    );
    Ok(totals)
}

/// Expense spend per category, largest first. Uncategorized expenses are
/// left out; ties fall back to name order so the ranking is stable.
pub fn category_spend(
    scope: &OwnerScope<'_>,
    window: &DateWindow,
    account_id: Option<&str>,
) -> Result<Vec<CategorySpend>> {
    let filter = TransactionFilter {
        expenses_only: true,
        ..TransactionFilter::window(window, account_id)
    };
    let query = scope.query(
        "c.name, SUM(ABS(t.amount)) AS spend",
        "INNER JOIN categories c ON c.id = t.category_id",
        &filter,
        "GROUP BY c.name ORDER BY spend DESC, c.name ASC",
    );

    let spends = query.fetch_all(scope.conn(), |row| {
        Ok(CategorySpend {
            name: row.get(0)?,
            value: row.get(1)?,
        })
    })?;
    Ok(spends)
}

/// Sparse per-day income and expense magnitudes, ascending by date.
pub fn daily_activity(
    scope: &OwnerScope<'_>,
    window: &DateWindow,
    account_id: Option<&str>,
) -> Result<Vec<DailyActivity>> {
    let query = scope.query(
        "t.date, \
         SUM(CASE WHEN t.amount > 0 THEN t.amount ELSE 0 END), \
         SUM(CASE WHEN t.amount < 0 THEN ABS(t.amount) ELSE 0 END)",
        "",
        &TransactionFilter::window(window, account_id),
        "GROUP BY t.date ORDER BY t.date ASC",
    );

    let days = query.fetch_all(scope.conn(), |row| {
        Ok(DailyActivity {
            date: row.get(0)?,
            income: row.get(1)?,
            expenses: row.get(2)?,
        })
    })?;
    Ok(days)
}
