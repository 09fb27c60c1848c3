// 🔎 Owner-scoped reads - transaction listing, single lookup, account listing

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{account_from_row, transaction_from_row, Account, Transaction, TRANSACTION_COLUMNS};
use crate::error::{LedgerError, Result};
use crate::identity::OwnerId;
use crate::range::resolve_at;
use crate::scope::{OwnerScope, TransactionFilter};

/// Listing filter; same date defaults as the summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub account_id: Option<String>,
}

/// A transaction joined with its account and (optional) category names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub payee: String,
    pub amount: i64,
    pub notes: Option<String>,
    pub account: String,
    pub account_id: String,
}

pub fn list_transactions(
    conn: &Connection,
    owner: &OwnerId,
    query: &TransactionQuery,
) -> Result<Vec<TransactionView>> {
    list_transactions_at(conn, owner, query, Utc::now().date_naive())
}

/// Newest first; ties broken by id so paging stays stable.
pub fn list_transactions_at(
    conn: &Connection,
    owner: &OwnerId,
    query: &TransactionQuery,
    today: NaiveDate,
) -> Result<Vec<TransactionView>> {
    let windows = resolve_at(query.from.as_deref(), query.to.as_deref(), today)?;
    let scope = OwnerScope::new(conn, owner);

    let scoped = scope.query(
        "t.id, t.date, c.name, t.category_id, t.payee, t.amount, t.notes, a.name, t.account_id",
        "LEFT JOIN categories c ON c.id = t.category_id",
        &TransactionFilter::window(&windows.current, query.account_id.as_deref()),
        "ORDER BY t.date DESC, t.id ASC",
    );

    let rows = scoped.fetch_all(conn, |row| {
        Ok(TransactionView {
            id: row.get(0)?,
            date: row.get(1)?,
            category: row.get(2)?,
            category_id: row.get(3)?,
            payee: row.get(4)?,
            amount: row.get(5)?,
            notes: row.get(6)?,
            account: row.get(7)?,
            account_id: row.get(8)?,
        })
    })?;

    debug!(owner = %owner, count = rows.len(), "transactions listed");
    Ok(rows)
}

/// One owned transaction. Missing and foreign rows are both `NotFound`.
pub fn get_transaction(conn: &Connection, owner: &OwnerId, id: &str) -> Result<Transaction> {
    let ids = [id.to_string()];
    let scoped = OwnerScope::new(conn, owner).query(
        TRANSACTION_COLUMNS,
        "",
        &TransactionFilter::ids(&ids),
        "",
    );

    scoped
        .fetch_optional(conn, transaction_from_row)?
        .ok_or(LedgerError::NotFound)
}

/// Accounts belonging to `owner`, by name.
pub fn list_accounts(conn: &Connection, owner: &OwnerId) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, external_link_id
         FROM accounts
         WHERE owner_id = ?1
         ORDER BY name ASC, id ASC",
    )?;

    let accounts = stmt
        .query_map([owner.as_str()], account_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(accounts)
}
