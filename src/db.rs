// 🗄️ Storage - SQLite schema, row types and collaborator insert helpers
//
// accounts ──< transactions >── categories
//   owner_id       account_id (required)   category_id (optional)
//
// A transaction's effective owner is `accounts.owner_id` of the account it
// references. Accounts and categories are created by collaborator flows; the
// helpers below exist so those flows (and tests) can seed storage.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::identity::OwnerId;

// ============================================================================
// ROW TYPES
// ============================================================================

/// Ledger account. `owner_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub external_link_id: Option<String>,
}

/// Spending category (global, not owner-scoped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Ledger transaction
///
/// `amount` is in signed minor units: positive = income, negative = expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub account_id: String,
    pub category_id: Option<String>,
    pub payee: String,
    pub amount: i64,
    pub notes: Option<String>,
}

/// Mutable fields of a transaction, as supplied by the caller on create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub account_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub payee: String,
    pub amount: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Materialize into a row with the given identity
    pub fn into_transaction(self, id: String) -> Transaction {
        Transaction {
            id,
            date: self.date,
            account_id: self.account_id,
            category_id: self.category_id,
            payee: self.payee,
            amount: self.amount,
            notes: self.notes,
        }
    }
}

/// Proof of a physical delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedId {
    pub id: String,
}

/// Column list shared by every `SELECT` that maps through `transaction_from_row`.
/// Callers alias the transactions table as `t`.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "t.id, t.date, t.account_id, t.category_id, t.payee, t.amount, t.notes";

pub(crate) fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        payee: row.get(4)?,
        amount: row.get(5)?,
        notes: row.get(6)?,
    })
}

pub(crate) fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        external_link_id: row.get(3)?,
    })
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Open a file-backed database with WAL enabled and the schema in place.
pub fn open_database(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;

    // Enable WAL mode for crash recovery
    let journal_mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    setup_database(&conn)?;

    debug!(path = %path.display(), journal_mode = %journal_mode, "database opened");
    Ok(conn)
}

/// Idempotent schema setup. Also turns on foreign keys for this connection.
pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            external_link_id TEXT
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL
        );

        -- date is ISO yyyy-MM-dd so text order == calendar order
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY NOT NULL,
            date TEXT NOT NULL,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
            payee TEXT NOT NULL,
            amount INTEGER NOT NULL,
            notes TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts(owner_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);",
    )?;

    Ok(())
}

// ============================================================================
// COLLABORATOR HELPERS
// ============================================================================

/// Insert an account for `owner`. Used by the account-creation flow and tests.
pub fn insert_account(
    conn: &Connection,
    owner: &OwnerId,
    name: &str,
    external_link_id: Option<&str>,
) -> rusqlite::Result<Account> {
    let account = Account {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner.as_str().to_string(),
        name: name.to_string(),
        external_link_id: external_link_id.map(str::to_string),
    };

    conn.execute(
        "INSERT INTO accounts (id, owner_id, name, external_link_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            account.id,
            account.owner_id,
            account.name,
            account.external_link_id
        ],
    )?;

    Ok(account)
}

/// Insert a global category.
pub fn insert_category(conn: &Connection, name: &str) -> rusqlite::Result<Category> {
    let category = Category {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
    };

    conn.execute(
        "INSERT INTO categories (id, name) VALUES (?1, ?2)",
        params![category.id, category.name],
    )?;

    Ok(category)
}

pub fn category_exists(conn: &Connection, category_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM categories WHERE id = ?1",
            [category_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Unscoped row count. Storage diagnostics only; never exposed per owner.
pub fn count_transactions(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
}

/// Unscoped existence check, used by tests to prove a row survived.
pub fn transaction_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM transactions WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}
