// 🔒 Owner Scope - authorization-scoped query building
//
// Every statement built here starts from
//
//   FROM transactions t
//   INNER JOIN accounts a ON a.id = t.account_id
//   WHERE a.owner_id = ?
//
// and only then narrows further. There is no way to build a transaction query
// through this type without the ownership join; caller-supplied identifiers
// are only ever used to narrow an already owner-scoped set.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::identity::OwnerId;
use crate::range::{DateWindow, DATE_FORMAT};

/// Upper bound on bound variables per `IN (...)` list.
const MAX_IDS_PER_STATEMENT: usize = 500;

/// Optional narrowing applied on top of the ownership predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter<'f> {
    pub window: Option<&'f DateWindow>,
    pub account_id: Option<&'f str>,
    pub ids: Option<&'f [String]>,
    /// Only rows with `amount < 0`
    pub expenses_only: bool,
}

impl<'f> TransactionFilter<'f> {
    pub fn window(window: &'f DateWindow, account_id: Option<&'f str>) -> Self {
        TransactionFilter {
            window: Some(window),
            account_id,
            ..Default::default()
        }
    }

    pub fn ids(ids: &'f [String]) -> Self {
        TransactionFilter {
            ids: Some(ids),
            ..Default::default()
        }
    }
}

/// A fully rendered statement plus its positional parameters.
#[derive(Debug, Clone)]
pub struct ScopedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl ScopedQuery {
    pub fn fetch_all<T, F>(&self, conn: &Connection, map: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = conn.prepare(&self.sql)?;
        let rows = stmt
            .query_map(params_from_iter(self.params.iter()), map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn fetch_one<T, F>(&self, conn: &Connection, map: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), map)
    }

    pub fn fetch_optional<T, F>(&self, conn: &Connection, map: F) -> rusqlite::Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), map)
            .optional()
    }
}

/// Read access to storage on behalf of exactly one owner.
///
/// Borrowing a `rusqlite::Transaction` works too (it derefs to `Connection`),
/// which is how mutations keep the scope check inside their unit of work.
pub struct OwnerScope<'a> {
    conn: &'a Connection,
    owner: &'a OwnerId,
}

impl<'a> OwnerScope<'a> {
    pub fn new(conn: &'a Connection, owner: &'a OwnerId) -> Self {
        OwnerScope { conn, owner }
    }

    pub fn owner(&self) -> &OwnerId {
        self.owner
    }

    pub fn conn(&self) -> &Connection {
        self.conn
    }

    /// Build `SELECT <select> FROM transactions t JOIN accounts a <joins>
    /// WHERE a.owner_id = ? <filter> <tail>`.
    pub fn query(
        &self,
        select: &str,
        joins: &str,
        filter: &TransactionFilter<'_>,
        tail: &str,
    ) -> ScopedQuery {
        let mut sql = format!(
            "SELECT {select} FROM transactions t \
             INNER JOIN accounts a ON a.id = t.account_id {joins} \
             WHERE a.owner_id = ?"
        );
        let mut params = vec![Value::Text(self.owner.as_str().to_string())];

        if let Some(window) = filter.window {
            sql.push_str(" AND t.date >= ? AND t.date <= ?");
            params.push(Value::Text(window.start.format(DATE_FORMAT).to_string()));
            params.push(Value::Text(window.end.format(DATE_FORMAT).to_string()));
        }

        if let Some(account_id) = filter.account_id {
            sql.push_str(" AND t.account_id = ?");
            params.push(Value::Text(account_id.to_string()));
        }

        if let Some(ids) = filter.ids {
            let placeholders = vec!["?"; ids.len()].join(", ");
            sql.push_str(&format!(" AND t.id IN ({placeholders})"));
            params.extend(ids.iter().map(|id| Value::Text(id.clone())));
        }

        if filter.expenses_only {
            sql.push_str(" AND t.amount < 0");
        }

        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(tail);
        }

        ScopedQuery { sql, params }
    }

    /// Phase one of every scoped mutation: which of `ids` does this owner own?
    /// Unknown and foreign ids are silently dropped; duplicates collapse.
    pub fn owned_transaction_ids(&self, ids: &[String]) -> rusqlite::Result<Vec<String>> {
        let mut owned = Vec::new();

        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let query = self.query("DISTINCT t.id", "", &TransactionFilter::ids(chunk), "");
            owned.extend(query.fetch_all(self.conn, |row| row.get::<_, String>(0))?);
        }

        owned.sort();
        owned.dedup();
        Ok(owned)
    }

    /// Does `account_id` exist and belong to this owner?
    pub fn owns_account(&self, account_id: &str) -> rusqlite::Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM accounts WHERE id = ?1 AND owner_id = ?2",
                params![account_id, self.owner.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_account, setup_database};

    fn owner(id: &str) -> OwnerId {
        OwnerId::from_identity(Some(id)).unwrap()
    }

    fn insert_tx(conn: &Connection, id: &str, account_id: &str, date: &str, amount: i64) {
        conn.execute(
            "INSERT INTO transactions (id, date, account_id, payee, amount) VALUES (?1, ?2, ?3, 'P', ?4)",
            params![id, date, account_id, amount],
        )
        .unwrap();
    }

    #[test]
    fn test_query_always_contains_ownership_join() {
        let conn = Connection::open_in_memory().unwrap();
        let alice = owner("alice");
        let scope = OwnerScope::new(&conn, &alice);

        let query = scope.query("t.id", "", &TransactionFilter::default(), "");

        assert!(query.sql.contains("INNER JOIN accounts a ON a.id = t.account_id"));
        assert!(query.sql.contains("WHERE a.owner_id = ?"));
        assert_eq!(query.params, vec![Value::Text("alice".to_string())]);
    }

    #[test]
    fn test_owned_transaction_ids_excludes_foreign_rows() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let alice = owner("alice");
        let bob = owner("bob");
        let alice_acc = insert_account(&conn, &alice, "A", None).unwrap();
        let bob_acc = insert_account(&conn, &bob, "B", None).unwrap();

        insert_tx(&conn, "a1", &alice_acc.id, "2024-01-01", 10);
        insert_tx(&conn, "a2", &alice_acc.id, "2024-01-02", 20);
        insert_tx(&conn, "b1", &bob_acc.id, "2024-01-01", 30);

        let requested = vec![
            "a1".to_string(),
            "b1".to_string(),
            "missing".to_string(),
            "a2".to_string(),
            "a1".to_string(),
        ];
        let owned = OwnerScope::new(&conn, &alice)
            .owned_transaction_ids(&requested)
            .unwrap();

        assert_eq!(owned, vec!["a1".to_string(), "a2".to_string()]);
    }

    #[test]
    fn test_owns_account() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let alice = owner("alice");
        let bob = owner("bob");
        let alice_acc = insert_account(&conn, &alice, "A", None).unwrap();

        assert!(OwnerScope::new(&conn, &alice).owns_account(&alice_acc.id).unwrap());
        assert!(!OwnerScope::new(&conn, &bob).owns_account(&alice_acc.id).unwrap());
        assert!(!OwnerScope::new(&conn, &alice).owns_account("missing").unwrap());
    }

    #[test]
    fn test_window_and_account_filters() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let alice = owner("alice");
        let checking = insert_account(&conn, &alice, "Checking", None).unwrap();
        let savings = insert_account(&conn, &alice, "Savings", None).unwrap();

        insert_tx(&conn, "in", &checking.id, "2024-01-05", 1);
        insert_tx(&conn, "edge", &checking.id, "2024-01-10", 1);
        insert_tx(&conn, "late", &checking.id, "2024-01-11", 1);
        insert_tx(&conn, "other", &savings.id, "2024-01-05", 1);

        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let window = DateWindow::new(start, end).unwrap();

        let scope = OwnerScope::new(&conn, &alice);
        let query = scope.query(
            "t.id",
            "",
            &TransactionFilter::window(&window, Some(&checking.id)),
            "ORDER BY t.id",
        );
        let ids: Vec<String> = query.fetch_all(&conn, |row| row.get(0)).unwrap();

        assert_eq!(ids, vec!["edge".to_string(), "in".to_string()]);
    }
}
