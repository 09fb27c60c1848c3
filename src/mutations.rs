// ✍️ Ownership-Scoped Mutations
//
// Every write is one IMMEDIATE SQLite transaction:
//
//   1. resolve the authorized id set through the account join (OwnerScope)
//   2. mutate exactly that set
//   3. commit
//
// Returning early drops the `rusqlite::Transaction`, which rolls back. Ids
// outside the authorized set are silently excluded; only single-row calls
// with zero effect report `NotFound`.

use rusqlite::{params, Connection, TransactionBehavior};
use tracing::{info, warn};

use crate::db::{category_exists, DeletedId, NewTransaction, Transaction};
use crate::error::{LedgerError, Result};
use crate::identity::OwnerId;
use crate::scope::OwnerScope;

const MAX_IDS_PER_DELETE: usize = 500;

/// Create one transaction in an account owned by `owner`.
///
/// A foreign or unknown `account_id` is `Unauthorized`.
pub fn create_transaction(
    conn: &mut Connection,
    owner: &OwnerId,
    fields: NewTransaction,
) -> Result<Transaction> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let created = insert_scoped(&tx, owner, fields)?;
    tx.commit()?;

    info!(owner = %owner, id = %created.id, "transaction created");
    Ok(created)
}

/// Create many transactions. Each row is checked on its own; rows that fail
/// ownership or validation are skipped, and exactly the created rows come back.
/// A storage failure aborts the whole batch.
pub fn bulk_create_transactions(
    conn: &mut Connection,
    owner: &OwnerId,
    rows: Vec<NewTransaction>,
) -> Result<Vec<Transaction>> {
    let requested = rows.len();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut created = Vec::with_capacity(requested);
    for (index, fields) in rows.into_iter().enumerate() {
        match insert_scoped(&tx, owner, fields) {
            Ok(row) => created.push(row),
            Err(err @ (LedgerError::Unauthorized | LedgerError::Validation { .. })) => {
                warn!(owner = %owner, index, error = %err, "bulk create skipped row");
            }
            Err(err) => return Err(err),
        }
    }

    tx.commit()?;

    info!(owner = %owner, requested, created = created.len(), "bulk create");
    Ok(created)
}

/// Delete the subset of `ids` owned by `owner` and return what was deleted.
pub fn bulk_delete_transactions(
    conn: &mut Connection,
    owner: &OwnerId,
    ids: &[String],
) -> Result<Vec<DeletedId>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let owned = OwnerScope::new(&tx, owner).owned_transaction_ids(ids)?;
    let deleted = delete_ids(&tx, &owned)?;

    tx.commit()?;

    info!(
        owner = %owner,
        requested = ids.len(),
        deleted = deleted.len(),
        "bulk delete"
    );
    Ok(deleted)
}

/// Replace every mutable field of one owned transaction.
///
/// `NotFound` when the row is missing or foreign; `Unauthorized` when the
/// new `account_id` is not the caller's.
pub fn update_transaction(
    conn: &mut Connection,
    owner: &OwnerId,
    id: &str,
    fields: NewTransaction,
) -> Result<Transaction> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let updated = {
        let scope = OwnerScope::new(&tx, owner);
        let target = [id.to_string()];
        if scope.owned_transaction_ids(&target)?.is_empty() {
            return Err(LedgerError::NotFound);
        }

        validate_fields(&tx, &fields)?;
        if !scope.owns_account(&fields.account_id)? {
            return Err(LedgerError::Unauthorized);
        }

        tx.execute(
            "UPDATE transactions
             SET date = ?1, account_id = ?2, category_id = ?3, payee = ?4, amount = ?5, notes = ?6
             WHERE id = ?7",
            params![
                fields.date,
                fields.account_id,
                fields.category_id,
                fields.payee,
                fields.amount,
                fields.notes,
                id,
            ],
        )?;

        fields.into_transaction(id.to_string())
    };

    tx.commit()?;

    info!(owner = %owner, id, "transaction updated");
    Ok(updated)
}

/// Delete one owned transaction. `NotFound` when missing or foreign.
pub fn delete_transaction(conn: &mut Connection, owner: &OwnerId, id: &str) -> Result<DeletedId> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let target = [id.to_string()];
    let owned = OwnerScope::new(&tx, owner).owned_transaction_ids(&target)?;
    let deleted = delete_ids(&tx, &owned)?
        .into_iter()
        .next()
        .ok_or(LedgerError::NotFound)?;

    tx.commit()?;

    info!(owner = %owner, id, "transaction deleted");
    Ok(deleted)
}

// ============================================================================
// HELPERS
// ============================================================================

fn validate_fields(conn: &Connection, fields: &NewTransaction) -> Result<()> {
    if fields.payee.trim().is_empty() {
        return Err(LedgerError::validation("payee", "must not be empty"));
    }
    if let Some(category_id) = &fields.category_id {
        if !category_exists(conn, category_id)? {
            return Err(LedgerError::validation(
                "categoryId",
                format!("unknown category {}", category_id),
            ));
        }
    }
    Ok(())
}

/// Insert only if the target account resolves to `owner`. The ownership join
/// is part of the INSERT itself, so no row can land in a foreign account.
fn insert_scoped(conn: &Connection, owner: &OwnerId, fields: NewTransaction) -> Result<Transaction> {
    validate_fields(conn, &fields)?;

    let row = fields.into_transaction(uuid::Uuid::new_v4().to_string());
    let inserted = conn.execute(
        "INSERT INTO transactions (id, date, account_id, category_id, payee, amount, notes)
         SELECT ?1, ?2, a.id, ?3, ?4, ?5, ?6
         FROM accounts a
         WHERE a.id = ?7 AND a.owner_id = ?8",
        params![
            row.id,
            row.date,
            row.category_id,
            row.payee,
            row.amount,
            row.notes,
            row.account_id,
            owner.as_str(),
        ],
    )?;

    if inserted == 0 {
        return Err(LedgerError::Unauthorized);
    }
    Ok(row)
}

/// Physically delete `ids` (already authorized) and report what went.
fn delete_ids(conn: &Connection, ids: &[String]) -> Result<Vec<DeletedId>> {
    let mut deleted = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(MAX_IDS_PER_DELETE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "DELETE FROM transactions WHERE id IN ({placeholders}) RETURNING id"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                Ok(DeletedId { id: row.get(0)? })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        deleted.extend(rows);
    }

    deleted.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_account, insert_category, setup_database, transaction_exists, Account};
    use chrono::NaiveDate;

    fn owner(id: &str) -> OwnerId {
        OwnerId::from_identity(Some(id)).unwrap()
    }

    fn fields(account: &Account, payee: &str, amount: i64) -> NewTransaction {
        NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            account_id: account.id.clone(),
            category_id: None,
            payee: payee.to_string(),
            amount,
            notes: None,
        }
    }

    struct Fixture {
        conn: Connection,
        alice: OwnerId,
        bob: OwnerId,
        alice_acc: Account,
        bob_acc: Account,
    }

    fn fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let alice = owner("alice");
        let bob = owner("bob");
        let alice_acc = insert_account(&conn, &alice, "Alice Checking", None).unwrap();
        let bob_acc = insert_account(&conn, &bob, "Bob Checking", None).unwrap();
        Fixture { conn, alice, bob, alice_acc, bob_acc }
    }

    #[test]
    fn test_create_in_own_account() {
        let mut f = fixture();

        let created =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Cafe", -450)).unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.account_id, f.alice_acc.id);
        assert_eq!(created.amount, -450);
        assert!(transaction_exists(&f.conn, &created.id).unwrap());
    }

    #[test]
    fn test_create_in_foreign_account_is_unauthorized() {
        let mut f = fixture();

        let err = create_transaction(&mut f.conn, &f.alice, fields(&f.bob_acc, "Sneaky", 1))
            .unwrap_err();

        assert!(matches!(err, LedgerError::Unauthorized));
        assert_eq!(crate::db::count_transactions(&f.conn).unwrap(), 0);
    }

    #[test]
    fn test_create_validates_payee_and_category() {
        let mut f = fixture();

        let err = create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "  ", 1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "payee", .. }));

        let mut with_category = fields(&f.alice_acc, "Shop", -1);
        with_category.category_id = Some("no-such-category".to_string());
        let err = create_transaction(&mut f.conn, &f.alice, with_category).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "categoryId", .. }));

        let category = insert_category(&f.conn, "Shopping").unwrap();
        let mut with_category = fields(&f.alice_acc, "Shop", -1);
        with_category.category_id = Some(category.id.clone());
        let created = create_transaction(&mut f.conn, &f.alice, with_category).unwrap();
        assert_eq!(created.category_id, Some(category.id));
    }

    #[test]
    fn test_bulk_create_allows_partial_success() {
        let mut f = fixture();

        let created = bulk_create_transactions(
            &mut f.conn,
            &f.alice,
            vec![
                fields(&f.alice_acc, "One", 100),
                fields(&f.bob_acc, "Foreign", 200),
                fields(&f.alice_acc, "", 300),
                fields(&f.alice_acc, "Two", -400),
            ],
        )
        .unwrap();

        let payees: Vec<&str> = created.iter().map(|t| t.payee.as_str()).collect();
        assert_eq!(payees, vec!["One", "Two"]);
        assert_eq!(crate::db::count_transactions(&f.conn).unwrap(), 2);
    }

    #[test]
    fn test_bulk_create_all_foreign_is_empty_success() {
        let mut f = fixture();

        let created =
            bulk_create_transactions(&mut f.conn, &f.alice, vec![fields(&f.bob_acc, "X", 1)])
                .unwrap();

        assert!(created.is_empty());
    }

    #[test]
    fn test_delete_foreign_row_is_not_found_and_row_survives() {
        let mut f = fixture();
        let alices =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Mine", 10)).unwrap();

        let err = delete_transaction(&mut f.conn, &f.bob, &alices.id).unwrap_err();

        assert!(matches!(err, LedgerError::NotFound));
        assert!(transaction_exists(&f.conn, &alices.id).unwrap());
    }

    #[test]
    fn test_delete_missing_and_foreign_are_indistinguishable() {
        let mut f = fixture();
        let alices =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Mine", 10)).unwrap();

        let foreign = delete_transaction(&mut f.conn, &f.bob, &alices.id).unwrap_err();
        let missing = delete_transaction(&mut f.conn, &f.bob, "does-not-exist").unwrap_err();

        assert_eq!(foreign.to_string(), missing.to_string());
    }

    #[test]
    fn test_delete_own_row() {
        let mut f = fixture();
        let created =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Mine", 10)).unwrap();

        let deleted = delete_transaction(&mut f.conn, &f.alice, &created.id).unwrap();

        assert_eq!(deleted, DeletedId { id: created.id.clone() });
        assert!(!transaction_exists(&f.conn, &created.id).unwrap());
    }

    #[test]
    fn test_bulk_delete_only_touches_owned_half() {
        let mut f = fixture();

        let mut alice_ids = Vec::new();
        let mut bob_ids = Vec::new();
        for i in 0..3 {
            alice_ids.push(
                create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "A", i))
                    .unwrap()
                    .id,
            );
            bob_ids.push(
                create_transaction(&mut f.conn, &f.bob, fields(&f.bob_acc, "B", i))
                    .unwrap()
                    .id,
            );
        }

        let mut requested = alice_ids.clone();
        requested.extend(bob_ids.iter().cloned());

        let deleted = bulk_delete_transactions(&mut f.conn, &f.alice, &requested).unwrap();

        let mut expected: Vec<DeletedId> =
            alice_ids.iter().map(|id| DeletedId { id: id.clone() }).collect();
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(deleted, expected);

        for id in &alice_ids {
            assert!(!transaction_exists(&f.conn, id).unwrap());
        }
        for id in &bob_ids {
            assert!(transaction_exists(&f.conn, id).unwrap());
        }
    }

    #[test]
    fn test_bulk_delete_nothing_owned_is_empty_success() {
        let mut f = fixture();
        let bobs = create_transaction(&mut f.conn, &f.bob, fields(&f.bob_acc, "B", 1)).unwrap();

        let deleted = bulk_delete_transactions(&mut f.conn, &f.alice, &[bobs.id.clone()]).unwrap();
        assert!(deleted.is_empty());

        let deleted = bulk_delete_transactions(&mut f.conn, &f.alice, &[]).unwrap();
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_update_replaces_fields() {
        let mut f = fixture();
        let savings = insert_account(&f.conn, &f.alice, "Alice Savings", None).unwrap();
        let created =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Old", 10)).unwrap();

        let mut changes = fields(&savings, "New", -99);
        changes.notes = Some("moved".to_string());
        let updated = update_transaction(&mut f.conn, &f.alice, &created.id, changes).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.account_id, savings.id);
        assert_eq!(updated.payee, "New");
        assert_eq!(updated.notes.as_deref(), Some("moved"));

        let stored = crate::queries::get_transaction(&f.conn, &f.alice, &created.id).unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_foreign_row_is_not_found() {
        let mut f = fixture();
        let bobs = create_transaction(&mut f.conn, &f.bob, fields(&f.bob_acc, "Bob's", 5)).unwrap();

        let err = update_transaction(
            &mut f.conn,
            &f.alice,
            &bobs.id,
            fields(&f.alice_acc, "Hijack", 5),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::NotFound));
        let stored = crate::queries::get_transaction(&f.conn, &f.bob, &bobs.id).unwrap();
        assert_eq!(stored.payee, "Bob's");
    }

    #[test]
    fn test_update_into_foreign_account_is_unauthorized() {
        let mut f = fixture();
        let created =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Mine", 5)).unwrap();

        let err = update_transaction(
            &mut f.conn,
            &f.alice,
            &created.id,
            fields(&f.bob_acc, "Gift", 5),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::Unauthorized));
        let stored = crate::queries::get_transaction(&f.conn, &f.alice, &created.id).unwrap();
        assert_eq!(stored.account_id, f.alice_acc.id);
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let mut f = fixture();

        let err = update_transaction(
            &mut f.conn,
            &f.alice,
            "does-not-exist",
            fields(&f.alice_acc, "Ghost", 1),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::NotFound));
        assert_eq!(crate::db::count_transactions(&f.conn).unwrap(), 0);
    }

    #[test]
    fn test_update_validates_fields() {
        let mut f = fixture();
        let created =
            create_transaction(&mut f.conn, &f.alice, fields(&f.alice_acc, "Mine", 5)).unwrap();

        let err = update_transaction(
            &mut f.conn,
            &f.alice,
            &created.id,
            fields(&f.alice_acc, "", 7),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "payee", .. }));

        let mut unknown_category = fields(&f.alice_acc, "Shop", 7);
        unknown_category.category_id = Some("no-such-category".to_string());
        let err = update_transaction(&mut f.conn, &f.alice, &created.id, unknown_category)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "categoryId", .. }));

        let stored = crate::queries::get_transaction(&f.conn, &f.alice, &created.id).unwrap();
        assert_eq!(stored, created);
    }
}
