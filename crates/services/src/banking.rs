//! Banking services over the financial store
//!
//! Each public method is one unit of work: it runs inside a transaction via
//! the manager's retry helper, so ordering conflicts restart and re-run the
//! whole method body transparently. Business rule violations (missing
//! account, insufficient funds) abort the transaction and surface unretried.

use crate::entities::{Account, Entity, LedgerEntry, User};
use crate::error::{ServiceError, ServiceResult};
use chrono::Utc;
use std::sync::Arc;
use tandem_concurrency::{OpRequest, TransactionManager};
use tandem_core::{RecordId, Row};

/// Account and transfer operations
pub struct Bank {
    manager: Arc<TransactionManager>,
}

fn fetch_account(
    manager: &TransactionManager,
    client: &str,
    id: RecordId,
) -> ServiceResult<Account> {
    let row = manager
        .execute(client, OpRequest::select(Account::DATABASE, Account::TABLE, id))?
        .row()
        .ok_or(ServiceError::NotFound {
            entity: "account",
            id,
        })?;
    Account::from_row(&row).ok_or(ServiceError::NotFound {
        entity: "account",
        id,
    })
}

impl Bank {
    /// Create a banking service over `manager`
    pub fn new(manager: Arc<TransactionManager>) -> Self {
        Bank { manager }
    }

    /// Register a user
    pub fn create_user(
        &self,
        client: &str,
        username: &str,
        email: &str,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let user = User {
                id: None,
                username: username.to_string(),
                email: email.to_string(),
                active: true,
            };
            let id = m
                .execute(client, OpRequest::insert(User::DATABASE, User::TABLE, user.to_row()))?
                .inserted()
                .expect("insert returns the assigned key");
            Ok(id)
        })
    }

    /// Open an account for `user_id` with an opening balance in minor units
    pub fn create_account(
        &self,
        client: &str,
        user_id: RecordId,
        kind: &str,
        opening_balance: i64,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let user_row = m
                .execute(client, OpRequest::select(User::DATABASE, User::TABLE, user_id))?
                .row();
            if user_row.is_none() {
                return Err(ServiceError::NotFound {
                    entity: "user",
                    id: user_id,
                });
            }

            let account = Account {
                id: None,
                user_id,
                number: format!("ACC-{}-{}", user_id, Utc::now().timestamp_millis()),
                balance: opening_balance,
                kind: kind.to_string(),
                active: true,
            };
            let id = m
                .execute(
                    client,
                    OpRequest::insert(Account::DATABASE, Account::TABLE, account.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");
            tracing::info!(account = id, user = user_id, "account opened");
            Ok(id)
        })
    }

    /// Read an account
    pub fn account(&self, client: &str, id: RecordId) -> ServiceResult<Account> {
        self.manager
            .with_transaction(client, |m| fetch_account(m, client, id))
    }

    /// All accounts owned by `user_id`
    ///
    /// A whole-table snapshot read filtered in memory; the store has no
    /// secondary indexes.
    pub fn user_accounts(&self, client: &str, user_id: RecordId) -> ServiceResult<Vec<Account>> {
        self.manager.with_transaction(client, |m| {
            let rows = m
                .execute(client, OpRequest::scan(Account::DATABASE, Account::TABLE))?
                .rows();
            Ok(rows
                .iter()
                .filter_map(Account::from_row)
                .filter(|a| a.user_id == user_id)
                .collect())
        })
    }

    /// Move `amount` minor units between two accounts and record the movement
    ///
    /// The whole sequence (both balance checks, the debit, the credit, and
    /// the ledger insert) is one atomic transaction.
    pub fn transfer(
        &self,
        client: &str,
        from: RecordId,
        to: RecordId,
        amount: i64,
        note: &str,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let source = fetch_account(m, client, from)?;
            if source.balance < amount {
                return Err(ServiceError::InsufficientFunds {
                    account: from,
                    balance: source.balance,
                    requested: amount,
                });
            }
            let destination = fetch_account(m, client, to)?;

            m.execute(
                client,
                OpRequest::update(
                    Account::DATABASE,
                    Account::TABLE,
                    from,
                    Row::new().with("balance", source.balance - amount),
                ),
            )?;
            m.execute(
                client,
                OpRequest::update(
                    Account::DATABASE,
                    Account::TABLE,
                    to,
                    Row::new().with("balance", destination.balance + amount),
                ),
            )?;

            let entry = LedgerEntry {
                id: None,
                from_account: Some(from),
                to_account: Some(to),
                amount,
                kind: "transfer".into(),
                note: note.to_string(),
                at: Utc::now().to_rfc3339(),
                status: "completed".into(),
            };
            let entry_id = m
                .execute(
                    client,
                    OpRequest::insert(LedgerEntry::DATABASE, LedgerEntry::TABLE, entry.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");
            tracing::info!(from, to, amount, entry = entry_id, "transfer completed");
            Ok(entry_id)
        })
    }

    /// Credit an account and record the deposit
    pub fn deposit(
        &self,
        client: &str,
        account: RecordId,
        amount: i64,
        note: &str,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let target = fetch_account(m, client, account)?;
            m.execute(
                client,
                OpRequest::update(
                    Account::DATABASE,
                    Account::TABLE,
                    account,
                    Row::new().with("balance", target.balance + amount),
                ),
            )?;
            let entry = LedgerEntry {
                id: None,
                from_account: None,
                to_account: Some(account),
                amount,
                kind: "deposit".into(),
                note: note.to_string(),
                at: Utc::now().to_rfc3339(),
                status: "completed".into(),
            };
            let entry_id = m
                .execute(
                    client,
                    OpRequest::insert(LedgerEntry::DATABASE, LedgerEntry::TABLE, entry.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");
            Ok(entry_id)
        })
    }

    /// Debit an account and record the withdrawal
    pub fn withdraw(
        &self,
        client: &str,
        account: RecordId,
        amount: i64,
        note: &str,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let source = fetch_account(m, client, account)?;
            if source.balance < amount {
                return Err(ServiceError::InsufficientFunds {
                    account,
                    balance: source.balance,
                    requested: amount,
                });
            }
            m.execute(
                client,
                OpRequest::update(
                    Account::DATABASE,
                    Account::TABLE,
                    account,
                    Row::new().with("balance", source.balance - amount),
                ),
            )?;
            let entry = LedgerEntry {
                id: None,
                from_account: Some(account),
                to_account: None,
                amount,
                kind: "withdrawal".into(),
                note: note.to_string(),
                at: Utc::now().to_rfc3339(),
                status: "completed".into(),
            };
            let entry_id = m
                .execute(
                    client,
                    OpRequest::insert(LedgerEntry::DATABASE, LedgerEntry::TABLE, entry.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");
            Ok(entry_id)
        })
    }
}
