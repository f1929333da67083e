//! Balance-transfer engine for the finapp ledger.
//!
//! [`Ledger`] wraps any [`LedgerStore`] and turns each public operation into
//! exactly one unit of work. It never learns which backend it runs on; the
//! store supplies atomicity, isolation and conflict retries.
//!
//! # Transfers
//!
//! [`Ledger::move_account_balance`] reads both balances in one query, rejects
//! the transfer if either account is missing or the source would go negative,
//! then stages both balance updates and a debit/credit pair of audit rows. All
//! four writes commit together or not at all.
//!
//! A transfer from an account to itself is allowed: the destination is
//! credited from the already-debited source balance, so the balance nets out
//! unchanged while the audit trail still records one debit and one credit.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use futures::FutureExt;

use finapp_core::{
    Account, AccountId, AccountStatus, AccountType, Amount, Customer, CustomerId, CustomerRole,
    HistoryEntry, LedgerError, NewAccount, NewHistoryEntry, Result, RoleId, TransferOutcome,
};
use finapp_store::{LedgerStore, TransactionHandle};

/// The ledger engine over a transactional store.
#[derive(Debug, Clone)]
pub struct Ledger<S> {
    store: S,
}

impl<S: LedgerStore> Ledger<S> {
    /// Create a ledger on top of `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Move `amount` from one account to another as one atomic unit of work.
    ///
    /// Returns the balances as committed.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `amount` is negative (checked before the store
    ///   is touched) or a resulting balance cannot be represented.
    /// - `AccountNotFound` for a missing source, then for a missing destination.
    /// - `InsufficientFunds` if the source balance is below `amount`.
    /// - `TransactionAborted` if conflicts outlast the store's retry policy.
    pub async fn move_account_balance(
        &self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Amount,
    ) -> Result<TransferOutcome> {
        ensure_non_negative(amount, "transfer amount")?;

        tracing::debug!(
            from = %from_account_id,
            to = %to_account_id,
            amount = %amount,
            backend = self.store.backend(),
            "Starting transfer"
        );

        let result = self
            .store
            .run_transaction(move |tx| {
                transfer(tx, from_account_id, to_account_id, amount).boxed()
            })
            .await;

        match &result {
            Ok(outcome) => tracing::info!(
                from = %outcome.from_account_id,
                from_balance = %outcome.from_balance,
                to = %outcome.to_account_id,
                to_balance = %outcome.to_balance,
                amount = %amount,
                "Transfer committed"
            ),
            Err(e) => tracing::warn!(
                from = %from_account_id,
                to = %to_account_id,
                amount = %amount,
                error = %e,
                "Transfer rejected"
            ),
        }
        result
    }

    // =========================================================================
    // Entity Writers
    // =========================================================================

    /// Register a customer.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if `customer_id` is already taken.
    pub async fn create_customer(
        &self,
        customer_id: CustomerId,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<()> {
        let customer = Customer {
            customer_id,
            name: name.into(),
            address: address.into(),
        };

        self.store
            .run_transaction(move |tx| {
                let customer = customer.clone();
                async move {
                    tx.insert_customer(&customer)
                        .await
                        .map_err(LedgerError::from)
                }
                .boxed()
            })
            .await?;

        tracing::info!(customer_id = %customer_id, "Customer created");
        Ok(())
    }

    /// Open an account with an opening balance.
    ///
    /// The store assigns the creation timestamp.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `balance` is negative (checked before the store
    ///   is touched).
    /// - `DuplicateId` if `account_id` is already taken.
    pub async fn create_account(
        &self,
        account_id: AccountId,
        account_type: AccountType,
        status: AccountStatus,
        balance: Amount,
    ) -> Result<()> {
        ensure_non_negative(balance, "opening balance")?;

        let account = NewAccount {
            account_id,
            account_type,
            status,
            balance,
        };

        self.store
            .run_transaction(move |tx| {
                let account = account.clone();
                async move { tx.insert_account(&account).await.map_err(LedgerError::from) }.boxed()
            })
            .await?;

        tracing::info!(
            account_id = %account_id,
            account_type = ?account_type,
            status = ?status,
            balance = %balance,
            "Account created"
        );
        Ok(())
    }

    /// Bind a named role on an account to a customer.
    ///
    /// Neither the customer nor the account has to exist.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the customer already holds `role_id`.
    pub async fn create_customer_role(
        &self,
        customer_id: CustomerId,
        account_id: AccountId,
        role_id: RoleId,
        role_name: impl Into<String>,
    ) -> Result<()> {
        let role = CustomerRole {
            customer_id,
            account_id,
            role_id,
            role_name: role_name.into(),
        };

        self.store
            .run_transaction(move |tx| {
                let role = role.clone();
                async move {
                    tx.insert_customer_role(&role)
                        .await
                        .map_err(LedgerError::from)
                }
                .boxed()
            })
            .await?;

        tracing::info!(
            customer_id = %customer_id,
            account_id = %account_id,
            role_id = %role_id,
            "Customer role created"
        );
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Look up an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>> {
        self.store
            .run_transaction(move |tx| {
                async move { tx.get_account(&account_id).await.map_err(LedgerError::from) }.boxed()
            })
            .await
    }

    /// Look up a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        self.store
            .run_transaction(move |tx| {
                async move {
                    tx.get_customer(&customer_id)
                        .await
                        .map_err(LedgerError::from)
                }
                .boxed()
            })
            .await
    }

    /// Roles held by a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn customer_roles(&self, customer_id: CustomerId) -> Result<Vec<CustomerRole>> {
        self.store
            .run_transaction(move |tx| {
                async move { tx.list_customer_roles(&customer_id).await.map_err(LedgerError::from) }
                    .boxed()
            })
            .await
    }

    /// Audit trail of an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn transaction_history(&self, account_id: AccountId) -> Result<Vec<HistoryEntry>> {
        self.store
            .run_transaction(move |tx| {
                async move { tx.list_history(&account_id).await.map_err(LedgerError::from) }.boxed()
            })
            .await
    }
}

/// One attempt of a transfer. Re-run from scratch on conflict.
async fn transfer(
    tx: &mut dyn TransactionHandle,
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount: Amount,
) -> Result<TransferOutcome> {
    let balances = tx.read_balances(&[from_account_id, to_account_id]).await?;
    let balance_of = |account_id: AccountId| {
        balances
            .iter()
            .find(|row| row.account_id == account_id)
            .map(|row| row.balance)
            .ok_or(LedgerError::AccountNotFound { account_id })
    };

    let source_balance = balance_of(from_account_id)?;
    let dest_balance = balance_of(to_account_id)?;

    let new_source = source_balance
        .checked_sub(amount)
        .ok_or_else(|| out_of_range(from_account_id))?;
    if new_source.is_negative() {
        return Err(LedgerError::InsufficientFunds {
            account_id: from_account_id,
            balance: source_balance,
            amount,
        });
    }

    let self_transfer = from_account_id == to_account_id;
    let credit_base = if self_transfer { new_source } else { dest_balance };
    let new_dest = credit_base
        .checked_add(amount)
        .ok_or_else(|| out_of_range(to_account_id))?;

    tx.update_balance(&from_account_id, new_source).await?;
    tx.update_balance(&to_account_id, new_dest).await?;
    tx.insert_history(&[
        NewHistoryEntry::debit(from_account_id, amount),
        NewHistoryEntry::credit(to_account_id, amount),
    ])
    .await?;

    Ok(TransferOutcome {
        from_account_id,
        from_balance: if self_transfer { new_dest } else { new_source },
        to_account_id,
        to_balance: new_dest,
    })
}

fn ensure_non_negative(amount: Amount, what: &str) -> Result<()> {
    if amount.is_negative() {
        return Err(LedgerError::InvalidArgument(format!(
            "{what} must not be negative: {amount}"
        )));
    }
    Ok(())
}

fn out_of_range(account_id: AccountId) -> LedgerError {
    LedgerError::InvalidArgument(format!("balance of account {account_id} would overflow"))
}
