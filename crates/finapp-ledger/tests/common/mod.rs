//! Ledger properties shared by every backend test suite.
//!
//! Each function takes a ready ledger and checks one property end to end.
//! Identifiers are freshly generated, so suites may share a database.

#![allow(dead_code)] // Each backend file runs a subset against its own store

use std::sync::Arc;

use finapp_core::{
    AccountId, AccountStatus, AccountType, Amount, CustomerId, HistoryEntry, LedgerError, RoleId,
};
use finapp_ledger::Ledger;
use finapp_store::{LedgerStore, RetryPolicy};

/// Retry policy for tests that race many transfers on one row.
pub fn contention_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 200,
        initial_backoff: std::time::Duration::from_millis(1),
        max_backoff: std::time::Duration::from_millis(50),
        deadline: Some(std::time::Duration::from_secs(60)),
    }
}

pub fn amount(s: &str) -> Amount {
    Amount::parse(s).expect("valid amount literal")
}

/// Open an account with `balance` and return its id.
pub async fn open_account<S: LedgerStore>(ledger: &Ledger<S>, balance: &str) -> AccountId {
    let account_id = AccountId::generate();
    ledger
        .create_account(
            account_id,
            AccountType::Checking,
            AccountStatus::Active,
            amount(balance),
        )
        .await
        .expect("create account");
    account_id
}

pub async fn balance_of<S: LedgerStore>(ledger: &Ledger<S>, account_id: AccountId) -> Amount {
    ledger
        .get_account(account_id)
        .await
        .expect("get account")
        .expect("account exists")
        .balance
}

pub async fn history_of<S: LedgerStore>(
    ledger: &Ledger<S>,
    account_id: AccountId,
) -> Vec<HistoryEntry> {
    ledger
        .transaction_history(account_id)
        .await
        .expect("list history")
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn created_account_reads_back<S: LedgerStore>(ledger: &Ledger<S>) {
    let account_id = AccountId::generate();
    ledger
        .create_account(
            account_id,
            AccountType::Saving,
            AccountStatus::Frozen,
            amount("1234.5678"),
        )
        .await
        .unwrap();

    let account = ledger.get_account(account_id).await.unwrap().unwrap();
    assert_eq!(account.account_id, account_id);
    assert_eq!(account.account_type, AccountType::Saving);
    assert_eq!(account.status, AccountStatus::Frozen);
    assert_eq!(account.balance, amount("1234.5678"));
    assert_eq!(account.balance.to_string(), "1234.5678");

    assert!(ledger
        .get_account(AccountId::generate())
        .await
        .unwrap()
        .is_none());
}

pub async fn duplicate_ids_are_rejected<S: LedgerStore>(ledger: &Ledger<S>) {
    let account_id = open_account(ledger, "1").await;
    let err = ledger
        .create_account(
            account_id,
            AccountType::Checking,
            AccountStatus::Active,
            amount("99"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateId { entity: "account", .. }));
    assert_eq!(balance_of(ledger, account_id).await, amount("1"));

    let customer_id = CustomerId::generate();
    ledger
        .create_customer(customer_id, "Ada", "1 Main St")
        .await
        .unwrap();
    let err = ledger
        .create_customer(customer_id, "Bob", "2 Main St")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateId { entity: "customer", .. }));
    let customer = ledger.get_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.name, "Ada");

    let role_id = RoleId::generate();
    ledger
        .create_customer_role(customer_id, account_id, role_id, "owner")
        .await
        .unwrap();
    let err = ledger
        .create_customer_role(customer_id, AccountId::generate(), role_id, "viewer")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateId { entity: "customer_role", .. }));
}

pub async fn roles_do_not_check_references<S: LedgerStore>(ledger: &Ledger<S>) {
    let customer_id = CustomerId::generate();
    let account_id = AccountId::generate();

    ledger
        .create_customer_role(customer_id, account_id, RoleId::generate(), "owner")
        .await
        .unwrap();
    ledger
        .create_customer_role(customer_id, account_id, RoleId::generate(), "auditor")
        .await
        .unwrap();

    let roles = ledger.customer_roles(customer_id).await.unwrap();
    assert_eq!(roles.len(), 2);
    assert!(roles.iter().all(|r| r.account_id == account_id));

    let mut names: Vec<_> = roles.iter().map(|r| r.role_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["auditor", "owner"]);
}

// ============================================================================
// Transfers
// ============================================================================

pub async fn transfer_moves_funds_and_records_history<S: LedgerStore>(ledger: &Ledger<S>) {
    let from = open_account(ledger, "100.25").await;
    let to = open_account(ledger, "7").await;

    let outcome = ledger
        .move_account_balance(from, to, amount("40.05"))
        .await
        .unwrap();

    assert_eq!(outcome.from_balance, amount("60.20"));
    assert_eq!(outcome.to_balance, amount("47.05"));
    assert_eq!(balance_of(ledger, from).await, amount("60.2"));
    assert_eq!(balance_of(ledger, to).await, amount("47.05"));

    let debits = history_of(ledger, from).await;
    assert_eq!(debits.len(), 1);
    assert!(!debits[0].is_credit);
    assert_eq!(debits[0].amount, amount("40.05"));

    let credits = history_of(ledger, to).await;
    assert_eq!(credits.len(), 1);
    assert!(credits[0].is_credit);
    assert_eq!(credits[0].amount, amount("40.05"));
    assert_eq!(debits[0].event_timestamp, credits[0].event_timestamp);
}

pub async fn whole_balance_and_zero_transfers_succeed<S: LedgerStore>(ledger: &Ledger<S>) {
    let from = open_account(ledger, "5").await;
    let to = open_account(ledger, "0").await;

    ledger
        .move_account_balance(from, to, amount("0"))
        .await
        .unwrap();
    ledger
        .move_account_balance(from, to, amount("5"))
        .await
        .unwrap();

    assert!(balance_of(ledger, from).await.is_zero());
    assert_eq!(balance_of(ledger, to).await, amount("5"));
    assert_eq!(history_of(ledger, from).await.len(), 2);
    assert_eq!(history_of(ledger, to).await.len(), 2);
}

pub async fn overdraft_is_rejected_without_side_effects<S: LedgerStore>(ledger: &Ledger<S>) {
    let from = open_account(ledger, "10").await;
    let to = open_account(ledger, "3").await;

    let err = ledger
        .move_account_balance(from, to, amount("10.000001"))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientFunds { account_id, .. } if account_id == from));
    assert_eq!(balance_of(ledger, from).await, amount("10"));
    assert_eq!(balance_of(ledger, to).await, amount("3"));
    assert!(history_of(ledger, from).await.is_empty());
    assert!(history_of(ledger, to).await.is_empty());
}

pub async fn negative_amount_is_invalid<S: LedgerStore>(ledger: &Ledger<S>) {
    let from = open_account(ledger, "10").await;
    let to = open_account(ledger, "10").await;

    let err = ledger
        .move_account_balance(from, to, amount("-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    assert_eq!(balance_of(ledger, from).await, amount("10"));
    assert_eq!(balance_of(ledger, to).await, amount("10"));
}

pub async fn self_transfer_nets_to_zero<S: LedgerStore>(ledger: &Ledger<S>) {
    let account_id = open_account(ledger, "12.5").await;

    let outcome = ledger
        .move_account_balance(account_id, account_id, amount("4"))
        .await
        .unwrap();

    assert_eq!(outcome.from_balance, amount("12.5"));
    assert_eq!(outcome.to_balance, amount("12.5"));
    assert_eq!(outcome.balances().len(), 1);
    assert_eq!(balance_of(ledger, account_id).await, amount("12.5"));

    let history = history_of(ledger, account_id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|e| e.is_credit).count(), 1);
    assert!(history.iter().all(|e| e.amount == amount("4")));
}

pub async fn self_transfer_beyond_balance_is_rejected<S: LedgerStore>(ledger: &Ledger<S>) {
    let account_id = open_account(ledger, "1").await;

    let err = ledger
        .move_account_balance(account_id, account_id, amount("2"))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert!(history_of(ledger, account_id).await.is_empty());
}

pub async fn unknown_accounts_are_not_found<S: LedgerStore>(ledger: &Ledger<S>) {
    let known = open_account(ledger, "50").await;
    let unknown = AccountId::generate();

    let err = ledger
        .move_account_balance(unknown, known, amount("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound { account_id } if account_id == unknown));

    let err = ledger
        .move_account_balance(known, unknown, amount("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound { account_id } if account_id == unknown));

    assert_eq!(balance_of(ledger, known).await, amount("50"));
    assert!(history_of(ledger, known).await.is_empty());
    assert!(ledger.get_account(unknown).await.unwrap().is_none());
}

/// `transfers` concurrent transfers of `each` drain the source exactly.
pub async fn concurrent_transfers_serialize<S>(ledger: Arc<Ledger<S>>, transfers: u32)
where
    S: LedgerStore + 'static,
{
    let each = amount("2.5");
    let total = Amount::from_decimal(each.as_decimal() * rust_decimal::Decimal::from(transfers));
    let from = open_account(&ledger, &total.to_string()).await;
    let to = open_account(&ledger, "1").await;

    let tasks: Vec<_> = (0..transfers)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.move_account_balance(from, to, each).await })
        })
        .collect();

    for task in tasks {
        task.await.expect("task panicked").expect("transfer failed");
    }

    assert!(balance_of(&ledger, from).await.is_zero());
    assert_eq!(
        balance_of(&ledger, to).await,
        total.checked_add(amount("1")).unwrap()
    );

    let expected_rows = usize::try_from(transfers).unwrap();
    assert_eq!(history_of(&ledger, from).await.len(), expected_rows);
    assert_eq!(history_of(&ledger, to).await.len(), expected_rows);
}

/// One more transfer than the source can cover: exactly one must fail.
pub async fn concurrent_overdraft_fails_once<S>(ledger: Arc<Ledger<S>>, transfers: u32)
where
    S: LedgerStore + 'static,
{
    let from = open_account(&ledger, &(transfers - 1).to_string()).await;
    let to = open_account(&ledger, "0").await;

    let tasks: Vec<_> = (0..transfers)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.move_account_balance(from, to, amount("1")).await })
        })
        .collect();

    let mut rejected = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => {}
            Err(LedgerError::InsufficientFunds { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(rejected, 1);
    assert!(balance_of(&ledger, from).await.is_zero());
    assert_eq!(
        balance_of(&ledger, to).await,
        Amount::from(u64::from(transfers - 1))
    );
}
