//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use chrono::{DateTime, Utc};
use finapp_core::{AccountId, CustomerId, RoleId, ID_LEN};

/// Length of a transaction history key.
pub const HISTORY_KEY_LEN: usize = ID_LEN + 8 + ID_LEN;

/// Create a customer key from a customer ID.
#[must_use]
pub fn customer_key(customer_id: &CustomerId) -> Vec<u8> {
    customer_id.to_vec()
}

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.to_vec()
}

/// Create a role binding key.
///
/// Format: `customer_id (16 bytes) || role_id (16 bytes)`
#[must_use]
pub fn customer_role_key(customer_id: &CustomerId, role_id: &RoleId) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 * ID_LEN);
    key.extend_from_slice(customer_id.as_bytes());
    key.extend_from_slice(role_id.as_bytes());
    key
}

/// Create a prefix for iterating all roles held by a customer.
#[must_use]
pub fn customer_roles_prefix(customer_id: &CustomerId) -> Vec<u8> {
    customer_id.to_vec()
}

/// Create a transaction history key.
///
/// Format: `account_id (16 bytes) || event micros (8 bytes, big-endian) || nonce (16 bytes)`
///
/// Keys for one account sort by event time. The nonce keeps the two rows of a
/// self transfer (same account, same timestamp) apart.
#[must_use]
pub fn history_key(
    account_id: &AccountId,
    event_timestamp: DateTime<Utc>,
    nonce: &[u8; ID_LEN],
) -> Vec<u8> {
    // Pre-epoch timestamps clamp to zero so keys stay unsigned and ordered.
    let micros = u64::try_from(event_timestamp.timestamp_micros()).unwrap_or(0);

    let mut key = Vec::with_capacity(HISTORY_KEY_LEN);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&micros.to_be_bytes());
    key.extend_from_slice(nonce);
    key
}

/// Create a prefix for iterating the history of one account.
#[must_use]
pub fn history_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn account_key_length() {
        let key = account_key(&AccountId::generate());
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn customer_role_key_format() {
        let customer_id = CustomerId::generate();
        let role_id = RoleId::generate();
        let key = customer_role_key(&customer_id, &role_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], customer_id.as_bytes());
        assert_eq!(&key[16..], role_id.as_bytes());
        assert!(key.starts_with(&customer_roles_prefix(&customer_id)));
    }

    #[test]
    fn history_keys_sort_by_time() {
        let account_id = AccountId::generate();
        let now = Utc::now();
        let earlier = history_key(&account_id, now - Duration::seconds(1), &[0xff; 16]);
        let later = history_key(&account_id, now, &[0x00; 16]);

        assert_eq!(earlier.len(), HISTORY_KEY_LEN);
        assert!(earlier < later);
        assert!(later.starts_with(&history_prefix(&account_id)));
    }
}
