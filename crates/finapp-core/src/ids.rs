//! Identifier types for the ledger.
//!
//! Every entity is keyed by an opaque 16-byte identifier chosen by the caller.
//! The bytes are carried as a UUID so they display and parse in the familiar
//! hyphenated form, but nothing here assumes a particular UUID version.
//!
//! # Macro-based ID Types
//!
//! The `byte_id_type!` macro reduces boilerplate for the identifier types,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of every ledger identifier.
pub const ID_LEN: usize = 16;

/// Macro to define a 16-byte identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `uuid::Uuid` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `TryFrom<&[u8]>`, `Into<String>`
/// - `AsRef<[u8]>`
macro_rules! byte_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create an identifier from its raw 16 bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
                Self(uuid::Uuid::from_bytes(bytes))
            }

            /// Create an identifier from a byte slice.
            ///
            /// # Errors
            ///
            /// Returns `IdError::InvalidLength` unless the slice is exactly 16 bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                uuid::Uuid::from_slice(bytes)
                    .map(Self)
                    .map_err(|_| IdError::InvalidLength(bytes.len()))
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the raw bytes (16 bytes).
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                self.0.as_bytes()
            }

            /// Return an owned copy of the raw bytes.
            #[must_use]
            pub fn to_vec(&self) -> Vec<u8> {
                self.0.as_bytes().to_vec()
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidFormat)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = IdError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                Self::from_slice(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }
    };
}

byte_id_type!(CustomerId, "A customer identifier.");
byte_id_type!(AccountId, "An account identifier.");
byte_id_type!(RoleId, "A role identifier, unique per customer.");

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input string is not a hyphenated or simple UUID.
    #[error("invalid identifier format")]
    InvalidFormat,

    /// The input bytes are not exactly 16 bytes long.
    #[error("invalid identifier length: expected 16 bytes, got {0}")]
    InvalidLength(usize),
}
