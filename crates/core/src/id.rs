//! Strongly-typed identifiers used across the domain.
//!
//! Catalog and ledger identifiers are integers: serial ids for medicines,
//! inputs, stock rows, movements and operators, and user-assigned numbers for
//! cabinets and resident caselas. Idempotency keys are client-generated UUIDs.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a medicine in the catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicineId(i64);

/// Identifier of a consumable input in the catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(i64);

/// User-assigned cabinet number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CabinetId(i32);

/// A resident's casela (storage slot) number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Casela(i32);

/// Identifier of a stock row in the ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockRowId(i64);

/// Identifier of a movement record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(i64);

/// Identifier of an operator (authenticated facility user).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(i64);

/// Client-generated key that makes a mutating ledger call safe to resubmit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

macro_rules! impl_int_newtype {
    ($t:ty, $inner:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$inner> for $t {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$t> for $inner {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<$inner>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(MedicineId, i64, "MedicineId");
impl_int_newtype!(InputId, i64, "InputId");
impl_int_newtype!(CabinetId, i32, "CabinetId");
impl_int_newtype!(Casela, i32, "Casela");
impl_int_newtype!(StockRowId, i64, "StockRowId");
impl_int_newtype!(MovementId, i64, "MovementId");
impl_int_newtype!(OperatorId, i64, "OperatorId");

impl IdempotencyKey {
    /// Generate a fresh key (UUIDv7). Clients normally supply their own.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for IdempotencyKey {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for IdempotencyKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s.trim())
            .map_err(|e| DomainError::invalid_id(format!("IdempotencyKey: {e}")))?;
        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cabinet_numbers_parse_from_path_segments() {
        let id: CabinetId = " 12 ".parse().unwrap();
        assert_eq!(id, CabinetId::new(12));
        assert_eq!(id.to_string(), "12");
    }

    #[test]
    fn malformed_ids_are_invalid_id_errors() {
        let err = "abc".parse::<MedicineId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("MedicineId")));
    }

    #[test]
    fn idempotency_keys_round_trip_through_display() {
        let key = IdempotencyKey::new();
        let parsed: IdempotencyKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }
}
