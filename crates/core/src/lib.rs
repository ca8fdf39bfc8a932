//! `medstock-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error taxonomy shared by the catalog and the stock ledger, and the
//! strongly-typed identifiers that flow between them.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, ensure_positive_quantity};
pub use id::{
    CabinetId, Casela, IdempotencyKey, InputId, MedicineId, MovementId, OperatorId, StockRowId,
};
pub use value_object::ValueObject;
