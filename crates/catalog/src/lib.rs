//! Catalog domain module.
//!
//! Reference entities the stock ledger points at: medicines, consumable
//! inputs, cabinets and residents. Everything here is deterministic validation
//! and normalisation (no IO, no HTTP, no storage).

pub mod cabinet;
pub mod input;
pub mod medicine;
pub mod resident;

pub use cabinet::{Cabinet, CabinetDraft, validate_category};
pub use input::{Input, InputDraft};
pub use medicine::{Medicine, MedicineDraft};
pub use resident::{Resident, ResidentDraft, validate_name};

use medstock_core::{DomainError, DomainResult};

/// Trim a required text field, rejecting blanks.
pub(crate) fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank collapses to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn non_negative(field: &str, value: i64) -> DomainResult<i64> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(value)
}
