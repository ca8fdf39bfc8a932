//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic, user-actionable failure of a catalog or
/// ledger operation. Storage failures belong to the infrastructure layer and are
/// never folded into this enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. blank name, malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stock quantity was zero or negative.
    #[error("invalid quantity {0}: quantity must be greater than zero")]
    InvalidQuantity(i64),

    /// A referenced catalog entity (medicine, input, cabinet, resident) does not exist.
    #[error("unknown reference: {0}")]
    UnknownReference(String),

    /// Adding to a stock row would exceed the largest representable quantity.
    #[error("quantity overflow: {0}")]
    QuantityOverflow(String),

    /// Stock type and resident association disagree (e.g. individual stock without a resident).
    #[error("invalid association: {0}")]
    InvalidAssociation(String),

    /// An exit asked for more than the matching stock rows hold.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// A cabinet relocation could not be completed and was rolled back.
    #[error("relocation incomplete: {0}")]
    RelocationIncomplete(String),

    /// A relocation needs destination cabinets for the listed item kinds.
    #[error("destination cabinet required (medicines: {medicines}, inputs: {inputs})")]
    DestinationsRequired { medicines: bool, inputs: bool },

    /// A user-assigned catalog key is already taken (cabinet number, casela, login).
    #[error("duplicate catalog key: {0}")]
    DuplicateCatalogKey(String),

    /// A catalog entity is still referenced by stock rows and cannot be removed.
    #[error("in use: {0}")]
    InUse(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A request conflicts with what was already recorded (e.g. reused idempotency key).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_reference(msg: impl Into<String>) -> Self {
        Self::UnknownReference(msg.into())
    }

    pub fn invalid_association(msg: impl Into<String>) -> Self {
        Self::InvalidAssociation(msg.into())
    }

    pub fn quantity_overflow(msg: impl Into<String>) -> Self {
        Self::QuantityOverflow(msg.into())
    }

    pub fn relocation_incomplete(msg: impl Into<String>) -> Self {
        Self::RelocationIncomplete(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateCatalogKey(msg.into())
    }

    pub fn in_use(msg: impl Into<String>) -> Self {
        Self::InUse(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable code, used by the HTTP layer in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidQuantity(_) => "invalid_quantity",
            DomainError::UnknownReference(_) => "unknown_reference",
            DomainError::QuantityOverflow(_) => "quantity_overflow",
            DomainError::InvalidAssociation(_) => "invalid_association",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::RelocationIncomplete(_) => "relocation_incomplete",
            DomainError::DestinationsRequired { .. } => "destinations_required",
            DomainError::DuplicateCatalogKey(_) => "duplicate_catalog_key",
            DomainError::InUse(_) => "in_use",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::Unauthorized => "unauthorized",
        }
    }
}

/// Reject non-positive quantities.
pub fn ensure_positive_quantity(quantity: i64) -> DomainResult<i64> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    Ok(quantity)
}
