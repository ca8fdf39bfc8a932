use async_trait::async_trait;
use thiserror::Error;

use medstock_auth::{Operator, Role};
use medstock_catalog::{Cabinet, Input, InputDraft, Medicine, MedicineDraft, Resident};
use medstock_core::{CabinetId, Casela, IdempotencyKey, InputId, MedicineId, StockRowId};
use medstock_ledger::{
    ExitMatch, MovementFilter, MovementRecord, NewMovement, NewStockRow, StockFilter, StockRow,
};

/// Storage operation error.
///
/// Infrastructure failures only; business rule violations are `DomainError`s
/// raised by the services before anything reaches the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A foreign key or check constraint rejected the write.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A numeric value left the range of its column (e.g. a merged quantity overflowed).
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// A stored row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Decode(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Something a stock row may point at; used for delete guards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockReference {
    Medicine(MedicineId),
    Input(InputId),
    Cabinet(CabinetId),
    Resident(Casela),
}

/// Transactional storage handle.
///
/// Services never hold a pool or a global; they receive an `Arc<dyn Store>`
/// and open one unit of work per operation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One unit of work. Dropping it without `commit` discards every change.
#[async_trait]
pub trait StoreTx: Send {
    // ── catalog ──────────────────────────────────────────────────────────
    async fn insert_medicine(&mut self, draft: &MedicineDraft) -> Result<Medicine, StoreError>;
    async fn get_medicine(&mut self, id: MedicineId) -> Result<Option<Medicine>, StoreError>;
    async fn list_medicines(&mut self) -> Result<Vec<Medicine>, StoreError>;
    /// `false` when no such medicine exists.
    async fn update_medicine(&mut self, medicine: &Medicine) -> Result<bool, StoreError>;
    async fn delete_medicine(&mut self, id: MedicineId) -> Result<bool, StoreError>;

    async fn insert_input(&mut self, draft: &InputDraft) -> Result<Input, StoreError>;
    async fn get_input(&mut self, id: InputId) -> Result<Option<Input>, StoreError>;
    async fn list_inputs(&mut self) -> Result<Vec<Input>, StoreError>;
    async fn update_input(&mut self, input: &Input) -> Result<bool, StoreError>;
    async fn delete_input(&mut self, id: InputId) -> Result<bool, StoreError>;

    /// Cabinet numbers are user-assigned; a taken number is `StoreError::Duplicate`.
    async fn insert_cabinet(&mut self, cabinet: &Cabinet) -> Result<(), StoreError>;
    async fn get_cabinet(&mut self, id: CabinetId) -> Result<Option<Cabinet>, StoreError>;
    async fn list_cabinets(&mut self) -> Result<Vec<Cabinet>, StoreError>;
    async fn update_cabinet(&mut self, cabinet: &Cabinet) -> Result<bool, StoreError>;
    async fn delete_cabinet(&mut self, id: CabinetId) -> Result<bool, StoreError>;

    async fn insert_resident(&mut self, resident: &Resident) -> Result<(), StoreError>;
    async fn get_resident(&mut self, casela: Casela) -> Result<Option<Resident>, StoreError>;
    async fn list_residents(&mut self) -> Result<Vec<Resident>, StoreError>;
    async fn update_resident(&mut self, resident: &Resident) -> Result<bool, StoreError>;
    async fn delete_resident(&mut self, casela: Casela) -> Result<bool, StoreError>;

    // ── stock ledger ─────────────────────────────────────────────────────
    /// Number of stock rows (any quantity) pointing at `target`.
    async fn count_stock_references(&mut self, target: StockReference) -> Result<i64, StoreError>;

    /// Create the row, or add `row.quantity` to the row with the same key.
    /// Origin and stock type of an existing row are kept.
    async fn upsert_stock_row(&mut self, row: &NewStockRow) -> Result<StockRow, StoreError>;

    /// Rows an exit may draw from, locked until the end of the unit of work.
    async fn lock_exit_rows(&mut self, m: &ExitMatch) -> Result<Vec<StockRow>, StoreError>;

    /// Every row of a cabinet, locked until the end of the unit of work.
    async fn lock_cabinet_rows(&mut self, cabinet: CabinetId) -> Result<Vec<StockRow>, StoreError>;

    async fn set_stock_quantity(&mut self, id: StockRowId, quantity: i64) -> Result<(), StoreError>;
    async fn delete_stock_rows(&mut self, ids: &[StockRowId]) -> Result<(), StoreError>;

    /// Rows matching the row-level part of `filter` (relative predicates are
    /// applied by the caller).
    async fn list_stock(&mut self, filter: &StockFilter) -> Result<Vec<StockRow>, StoreError>;

    // ── movement log ─────────────────────────────────────────────────────
    async fn insert_movement(&mut self, movement: &NewMovement) -> Result<MovementRecord, StoreError>;
    /// Newest first.
    async fn list_movements(&mut self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError>;
    /// Movements recorded under `key`, in insertion order.
    async fn movements_by_key(&mut self, key: IdempotencyKey) -> Result<Vec<MovementRecord>, StoreError>;
    /// Serialise units of work sharing an idempotency key.
    async fn lock_idempotency_key(&mut self, key: IdempotencyKey) -> Result<(), StoreError>;

    // ── operators ────────────────────────────────────────────────────────
    async fn insert_operator(
        &mut self,
        login: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<Operator, StoreError>;
    async fn find_operator(&mut self, login: &str) -> Result<Option<Operator>, StoreError>;
    async fn count_operators(&mut self) -> Result<i64, StoreError>;
    /// All operators, ordered by login.
    async fn list_operators(&mut self) -> Result<Vec<Operator>, StoreError>;
    /// Replace the stored hash; `None` when no operator has `login`.
    async fn set_operator_password(
        &mut self,
        login: &str,
        password_hash: &str,
    ) -> Result<Option<Operator>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
