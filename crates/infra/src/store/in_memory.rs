use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use medstock_auth::{Operator, Role};
use medstock_catalog::{Cabinet, Input, InputDraft, Medicine, MedicineDraft, Resident};
use medstock_core::{
    CabinetId, Casela, IdempotencyKey, InputId, MedicineId, MovementId, OperatorId, StockRowId,
};
use medstock_ledger::{
    ExitMatch, ItemRef, MovementFilter, MovementRecord, NewMovement, NewStockRow, StockFilter,
    StockRow, sort_newest_first,
};

use super::r#trait::{StockReference, Store, StoreError, StoreTx};

#[derive(Debug, Clone, Default)]
struct State {
    medicines: BTreeMap<MedicineId, Medicine>,
    inputs: BTreeMap<InputId, Input>,
    cabinets: BTreeMap<CabinetId, Cabinet>,
    residents: BTreeMap<Casela, Resident>,
    stock: BTreeMap<StockRowId, StockRow>,
    movements: Vec<MovementRecord>,
    operators: BTreeMap<OperatorId, Operator>,
    last_medicine: i64,
    last_input: i64,
    last_stock_row: i64,
    last_movement: i64,
    last_operator: i64,
}

/// In-memory store.
///
/// Intended for tests/dev. Units of work are serialised behind one async mutex
/// and edit a copy of the state; commit swaps the copy in, drop discards it.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    /// Remaining movement writes before an injected failure; negative = never fail.
    movement_budget: Arc<AtomicI64>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            movement_budget: Arc::new(AtomicI64::new(-1)),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the movement write after the next `n` successful ones fail.
    pub fn fail_movement_writes_after(&self, n: usize) {
        self.movement_budget.store(n as i64, Ordering::SeqCst);
    }

    pub fn clear_injected_failures(&self) {
        self.movement_budget.store(-1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(InMemoryTx {
            guard,
            work,
            movement_budget: self.movement_budget.clone(),
        }))
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
    movement_budget: Arc<AtomicI64>,
}

impl InMemoryTx {
    fn movement_write_allowed(&self) -> bool {
        let left = self.movement_budget.load(Ordering::SeqCst);
        if left == 0 {
            return false;
        }
        if left > 0 {
            self.movement_budget.fetch_sub(1, Ordering::SeqCst);
        }
        true
    }

    fn rows_of_item(&self, item: ItemRef) -> impl Iterator<Item = &StockRow> {
        self.work.stock.values().filter(move |r| r.item == item)
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn insert_medicine(&mut self, draft: &MedicineDraft) -> Result<Medicine, StoreError> {
        self.work.last_medicine += 1;
        let medicine = draft.clone().into_medicine(MedicineId::new(self.work.last_medicine));
        self.work.medicines.insert(medicine.id, medicine.clone());
        Ok(medicine)
    }

    async fn get_medicine(&mut self, id: MedicineId) -> Result<Option<Medicine>, StoreError> {
        Ok(self.work.medicines.get(&id).cloned())
    }

    async fn list_medicines(&mut self) -> Result<Vec<Medicine>, StoreError> {
        Ok(self.work.medicines.values().cloned().collect())
    }

    async fn update_medicine(&mut self, medicine: &Medicine) -> Result<bool, StoreError> {
        match self.work.medicines.get_mut(&medicine.id) {
            Some(slot) => {
                *slot = medicine.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_medicine(&mut self, id: MedicineId) -> Result<bool, StoreError> {
        if self.rows_of_item(ItemRef::Medicine(id)).next().is_some() {
            return Err(StoreError::Integrity(format!("medicine {id} is referenced by stock")));
        }
        Ok(self.work.medicines.remove(&id).is_some())
    }

    async fn insert_input(&mut self, draft: &InputDraft) -> Result<Input, StoreError> {
        self.work.last_input += 1;
        let input = draft.clone().into_input(InputId::new(self.work.last_input));
        self.work.inputs.insert(input.id, input.clone());
        Ok(input)
    }

    async fn get_input(&mut self, id: InputId) -> Result<Option<Input>, StoreError> {
        Ok(self.work.inputs.get(&id).cloned())
    }

    async fn list_inputs(&mut self) -> Result<Vec<Input>, StoreError> {
        Ok(self.work.inputs.values().cloned().collect())
    }

    async fn update_input(&mut self, input: &Input) -> Result<bool, StoreError> {
        match self.work.inputs.get_mut(&input.id) {
            Some(slot) => {
                *slot = input.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_input(&mut self, id: InputId) -> Result<bool, StoreError> {
        if self.rows_of_item(ItemRef::Input(id)).next().is_some() {
            return Err(StoreError::Integrity(format!("input {id} is referenced by stock")));
        }
        Ok(self.work.inputs.remove(&id).is_some())
    }

    async fn insert_cabinet(&mut self, cabinet: &Cabinet) -> Result<(), StoreError> {
        if self.work.cabinets.contains_key(&cabinet.id) {
            return Err(StoreError::Duplicate(format!("cabinet {}", cabinet.id)));
        }
        self.work.cabinets.insert(cabinet.id, cabinet.clone());
        Ok(())
    }

    async fn get_cabinet(&mut self, id: CabinetId) -> Result<Option<Cabinet>, StoreError> {
        Ok(self.work.cabinets.get(&id).cloned())
    }

    async fn list_cabinets(&mut self) -> Result<Vec<Cabinet>, StoreError> {
        Ok(self.work.cabinets.values().cloned().collect())
    }

    async fn update_cabinet(&mut self, cabinet: &Cabinet) -> Result<bool, StoreError> {
        match self.work.cabinets.get_mut(&cabinet.id) {
            Some(slot) => {
                *slot = cabinet.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_cabinet(&mut self, id: CabinetId) -> Result<bool, StoreError> {
        if self.work.stock.values().any(|r| r.cabinet == id) {
            return Err(StoreError::Integrity(format!("cabinet {id} is referenced by stock")));
        }
        Ok(self.work.cabinets.remove(&id).is_some())
    }

    async fn insert_resident(&mut self, resident: &Resident) -> Result<(), StoreError> {
        if self.work.residents.contains_key(&resident.casela) {
            return Err(StoreError::Duplicate(format!("casela {}", resident.casela)));
        }
        self.work.residents.insert(resident.casela, resident.clone());
        Ok(())
    }

    async fn get_resident(&mut self, casela: Casela) -> Result<Option<Resident>, StoreError> {
        Ok(self.work.residents.get(&casela).cloned())
    }

    async fn list_residents(&mut self) -> Result<Vec<Resident>, StoreError> {
        Ok(self.work.residents.values().cloned().collect())
    }

    async fn update_resident(&mut self, resident: &Resident) -> Result<bool, StoreError> {
        match self.work.residents.get_mut(&resident.casela) {
            Some(slot) => {
                *slot = resident.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_resident(&mut self, casela: Casela) -> Result<bool, StoreError> {
        if self.work.stock.values().any(|r| r.casela == Some(casela)) {
            return Err(StoreError::Integrity(format!("casela {casela} is referenced by stock")));
        }
        Ok(self.work.residents.remove(&casela).is_some())
    }

    async fn count_stock_references(&mut self, target: StockReference) -> Result<i64, StoreError> {
        let count = self
            .work
            .stock
            .values()
            .filter(|r| match target {
                StockReference::Medicine(id) => r.item == ItemRef::Medicine(id),
                StockReference::Input(id) => r.item == ItemRef::Input(id),
                StockReference::Cabinet(id) => r.cabinet == id,
                StockReference::Resident(casela) => r.casela == Some(casela),
            })
            .count();
        Ok(count as i64)
    }

    async fn upsert_stock_row(&mut self, row: &NewStockRow) -> Result<StockRow, StoreError> {
        if row.quantity < 0 {
            return Err(StoreError::Integrity("stock quantity cannot be negative".to_string()));
        }
        let key = row.key();
        if let Some(existing) = self.work.stock.values_mut().find(|r| r.key() == key) {
            existing.quantity = existing.quantity.checked_add(row.quantity).ok_or_else(|| {
                StoreError::OutOfRange(format!("stock row {} quantity overflowed", existing.id))
            })?;
            return Ok(existing.clone());
        }
        self.work.last_stock_row += 1;
        let stored = row.clone().into_row(StockRowId::new(self.work.last_stock_row));
        self.work.stock.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn lock_exit_rows(&mut self, m: &ExitMatch) -> Result<Vec<StockRow>, StoreError> {
        Ok(self
            .work
            .stock
            .values()
            .filter(|r| r.item == m.item && r.cabinet == m.cabinet && r.casela == m.casela)
            .cloned()
            .collect())
    }

    async fn lock_cabinet_rows(&mut self, cabinet: CabinetId) -> Result<Vec<StockRow>, StoreError> {
        Ok(self
            .work
            .stock
            .values()
            .filter(|r| r.cabinet == cabinet)
            .cloned()
            .collect())
    }

    async fn set_stock_quantity(&mut self, id: StockRowId, quantity: i64) -> Result<(), StoreError> {
        if quantity < 0 {
            return Err(StoreError::Integrity("stock quantity cannot be negative".to_string()));
        }
        let row = self
            .work
            .stock
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("stock row {id} vanished")))?;
        row.quantity = quantity;
        Ok(())
    }

    async fn delete_stock_rows(&mut self, ids: &[StockRowId]) -> Result<(), StoreError> {
        for id in ids {
            self.work.stock.remove(id);
        }
        Ok(())
    }

    async fn list_stock(&mut self, filter: &StockFilter) -> Result<Vec<StockRow>, StoreError> {
        let mut rows: Vec<StockRow> = self
            .work
            .stock
            .values()
            .filter(|r| filter.matches_row(r))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.cabinet, r.id));
        Ok(rows)
    }

    async fn insert_movement(&mut self, movement: &NewMovement) -> Result<MovementRecord, StoreError> {
        if !self.movement_write_allowed() {
            return Err(StoreError::Backend("injected movement write failure".to_string()));
        }
        self.work.last_movement += 1;
        let record = movement.clone().into_record(MovementId::new(self.work.last_movement));
        self.work.movements.push(record.clone());
        Ok(record)
    }

    async fn list_movements(&mut self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError> {
        let mut records: Vec<MovementRecord> = self
            .work
            .movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn movements_by_key(&mut self, key: IdempotencyKey) -> Result<Vec<MovementRecord>, StoreError> {
        Ok(self
            .work
            .movements
            .iter()
            .filter(|m| m.idempotency_key == key)
            .cloned()
            .collect())
    }

    async fn lock_idempotency_key(&mut self, _key: IdempotencyKey) -> Result<(), StoreError> {
        // The store mutex already serialises every unit of work.
        Ok(())
    }

    async fn insert_operator(
        &mut self,
        login: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<Operator, StoreError> {
        if self.work.operators.values().any(|o| o.login == login) {
            return Err(StoreError::Duplicate(format!("login '{login}'")));
        }
        self.work.last_operator += 1;
        let operator = Operator {
            id: OperatorId::new(self.work.last_operator),
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            role: role.clone(),
        };
        self.work.operators.insert(operator.id, operator.clone());
        Ok(operator)
    }

    async fn find_operator(&mut self, login: &str) -> Result<Option<Operator>, StoreError> {
        Ok(self.work.operators.values().find(|o| o.login == login).cloned())
    }

    async fn count_operators(&mut self) -> Result<i64, StoreError> {
        Ok(self.work.operators.len() as i64)
    }

    async fn list_operators(&mut self) -> Result<Vec<Operator>, StoreError> {
        let mut operators: Vec<Operator> = self.work.operators.values().cloned().collect();
        operators.sort_by(|a, b| a.login.cmp(&b.login));
        Ok(operators)
    }

    async fn set_operator_password(
        &mut self,
        login: &str,
        password_hash: &str,
    ) -> Result<Option<Operator>, StoreError> {
        Ok(self
            .work
            .operators
            .values_mut()
            .find(|o| o.login == login)
            .map(|o| {
                o.password_hash = password_hash.to_string();
                o.clone()
            }))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
