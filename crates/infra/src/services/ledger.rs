//! Stock ledger: entries, exits and stock queries.
//!
//! ## Unit of work
//!
//! ```text
//! validate command (no IO)
//!   ↓
//! begin
//!   ↓
//! lock idempotency key → replay if already recorded
//!   ↓
//! check catalog references
//!   ↓
//! lock / upsert stock rows
//!   ↓
//! append exactly one movement
//!   ↓
//! commit (any error above rolls everything back)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{Span, info, instrument};

use medstock_core::{CabinetId, Casela, DomainError, IdempotencyKey, StockRowId};
use medstock_ledger::{
    Direction, ExitMatch, ItemRef, MovementRecord, MovementType, NewMovement, NewStockRow,
    RecordEntry, RecordExit, StockFilter, StockPolicy, StockRow, StockSummary, StockView,
    plan_exit, summarize,
};

use super::{ServiceError, finish};
use crate::config::StockSettings;
use crate::store::{Store, StoreError, StoreTx};

/// What a mutating ledger call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerReceipt {
    /// The movement(s) recorded under the call's idempotency key.
    pub movements: Vec<MovementRecord>,
    /// Rows as left by this call; empty on replay.
    pub rows: Vec<StockRow>,
    /// True when the key had already been recorded and nothing changed.
    pub replayed: bool,
}

impl LedgerReceipt {
    fn replay(movements: Vec<MovementRecord>) -> Self {
        Self {
            movements,
            rows: Vec::new(),
            replayed: true,
        }
    }
}

#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn Store>,
    settings: StockSettings,
}

impl StockLedger {
    pub fn new(store: Arc<dyn Store>, settings: StockSettings) -> Self {
        Self { store, settings }
    }

    pub fn policy(&self, today: NaiveDate) -> StockPolicy {
        StockPolicy {
            today,
            expiring_soon_days: self.settings.expiring_soon_days,
            near_minimum_margin_percent: self.settings.near_minimum_margin_percent,
        }
    }

    /// Add stock, merging into the row with the same (item, cabinet, casela, expiry).
    #[instrument(
        skip(self, cmd),
        fields(item = %cmd.item, cabinet = %cmd.cabinet, quantity = cmd.quantity, key = %cmd.idempotency_key, replayed = tracing::field::Empty),
        err
    )]
    pub async fn record_entry(&self, cmd: RecordEntry) -> Result<LedgerReceipt, ServiceError> {
        let new_row = cmd.stock_row()?;

        let mut tx = self.store.begin().await?;
        let result = apply_entry(tx.as_mut(), &cmd, new_row).await;
        let receipt = finish(tx, result).await?;
        Span::current().record("replayed", receipt.replayed);
        if !receipt.replayed {
            info!(row_id = ?receipt.rows.first().map(|r| r.id), "stock entry recorded");
        }
        Ok(receipt)
    }

    /// Remove stock FIFO by expiry from the matching rows.
    #[instrument(
        skip(self, cmd),
        fields(item = %cmd.item, cabinet = %cmd.cabinet, quantity = cmd.quantity, key = %cmd.idempotency_key, replayed = tracing::field::Empty),
        err
    )]
    pub async fn record_exit(&self, cmd: RecordExit) -> Result<LedgerReceipt, ServiceError> {
        let exit_match = cmd.exit_match()?;

        let mut tx = self.store.begin().await?;
        let result = apply_exit(tx.as_mut(), &cmd, &exit_match).await;
        let receipt = finish(tx, result).await?;
        Span::current().record("replayed", receipt.replayed);
        if !receipt.replayed {
            info!(rows_touched = receipt.rows.len(), "stock exit recorded");
        }
        Ok(receipt)
    }

    /// Stock snapshot with derived predicates evaluated against `today`.
    #[instrument(skip(self, filter), err)]
    pub async fn query_stock(
        &self,
        filter: &StockFilter,
        today: NaiveDate,
    ) -> Result<Vec<StockView>, ServiceError> {
        let policy = self.policy(today);
        let mut tx = self.store.begin().await?;
        let result = snapshot(tx.as_mut(), filter, &policy).await;
        finish(tx, result).await
    }

    /// Dashboard figures over the whole ledger.
    pub async fn summary(&self, today: NaiveDate) -> Result<StockSummary, ServiceError> {
        let views = self.query_stock(&StockFilter::default(), today).await?;
        Ok(summarize(&views, &self.policy(today)))
    }
}

async fn apply_entry(
    tx: &mut dyn StoreTx,
    cmd: &RecordEntry,
    new_row: NewStockRow,
) -> Result<LedgerReceipt, ServiceError> {
    tx.lock_idempotency_key(cmd.idempotency_key).await?;
    if let Some(receipt) =
        replay(tx, &cmd.idempotency_key, MovementType::Entry, cmd.item, cmd.cabinet, cmd.quantity)
            .await?
    {
        return Ok(receipt);
    }

    ensure_item_exists(tx, cmd.item).await?;
    if tx.get_cabinet(cmd.cabinet).await?.is_none() {
        return Err(DomainError::unknown_reference(format!("cabinet {}", cmd.cabinet)).into());
    }
    ensure_resident_exists(tx, new_row.casela).await?;

    let row = match tx.upsert_stock_row(&new_row).await {
        Ok(row) => row,
        Err(StoreError::OutOfRange(_)) => {
            return Err(DomainError::quantity_overflow(format!(
                "adding {} to {} in cabinet {} exceeds the largest storable quantity",
                cmd.quantity, cmd.item, cmd.cabinet
            ))
            .into());
        }
        Err(err) => return Err(err.into()),
    };
    let movement = tx
        .insert_movement(&NewMovement {
            movement_type: MovementType::Entry,
            direction: Direction::In,
            occurred_at: cmd.occurred_at,
            operator: cmd.operator,
            item: cmd.item,
            cabinet: cmd.cabinet,
            quantity: cmd.quantity,
            casela: row.casela,
            expiry: row.expiry,
            idempotency_key: cmd.idempotency_key,
        })
        .await?;

    Ok(LedgerReceipt {
        movements: vec![movement],
        rows: vec![row],
        replayed: false,
    })
}

async fn apply_exit(
    tx: &mut dyn StoreTx,
    cmd: &RecordExit,
    exit_match: &ExitMatch,
) -> Result<LedgerReceipt, ServiceError> {
    tx.lock_idempotency_key(cmd.idempotency_key).await?;
    if let Some(receipt) =
        replay(tx, &cmd.idempotency_key, MovementType::Exit, cmd.item, cmd.cabinet, cmd.quantity)
            .await?
    {
        return Ok(receipt);
    }

    ensure_item_exists(tx, cmd.item).await?;
    if tx.get_cabinet(cmd.cabinet).await?.is_none() {
        return Err(DomainError::unknown_reference(format!("cabinet {}", cmd.cabinet)).into());
    }
    ensure_resident_exists(tx, cmd.casela).await?;

    let expected_type = exit_match.stock_type();
    let mut rows: Vec<StockRow> = tx
        .lock_exit_rows(exit_match)
        .await?
        .into_iter()
        .filter(|r| r.stock_type == expected_type)
        .collect();
    let plan = plan_exit(&rows, cmd.quantity)?;

    let remaining: HashMap<StockRowId, i64> =
        plan.draws.iter().map(|d| (d.row_id, d.remaining)).collect();
    for draw in &plan.draws {
        tx.set_stock_quantity(draw.row_id, draw.remaining).await?;
    }
    rows.retain(|r| remaining.contains_key(&r.id));
    for row in &mut rows {
        if let Some(q) = remaining.get(&row.id) {
            row.quantity = *q;
        }
    }

    let movement = tx
        .insert_movement(&NewMovement {
            movement_type: MovementType::Exit,
            direction: Direction::Out,
            occurred_at: cmd.occurred_at,
            operator: cmd.operator,
            item: cmd.item,
            cabinet: cmd.cabinet,
            quantity: plan.total_taken(),
            casela: cmd.casela,
            expiry: plan.first_expiry(),
            idempotency_key: cmd.idempotency_key,
        })
        .await?;

    Ok(LedgerReceipt {
        movements: vec![movement],
        rows,
        replayed: false,
    })
}

/// `Some(receipt)` when `key` was already used for this very operation;
/// `Conflict` when it was used for something else.
async fn replay(
    tx: &mut dyn StoreTx,
    key: &IdempotencyKey,
    movement_type: MovementType,
    item: ItemRef,
    cabinet: CabinetId,
    quantity: i64,
) -> Result<Option<LedgerReceipt>, ServiceError> {
    let recorded = tx.movements_by_key(*key).await?;
    if recorded.is_empty() {
        return Ok(None);
    }
    let same = recorded.len() == 1
        && recorded.iter().all(|m| {
            m.movement_type == movement_type
                && m.item == item
                && m.cabinet == cabinet
                && m.quantity == quantity
        });
    if !same {
        return Err(DomainError::conflict(format!(
            "idempotency key {key} was already used for a different operation"
        ))
        .into());
    }
    info!(key = %key, "idempotent replay");
    Ok(Some(LedgerReceipt::replay(recorded)))
}

async fn snapshot(
    tx: &mut dyn StoreTx,
    filter: &StockFilter,
    policy: &StockPolicy,
) -> Result<Vec<StockView>, ServiceError> {
    let rows = tx.list_stock(filter).await?;
    let views = load_views(tx, rows).await?;
    Ok(views
        .into_iter()
        .filter(|v| filter.matches(v, policy))
        .collect())
}

async fn ensure_item_exists(tx: &mut dyn StoreTx, item: ItemRef) -> Result<(), ServiceError> {
    let exists = match item {
        ItemRef::Medicine(id) => tx.get_medicine(id).await?.is_some(),
        ItemRef::Input(id) => tx.get_input(id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(DomainError::unknown_reference(item.to_string()).into())
    }
}

async fn ensure_resident_exists(
    tx: &mut dyn StoreTx,
    casela: Option<Casela>,
) -> Result<(), ServiceError> {
    let Some(casela) = casela else {
        return Ok(());
    };
    if tx.get_resident(casela).await?.is_none() {
        return Err(DomainError::unknown_reference(format!("resident in casela {casela}")).into());
    }
    Ok(())
}

async fn load_views(tx: &mut dyn StoreTx, rows: Vec<StockRow>) -> Result<Vec<StockView>, ServiceError> {
    let medicines: HashMap<_, _> = tx.list_medicines().await?.into_iter().map(|m| (m.id, m)).collect();
    let inputs: HashMap<_, _> = tx.list_inputs().await?.into_iter().map(|i| (i.id, i)).collect();
    let residents: HashMap<_, _> = tx
        .list_residents()
        .await?
        .into_iter()
        .map(|r| (r.casela, r))
        .collect();

    rows.into_iter()
        .map(|row| {
            let view = match row.item {
                ItemRef::Medicine(id) => medicines.get(&id).map(|m| {
                    let resident = row.casela.and_then(|c| residents.get(&c));
                    StockView::for_medicine(row.clone(), m, resident)
                }),
                ItemRef::Input(id) => inputs.get(&id).map(|i| StockView::for_input(row.clone(), i)),
            };
            view.ok_or_else(|| {
                ServiceError::from(StoreError::Integrity(format!(
                    "stock row {} references missing {}",
                    row.id, row.item
                )))
            })
        })
        .collect()
}
