//! Cabinet relocation.
//!
//! Inspect is read-only. `relocate` runs AwaitDestinations, Execute and Done in
//! one unit of work: either every origin row ends up in its destination with
//! an out/in movement pair, or nothing changes.

use std::sync::Arc;

use serde::Serialize;
use tracing::{Span, info, instrument, warn};

use medstock_core::{CabinetId, DomainError};
use medstock_ledger::{
    CabinetStockInfo, Destinations, Direction, MovementRecord, MovementType, RelocateCabinet,
    RelocationOutcome, RelocationPlan, RelocationState, StockFilter, plan_relocation,
};

use super::{ServiceError, finish};
use crate::store::{Store, StoreTx};

/// Result of Inspect: what the cabinet holds and where the flow goes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CabinetInspection {
    pub cabinet: CabinetId,
    #[serde(flatten)]
    pub info: CabinetStockInfo,
    /// State reached with no destinations supplied yet.
    pub next: RelocationState,
}

#[derive(Clone)]
pub struct RelocationCoordinator {
    store: Arc<dyn Store>,
}

impl RelocationCoordinator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(cabinet = %cabinet), err)]
    pub async fn inspect(&self, cabinet: CabinetId) -> Result<CabinetInspection, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = inspect_in(tx.as_mut(), cabinet).await;
        finish(tx, result).await
    }

    /// Empty `cmd.origin` into the supplied destinations.
    #[instrument(
        skip(self, cmd),
        fields(origin = %cmd.origin, key = %cmd.idempotency_key, moved_rows = tracing::field::Empty),
        err
    )]
    pub async fn relocate(&self, cmd: RelocateCabinet) -> Result<RelocationOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = relocate_in(tx.as_mut(), &cmd).await;
        let outcome = finish(tx, result).await?;
        Span::current().record("moved_rows", outcome.moved_rows);
        info!(
            movements = outcome.movements.len(),
            "cabinet relocation finished"
        );
        Ok(outcome)
    }
}

async fn inspect_in(tx: &mut dyn StoreTx, cabinet: CabinetId) -> Result<CabinetInspection, ServiceError> {
    if tx.get_cabinet(cabinet).await?.is_none() {
        return Err(DomainError::not_found(format!("cabinet {cabinet}")).into());
    }
    let rows = tx
        .list_stock(&StockFilter {
            cabinet: Some(cabinet),
            ..StockFilter::default()
        })
        .await?;
    let info = CabinetStockInfo::from_rows(&rows);
    Ok(CabinetInspection {
        cabinet,
        info,
        next: RelocationState::after_inspect(&info, &Destinations::default()),
    })
}

async fn relocate_in(
    tx: &mut dyn StoreTx,
    cmd: &RelocateCabinet,
) -> Result<RelocationOutcome, ServiceError> {
    tx.lock_idempotency_key(cmd.idempotency_key).await?;
    let recorded = tx.movements_by_key(cmd.idempotency_key).await?;
    if !recorded.is_empty() {
        return replayed_outcome(cmd, recorded);
    }

    if tx.get_cabinet(cmd.origin).await?.is_none() {
        return Err(DomainError::not_found(format!("cabinet {}", cmd.origin)).into());
    }

    let rows = tx.lock_cabinet_rows(cmd.origin).await?;
    let plan = plan_relocation(cmd.origin, &rows, &cmd.destinations)?;

    match execute(tx, cmd, &plan).await {
        Ok(movements) => Ok(RelocationOutcome {
            origin: cmd.origin,
            state: RelocationState::Done,
            moved_rows: plan.moves.len(),
            movements,
        }),
        Err(ServiceError::Domain(err @ DomainError::RelocationIncomplete(_))) => Err(err.into()),
        Err(err) => {
            warn!(error = %err, "relocation execute failed");
            Err(DomainError::relocation_incomplete(err.to_string()).into())
        }
    }
}

async fn execute(
    tx: &mut dyn StoreTx,
    cmd: &RelocateCabinet,
    plan: &RelocationPlan,
) -> Result<Vec<MovementRecord>, ServiceError> {
    for destination in [cmd.destinations.medicines, cmd.destinations.inputs]
        .into_iter()
        .flatten()
    {
        let used = plan.moves.iter().any(|m| m.to.cabinet == destination);
        if used && tx.get_cabinet(destination).await?.is_none() {
            return Err(DomainError::relocation_incomplete(format!(
                "destination cabinet {destination} does not exist"
            ))
            .into());
        }
    }

    tx.delete_stock_rows(&plan.cleared_rows).await?;
    for m in &plan.moves {
        tx.upsert_stock_row(&m.to).await?;
    }

    let mut movements = Vec::new();
    for movement in plan.movements(cmd.idempotency_key, cmd.operator, cmd.occurred_at) {
        movements.push(tx.insert_movement(&movement).await?);
    }
    Ok(movements)
}

fn replayed_outcome(
    cmd: &RelocateCabinet,
    recorded: Vec<MovementRecord>,
) -> Result<RelocationOutcome, ServiceError> {
    let same = recorded.iter().all(|m| m.movement_type == MovementType::Relocation)
        && recorded
            .iter()
            .filter(|m| m.direction == Direction::Out)
            .all(|m| m.cabinet == cmd.origin);
    if !same {
        return Err(DomainError::conflict(format!(
            "idempotency key {} was already used for a different operation",
            cmd.idempotency_key
        ))
        .into());
    }
    info!(key = %cmd.idempotency_key, "idempotent relocation replay");
    Ok(RelocationOutcome {
        origin: cmd.origin,
        state: RelocationState::Done,
        moved_rows: recorded.len() / 2,
        movements: recorded,
    })
}
