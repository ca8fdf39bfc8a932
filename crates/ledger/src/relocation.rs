//! Cabinet relocation: move every stock row out of a cabinet so it can be
//! deleted or repurposed.
//!
//! The flow is Inspect → AwaitDestinations → Execute → Done. Inspection and
//! planning are pure and live here; execution (one transaction) lives in the
//! infrastructure layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medstock_core::{CabinetId, DomainError, DomainResult, IdempotencyKey, OperatorId, StockRowId};

use crate::item::{ItemKind, ItemRef};
use crate::movement::{Direction, MovementRecord, MovementType, NewMovement};
use crate::stock::{NewStockRow, StockRow};

/// What an Inspect found: which item kinds still hold a positive quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetStockInfo {
    pub has_medicine_stock: bool,
    pub has_input_stock: bool,
}

impl CabinetStockInfo {
    pub fn from_rows(rows: &[StockRow]) -> Self {
        let holds = |kind: ItemKind| rows.iter().any(|r| r.item.kind() == kind && r.quantity > 0);
        Self {
            has_medicine_stock: holds(ItemKind::Medicine),
            has_input_stock: holds(ItemKind::Input),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.has_medicine_stock && !self.has_input_stock
    }
}

/// Destination cabinet per item kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destinations {
    pub medicines: Option<CabinetId>,
    pub inputs: Option<CabinetId>,
}

impl Destinations {
    pub fn for_kind(&self, kind: ItemKind) -> Option<CabinetId> {
        match kind {
            ItemKind::Medicine => self.medicines,
            ItemKind::Input => self.inputs,
        }
    }
}

/// Command: empty `origin` into the given destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocateCabinet {
    pub idempotency_key: IdempotencyKey,
    pub operator: OperatorId,
    pub origin: CabinetId,
    pub destinations: Destinations,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RelocationState {
    Inspect,
    /// A destination is still missing for the flagged kinds.
    AwaitDestinations { medicines: bool, inputs: bool },
    Execute,
    Done,
}

impl RelocationState {
    /// Next state after Inspect, given the destinations supplied so far.
    pub fn after_inspect(info: &CabinetStockInfo, destinations: &Destinations) -> Self {
        let medicines = info.has_medicine_stock && destinations.medicines.is_none();
        let inputs = info.has_input_stock && destinations.inputs.is_none();
        if medicines || inputs {
            RelocationState::AwaitDestinations { medicines, inputs }
        } else {
            RelocationState::Execute
        }
    }
}

/// One origin row moved in full to its destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationMove {
    pub from_row: StockRowId,
    /// Same batch attributes, destination cabinet, full quantity.
    pub to: NewStockRow,
}

impl RelocationMove {
    pub fn item(&self) -> ItemRef {
        self.to.item
    }

    pub fn quantity(&self) -> i64 {
        self.to.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationPlan {
    pub origin: CabinetId,
    pub moves: Vec<RelocationMove>,
    /// Every origin row, including known-empty ones; all are removed.
    pub cleared_rows: Vec<StockRowId>,
}

impl RelocationPlan {
    /// The out + in movement pair for every move, in move order.
    pub fn movements(
        &self,
        key: IdempotencyKey,
        operator: OperatorId,
        at: DateTime<Utc>,
    ) -> Vec<NewMovement> {
        self.moves
            .iter()
            .flat_map(|m| {
                let base = NewMovement {
                    movement_type: MovementType::Relocation,
                    direction: Direction::Out,
                    occurred_at: at,
                    operator,
                    item: m.to.item,
                    cabinet: self.origin,
                    quantity: m.to.quantity,
                    casela: m.to.casela,
                    expiry: m.to.expiry,
                    idempotency_key: key,
                };
                let incoming = NewMovement {
                    direction: Direction::In,
                    cabinet: m.to.cabinet,
                    ..base.clone()
                };
                [base, incoming]
            })
            .collect()
    }
}

/// Plan a relocation of `rows` (all rows of `origin`).
///
/// Fails with `DestinationsRequired` while a needed destination is missing and
/// with `RelocationIncomplete` when a destination is the origin itself.
pub fn plan_relocation(
    origin: CabinetId,
    rows: &[StockRow],
    destinations: &Destinations,
) -> DomainResult<RelocationPlan> {
    let info = CabinetStockInfo::from_rows(rows);
    if let RelocationState::AwaitDestinations { medicines, inputs } =
        RelocationState::after_inspect(&info, destinations)
    {
        return Err(DomainError::DestinationsRequired { medicines, inputs });
    }

    let mut moves = Vec::new();
    for row in rows.iter().filter(|r| r.quantity > 0) {
        let kind = row.item.kind();
        let destination = destinations.for_kind(kind).ok_or_else(|| {
            DomainError::relocation_incomplete(format!("no destination for {}", kind.as_str()))
        })?;
        if destination == origin {
            return Err(DomainError::relocation_incomplete(format!(
                "destination for {} is the origin cabinet {origin}",
                kind.as_str()
            )));
        }
        moves.push(RelocationMove {
            from_row: row.id,
            to: row.to_new_row(destination, row.quantity),
        });
    }

    Ok(RelocationPlan {
        origin,
        moves,
        cleared_rows: rows.iter().map(|r| r.id).collect(),
    })
}

/// Result of a finished (or replayed) relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationOutcome {
    pub origin: CabinetId,
    pub state: RelocationState,
    pub moved_rows: usize,
    pub movements: Vec<MovementRecord>,
}
