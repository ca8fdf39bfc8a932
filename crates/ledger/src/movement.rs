//! Movement log records (append-only audit trail).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use medstock_core::{
    CabinetId, Casela, DomainError, DomainResult, Entity, IdempotencyKey, MovementId, OperatorId,
};

use crate::item::{ItemKind, ItemRef};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Entry,
    Exit,
    Relocation,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::Entry => "entry",
            MovementType::Exit => "exit",
            MovementType::Relocation => "relocation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "entrada" => Some(MovementType::Entry),
            "exit" | "saida" => Some(MovementType::Exit),
            "relocation" => Some(MovementType::Relocation),
            _ => None,
        }
    }
}

/// Whether the movement added stock to its cabinet or took stock from it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

/// One stored movement. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    pub movement_type: MovementType,
    pub direction: Direction,
    pub occurred_at: DateTime<Utc>,
    pub operator: OperatorId,
    pub item: ItemRef,
    /// Destination for entries and relocation-in, origin for exits and relocation-out.
    pub cabinet: CabinetId,
    pub quantity: i64,
    pub casela: Option<Casela>,
    pub expiry: Option<NaiveDate>,
    pub idempotency_key: IdempotencyKey,
}

impl Entity for MovementRecord {
    type Id = MovementId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A movement about to be appended (id assigned by storage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub direction: Direction,
    pub occurred_at: DateTime<Utc>,
    pub operator: OperatorId,
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    pub casela: Option<Casela>,
    pub expiry: Option<NaiveDate>,
    pub idempotency_key: IdempotencyKey,
}

impl NewMovement {
    pub fn into_record(self, id: MovementId) -> MovementRecord {
        MovementRecord {
            id,
            movement_type: self.movement_type,
            direction: self.direction,
            occurred_at: self.occurred_at,
            operator: self.operator,
            item: self.item,
            cabinet: self.cabinet,
            quantity: self.quantity,
            casela: self.casela,
            expiry: self.expiry,
            idempotency_key: self.idempotency_key,
        }
    }
}

/// Filters for the transaction-history view. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub movement_type: Option<MovementType>,
    pub direction: Option<Direction>,
    pub item: Option<ItemRef>,
    pub item_kind: Option<ItemKind>,
    pub cabinet: Option<CabinetId>,
    pub casela: Option<Casela>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl MovementFilter {
    /// Restrict to the `days` days before `now` (tightens an existing lower bound, never loosens it).
    ///
    /// A window reaching past the representable date range is a validation error.
    pub fn within_last_days(mut self, now: DateTime<Utc>, days: i64) -> DomainResult<Self> {
        let since = Duration::try_days(days.max(0))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| DomainError::validation(format!("last_days {days} is out of range")))?;
        self.from = Some(self.from.map_or(since, |from| from.max(since)));
        Ok(self)
    }

    pub fn matches(&self, m: &MovementRecord) -> bool {
        self.movement_type.is_none_or(|t| m.movement_type == t)
            && self.direction.is_none_or(|d| m.direction == d)
            && self.item.is_none_or(|i| m.item == i)
            && self.item_kind.is_none_or(|k| m.item.kind() == k)
            && self.cabinet.is_none_or(|c| m.cabinet == c)
            && self.casela.is_none_or(|c| m.casela == Some(c))
            && self.from.is_none_or(|from| m.occurred_at >= from)
            && self.to.is_none_or(|to| m.occurred_at < to)
    }
}

/// Newest first; ties (same timestamp) by descending id.
pub fn sort_newest_first(records: &mut [MovementRecord]) {
    records.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
