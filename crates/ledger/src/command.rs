//! Ledger commands: stock entries and exits.
//!
//! Commands carry everything a unit of work needs (operator, idempotency key,
//! timestamp) so the infrastructure layer never has to invent values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medstock_core::{
    CabinetId, Casela, DomainError, DomainResult, IdempotencyKey, OperatorId,
    ensure_positive_quantity,
};

use crate::item::ItemRef;
use crate::stock::{MedicineAttrs, NewStockRow, StockType};

/// Command: add `quantity` units of an item to a cabinet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub idempotency_key: IdempotencyKey,
    pub operator: OperatorId,
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    /// Medicine batches only. `None` on a medicine means general stock without expiry.
    pub attrs: Option<MedicineAttrs>,
    pub occurred_at: DateTime<Utc>,
}

impl RecordEntry {
    /// Validate the command and derive the row to create or merge into.
    pub fn stock_row(&self) -> DomainResult<NewStockRow> {
        ensure_positive_quantity(self.quantity)?;

        match self.item {
            ItemRef::Medicine(_) => {
                let attrs = self.attrs.clone().unwrap_or_else(|| MedicineAttrs::general(None));
                attrs.validate()?;
                Ok(NewStockRow {
                    item: self.item,
                    cabinet: self.cabinet,
                    quantity: self.quantity,
                    expiry: attrs.expiry,
                    origin: attrs
                        .origin
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty()),
                    stock_type: Some(attrs.stock_type),
                    casela: attrs.casela,
                })
            }
            ItemRef::Input(_) => {
                if self.attrs.is_some() {
                    return Err(DomainError::invalid_association(
                        "inputs do not carry expiry, origin or resident attributes",
                    ));
                }
                Ok(NewStockRow {
                    item: self.item,
                    cabinet: self.cabinet,
                    quantity: self.quantity,
                    expiry: None,
                    origin: None,
                    stock_type: None,
                    casela: None,
                })
            }
        }
    }
}

/// Command: remove `quantity` units of an item from a cabinet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordExit {
    pub idempotency_key: IdempotencyKey,
    pub operator: OperatorId,
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    /// Draw from this resident's individual stock instead of general stock.
    pub casela: Option<Casela>,
    pub occurred_at: DateTime<Utc>,
}

/// Which stock rows an exit may draw from: exact item + cabinet, and either
/// general rows (no casela) or one resident's individual rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExitMatch {
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub casela: Option<Casela>,
}

impl ExitMatch {
    pub fn stock_type(&self) -> Option<StockType> {
        match (self.item, self.casela) {
            (ItemRef::Input(_), _) => None,
            (ItemRef::Medicine(_), None) => Some(StockType::General),
            (ItemRef::Medicine(_), Some(_)) => Some(StockType::Individual),
        }
    }
}

impl RecordExit {
    pub fn exit_match(&self) -> DomainResult<ExitMatch> {
        ensure_positive_quantity(self.quantity)?;

        if let (ItemRef::Input(_), Some(casela)) = (self.item, self.casela) {
            return Err(DomainError::invalid_association(format!(
                "inputs are not kept per resident (casela {casela})"
            )));
        }

        Ok(ExitMatch {
            item: self.item,
            cabinet: self.cabinet,
            casela: self.casela,
        })
    }
}
