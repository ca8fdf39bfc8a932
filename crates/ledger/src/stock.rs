use core::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medstock_core::{CabinetId, Casela, DomainError, DomainResult, Entity, StockRowId, ValueObject};

use crate::item::ItemRef;

/// General stock is shared by all residents; individual stock is earmarked for one casela.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockType {
    General,
    Individual,
}

impl StockType {
    pub fn as_str(self) -> &'static str {
        match self {
            StockType::General => "general",
            StockType::Individual => "individual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "general" | "geral" => Some(StockType::General),
            "individual" => Some(StockType::Individual),
            _ => None,
        }
    }
}

/// Medicine-only attributes of a stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineAttrs {
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    /// Where the batch came from (donation, purchase, family, ...).
    #[serde(default)]
    pub origin: Option<String>,
    pub stock_type: StockType,
    #[serde(default)]
    pub casela: Option<Casela>,
}

impl MedicineAttrs {
    pub fn general(expiry: Option<NaiveDate>) -> Self {
        Self {
            expiry,
            origin: None,
            stock_type: StockType::General,
            casela: None,
        }
    }

    pub fn individual(casela: Casela, expiry: Option<NaiveDate>) -> Self {
        Self {
            expiry,
            origin: None,
            stock_type: StockType::Individual,
            casela: Some(casela),
        }
    }

    /// A casela is required for individual stock and forbidden for general stock.
    pub fn validate(&self) -> DomainResult<()> {
        match (self.stock_type, self.casela) {
            (StockType::Individual, None) => Err(DomainError::invalid_association(
                "individual stock requires a resident casela",
            )),
            (StockType::General, Some(casela)) => Err(DomainError::invalid_association(format!(
                "general stock cannot be assigned to casela {casela}"
            ))),
            _ => Ok(()),
        }
    }
}

/// A ledger row: the quantity of one item batch held in one cabinet.
///
/// A row with quantity 0 stays in the ledger ("known empty").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub id: StockRowId,
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    pub expiry: Option<NaiveDate>,
    pub origin: Option<String>,
    pub stock_type: Option<StockType>,
    pub casela: Option<Casela>,
}

impl Entity for StockRow {
    type Id = StockRowId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl StockRow {
    pub fn key(&self) -> StockKey {
        StockKey {
            item: self.item,
            cabinet: self.cabinet,
            casela: self.casela,
            expiry: self.expiry,
        }
    }

    /// The attributes needed to re-create this batch elsewhere (relocation).
    pub fn to_new_row(&self, cabinet: CabinetId, quantity: i64) -> NewStockRow {
        NewStockRow {
            item: self.item,
            cabinet,
            quantity,
            expiry: self.expiry,
            origin: self.origin.clone(),
            stock_type: self.stock_type,
            casela: self.casela,
        }
    }
}

/// Consumption order: earliest expiry first, undated batches last, then insertion order.
pub fn fifo_cmp(a: &StockRow, b: &StockRow) -> Ordering {
    let by_expiry = match (a.expiry, b.expiry) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_expiry.then_with(|| a.id.cmp(&b.id))
}

/// Uniqueness key of a stock row; entries with an equal key merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub casela: Option<Casela>,
    pub expiry: Option<NaiveDate>,
}

impl ValueObject for StockKey {}

/// A stock row that has not been stored yet (or a quantity to merge into an existing one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockRow {
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    pub expiry: Option<NaiveDate>,
    pub origin: Option<String>,
    pub stock_type: Option<StockType>,
    pub casela: Option<Casela>,
}

impl NewStockRow {
    pub fn key(&self) -> StockKey {
        StockKey {
            item: self.item,
            cabinet: self.cabinet,
            casela: self.casela,
            expiry: self.expiry,
        }
    }

    pub fn into_row(self, id: StockRowId) -> StockRow {
        StockRow {
            id,
            item: self.item,
            cabinet: self.cabinet,
            quantity: self.quantity,
            expiry: self.expiry,
            origin: self.origin,
            stock_type: self.stock_type,
            casela: self.casela,
        }
    }
}
