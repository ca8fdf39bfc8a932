use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medstock_auth::Operator;
use medstock_core::{CabinetId, Casela, DomainError, DomainResult, InputId, MedicineId};
use medstock_ledger::{
    Direction, ItemKind, ItemRef, MedicineAttrs, MovementFilter, MovementType, StockFilter,
    StockType,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    /// Medicine-only; omitted means general stock without expiry.
    #[serde(default)]
    pub attrs: Option<MedicineAttrs>,
}

#[derive(Debug, Deserialize)]
pub struct ExitRequest {
    pub item: ItemRef,
    pub cabinet: CabinetId,
    pub quantity: i64,
    #[serde(default)]
    pub casela: Option<Casela>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCabinetRequest {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResidentRequest {
    pub name: String,
}

/// `GET /stock` query string.
#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub cabinet: Option<i32>,
    pub kind: Option<String>,
    pub medicine: Option<i64>,
    pub input: Option<i64>,
    pub casela: Option<i32>,
    pub stock_type: Option<String>,
    #[serde(default)]
    pub zero_quantity: bool,
    #[serde(default)]
    pub below_minimum: bool,
    #[serde(default)]
    pub near_minimum: bool,
    #[serde(default)]
    pub expired: bool,
    pub expiring_within_days: Option<i64>,
}

impl StockQuery {
    pub fn into_filter(self) -> DomainResult<StockFilter> {
        Ok(StockFilter {
            cabinet: self.cabinet.map(CabinetId::new),
            item_kind: parse_opt(self.kind.as_deref(), "kind", ItemKind::parse)?,
            item: item_ref(self.medicine, self.input)?,
            casela: self.casela.map(Casela::new),
            stock_type: parse_opt(self.stock_type.as_deref(), "stock_type", StockType::parse)?,
            zero_quantity: self.zero_quantity,
            below_minimum: self.below_minimum,
            near_minimum: self.near_minimum,
            expired: self.expired,
            expiring_within_days: self.expiring_within_days,
        })
    }
}

/// `GET /movements` and `GET /reports/movements` query string.
#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    pub direction: Option<String>,
    pub kind: Option<String>,
    pub medicine: Option<i64>,
    pub input: Option<i64>,
    pub cabinet: Option<i32>,
    pub casela: Option<i32>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Shortcut for "the last N days".
    pub last_days: Option<i64>,
}

impl MovementQuery {
    pub fn into_filter(self, now: DateTime<Utc>) -> DomainResult<MovementFilter> {
        let filter = MovementFilter {
            movement_type: parse_opt(self.movement_type.as_deref(), "type", MovementType::parse)?,
            direction: parse_opt(self.direction.as_deref(), "direction", Direction::parse)?,
            item: item_ref(self.medicine, self.input)?,
            item_kind: parse_opt(self.kind.as_deref(), "kind", ItemKind::parse)?,
            cabinet: self.cabinet.map(CabinetId::new),
            casela: self.casela.map(Casela::new),
            from: self.from,
            to: self.to,
        };
        match self.last_days {
            Some(days) => filter.within_last_days(now, days),
            None => Ok(filter),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StockReportQuery {
    pub kind: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub operator: Operator,
}

fn parse_opt<T>(
    value: Option<&str>,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> DomainResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| DomainError::validation(format!("invalid {field} '{raw}'"))),
    }
}

fn item_ref(medicine: Option<i64>, input: Option<i64>) -> DomainResult<Option<ItemRef>> {
    match (medicine, input) {
        (Some(_), Some(_)) => Err(DomainError::validation(
            "filter by medicine or input, not both",
        )),
        (Some(id), None) => Ok(Some(ItemRef::Medicine(MedicineId::new(id)))),
        (None, Some(id)) => Ok(Some(ItemRef::Input(InputId::new(id)))),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_query_accepts_portuguese_stock_type() {
        let filter = StockQuery {
            stock_type: Some("geral".into()),
            cabinet: Some(3),
            ..StockQuery::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.stock_type, Some(StockType::General));
        assert_eq!(filter.cabinet, Some(CabinetId::new(3)));
    }

    #[test]
    fn medicine_and_input_together_is_rejected() {
        let err = StockQuery {
            medicine: Some(1),
            input: Some(2),
            ..StockQuery::default()
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn last_days_sets_lower_bound() {
        let now = Utc::now();
        let filter = MovementQuery {
            movement_type: Some("saida".into()),
            last_days: Some(7),
            ..MovementQuery::default()
        }
        .into_filter(now)
        .unwrap();
        assert_eq!(filter.movement_type, Some(MovementType::Exit));
        assert_eq!(filter.from, Some(now - chrono::Duration::days(7)));
    }

    #[test]
    fn huge_last_days_is_a_validation_error() {
        let err = MovementQuery {
            last_days: Some(1_000_000_000),
            ..MovementQuery::default()
        }
        .into_filter(Utc::now())
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_direction_is_a_validation_error() {
        let err = MovementQuery {
            direction: Some("sideways".into()),
            ..MovementQuery::default()
        }
        .into_filter(Utc::now())
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
