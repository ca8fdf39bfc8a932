//! Stock report aggregation.
//!
//! Medicines are grouped by (name, active substance, resident) with the
//! earliest expiry of the group; inputs by (name, cabinet).

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medstock_core::CabinetId;
use medstock_ledger::{ItemKind, StockView};

use crate::ReportError;
use crate::table::{ReportTable, format_date};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Medicines,
    Inputs,
}

impl ReportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "medicines" | "medicamentos" => Some(ReportKind::Medicines),
            "inputs" | "insumos" => Some(ReportKind::Inputs),
            _ => None,
        }
    }

    pub fn item_kind(self) -> ItemKind {
        match self {
            ReportKind::Medicines => ItemKind::Medicine,
            ReportKind::Inputs => ItemKind::Input,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Medicines => "Medicine stock report",
            ReportKind::Inputs => "Input stock report",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::parse(s).ok_or_else(|| ReportError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicineLine {
    pub name: String,
    pub active_substance: String,
    pub quantity: i64,
    pub earliest_expiry: Option<NaiveDate>,
    /// `None` for general stock.
    pub resident: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputLine {
    pub name: String,
    pub quantity: i64,
    pub cabinet: CabinetId,
}

pub fn medicine_lines(views: &[StockView]) -> Vec<MedicineLine> {
    let mut groups: BTreeMap<(String, String, Option<String>), (i64, Option<NaiveDate>)> =
        BTreeMap::new();

    for v in views.iter().filter(|v| v.row.item.kind() == ItemKind::Medicine) {
        let key = (
            v.item_name.clone(),
            v.item_detail.clone().unwrap_or_default(),
            v.resident_name.clone(),
        );
        let (quantity, expiry) = groups.entry(key).or_insert((0, None));
        *quantity += v.row.quantity;
        *expiry = match (*expiry, v.row.expiry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    groups
        .into_iter()
        .map(|((name, active_substance, resident), (quantity, earliest_expiry))| MedicineLine {
            name,
            active_substance,
            quantity,
            earliest_expiry,
            resident,
        })
        .collect()
}

pub fn input_lines(views: &[StockView]) -> Vec<InputLine> {
    let mut groups: BTreeMap<(String, CabinetId), i64> = BTreeMap::new();
    for v in views.iter().filter(|v| v.row.item.kind() == ItemKind::Input) {
        *groups.entry((v.item_name.clone(), v.row.cabinet)).or_default() += v.row.quantity;
    }
    groups
        .into_iter()
        .map(|((name, cabinet), quantity)| InputLine {
            name,
            quantity,
            cabinet,
        })
        .collect()
}

/// Fixed column layout per report kind.
pub fn stock_table(kind: ReportKind, views: &[StockView]) -> ReportTable {
    match kind {
        ReportKind::Medicines => ReportTable {
            title: kind.title().to_string(),
            headers: vec!["Name", "Active substance", "Quantity", "Expiry", "Resident"],
            rows: medicine_lines(views)
                .into_iter()
                .map(|l| {
                    vec![
                        l.name,
                        l.active_substance,
                        l.quantity.to_string(),
                        format_date(l.earliest_expiry),
                        l.resident.unwrap_or_else(|| "General".to_string()),
                    ]
                })
                .collect(),
        },
        ReportKind::Inputs => ReportTable {
            title: kind.title().to_string(),
            headers: vec!["Name", "Quantity", "Cabinet"],
            rows: input_lines(views)
                .into_iter()
                .map(|l| vec![l.name, l.quantity.to_string(), l.cabinet.to_string()])
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medstock_core::{Casela, InputId, MedicineId, StockRowId};
    use medstock_ledger::{ItemRef, StockRow, StockType};

    fn view(
        item: ItemRef,
        name: &str,
        cabinet: i32,
        quantity: i64,
        expiry: Option<&str>,
        resident: Option<&str>,
    ) -> StockView {
        StockView {
            row: StockRow {
                id: StockRowId::new(1),
                item,
                cabinet: CabinetId::new(cabinet),
                quantity,
                expiry: expiry.map(|e| e.parse().unwrap()),
                origin: None,
                stock_type: match (item.kind(), resident) {
                    (ItemKind::Input, _) => None,
                    (_, Some(_)) => Some(StockType::Individual),
                    (_, None) => Some(StockType::General),
                },
                casela: resident.map(|_| Casela::new(1)),
            },
            item_name: name.to_string(),
            item_detail: (item.kind() == ItemKind::Medicine).then(|| "dipyrone".to_string()),
            minimum_stock: 0,
            resident_name: resident.map(str::to_string),
        }
    }

    #[test]
    fn medicines_group_by_name_substance_and_resident() {
        let m = ItemRef::Medicine(MedicineId::new(1));
        let views = vec![
            view(m, "Dipyrone", 1, 50, Some("2025-06-01"), None),
            view(m, "Dipyrone", 2, 30, Some("2025-01-01"), None),
            view(m, "Dipyrone", 1, 4, None, Some("Joana")),
        ];
        let lines = medicine_lines(&views);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].resident, None);
        assert_eq!(lines[0].quantity, 80);
        assert_eq!(lines[0].earliest_expiry, Some("2025-01-01".parse().unwrap()));
        assert_eq!(lines[1].resident.as_deref(), Some("Joana"));
        assert_eq!(lines[1].earliest_expiry, None);
    }

    #[test]
    fn inputs_group_by_name_and_cabinet() {
        let i = ItemRef::Input(InputId::new(1));
        let views = vec![
            view(i, "Gauze", 1, 10, None, None),
            view(i, "Gauze", 1, 5, None, None),
            view(i, "Gauze", 2, 7, None, None),
        ];
        let table = stock_table(ReportKind::Inputs, &views);
        assert_eq!(table.headers, vec!["Name", "Quantity", "Cabinet"]);
        assert_eq!(table.rows, vec![vec!["Gauze", "15", "1"], vec!["Gauze", "7", "2"]]);
    }

    #[test]
    fn general_stock_is_labelled_and_missing_expiry_is_na() {
        let m = ItemRef::Medicine(MedicineId::new(1));
        let table = stock_table(ReportKind::Medicines, &[view(m, "Dipyrone", 1, 3, None, None)]);
        assert_eq!(table.rows[0][3], "N/A");
        assert_eq!(table.rows[0][4], "General");
    }

    #[test]
    fn kind_accepts_both_spellings() {
        assert_eq!(ReportKind::parse("insumos"), Some(ReportKind::Inputs));
        assert_eq!(ReportKind::parse("Medicines"), Some(ReportKind::Medicines));
        assert_eq!(ReportKind::parse("cabinets"), None);
        assert_eq!(
            "cabinets".parse::<ReportKind>(),
            Err(ReportError::UnknownKind("cabinets".into()))
        );
    }
}
