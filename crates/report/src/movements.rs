use std::collections::HashMap;

use medstock_ledger::{ItemRef, MovementRecord};

use crate::table::{ReportTable, format_date};

/// Movement history table, in the order given (callers pass newest first).
///
/// `names` resolves item labels; items deleted from the catalog fall back to
/// their raw reference.
pub fn movement_table(records: &[MovementRecord], names: &HashMap<ItemRef, String>) -> ReportTable {
    ReportTable {
        title: "Movement report".to_string(),
        headers: vec![
            "Date", "Type", "Dir.", "Item", "Cabinet", "Quantity", "Casela", "Expiry", "Operator",
        ],
        rows: records
            .iter()
            .map(|m| {
                vec![
                    m.occurred_at.format("%d/%m/%Y %H:%M").to_string(),
                    m.movement_type.as_str().to_string(),
                    m.direction.as_str().to_string(),
                    names.get(&m.item).cloned().unwrap_or_else(|| m.item.to_string()),
                    m.cabinet.to_string(),
                    m.quantity.to_string(),
                    m.casela.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                    format_date(m.expiry),
                    m.operator.to_string(),
                ]
            })
            .collect(),
    }
}
