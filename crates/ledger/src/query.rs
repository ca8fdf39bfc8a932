//! Read-side stock predicates and summaries.
//!
//! Everything here is recomputed from a fresh snapshot on every read.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medstock_catalog::{Input, Medicine, Resident};
use medstock_core::{CabinetId, Casela};

use crate::item::{ItemKind, ItemRef};
use crate::stock::{StockRow, StockType};

/// Thresholds for the relative predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    pub today: NaiveDate,
    /// Window used by the "expiring soon" dashboard counter.
    pub expiring_soon_days: i64,
    /// How far above the minimum (percent of the minimum) still counts as "near minimum".
    pub near_minimum_margin_percent: i64,
}

impl StockPolicy {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            expiring_soon_days: 45,
            near_minimum_margin_percent: 50,
        }
    }
}

/// A stock row joined with the catalog data needed to judge and display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockView {
    #[serde(flatten)]
    pub row: StockRow,
    pub item_name: String,
    /// Active substance for medicines, description for inputs.
    pub item_detail: Option<String>,
    pub minimum_stock: i64,
    pub resident_name: Option<String>,
}

impl StockView {
    pub fn for_medicine(row: StockRow, medicine: &Medicine, resident: Option<&Resident>) -> Self {
        Self {
            row,
            item_name: medicine.name.clone(),
            item_detail: Some(medicine.active_substance.clone()),
            minimum_stock: medicine.minimum_stock,
            resident_name: resident.map(|r| r.name.clone()),
        }
    }

    pub fn for_input(row: StockRow, input: &Input) -> Self {
        Self {
            row,
            item_name: input.name.clone(),
            item_detail: input.description.clone(),
            minimum_stock: input.minimum_stock,
            resident_name: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row.quantity == 0
    }

    pub fn is_below_minimum(&self) -> bool {
        self.row.quantity <= self.minimum_stock
    }

    pub fn is_near_minimum(&self, margin_percent: i64) -> bool {
        is_near_minimum(self.row.quantity, self.minimum_stock, margin_percent)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.row.expiry.is_some_and(|e| e < today)
    }

    /// Not yet expired, and expiring within `days` days (inclusive).
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        self.row.expiry.is_some_and(|e| {
            let left = (e - today).num_days();
            (0..=days).contains(&left)
        })
    }
}

/// Above the minimum, but by no more than `margin_percent` of it (rounded up).
pub fn is_near_minimum(quantity: i64, minimum: i64, margin_percent: i64) -> bool {
    if minimum <= 0 || quantity <= minimum {
        return false;
    }
    let margin = minimum.saturating_mul(margin_percent).saturating_add(99) / 100;
    quantity <= minimum.saturating_add(margin)
}

/// `queryStock` filters. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    pub cabinet: Option<CabinetId>,
    pub item_kind: Option<ItemKind>,
    pub item: Option<ItemRef>,
    pub casela: Option<Casela>,
    pub stock_type: Option<StockType>,
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

impl StockFilter {
    /// Row-level predicates that a storage backend may push down.
    pub fn matches_row(&self, row: &StockRow) -> bool {
        self.cabinet.is_none_or(|c| row.cabinet == c)
            && self.item_kind.is_none_or(|k| row.item.kind() == k)
            && self.item.is_none_or(|i| row.item == i)
            && self.casela.is_none_or(|c| row.casela == Some(c))
            && self.stock_type.is_none_or(|t| row.stock_type == Some(t))
            && (!self.zero_quantity || row.quantity == 0)
    }

    pub fn matches(&self, view: &StockView, policy: &StockPolicy) -> bool {
        self.matches_row(&view.row)
            && (!self.below_minimum || view.is_below_minimum())
            && (!self.near_minimum || view.is_near_minimum(policy.near_minimum_margin_percent))
            && (!self.expired || view.is_expired(policy.today))
            && self
                .expiring_within_days
                .is_none_or(|days| view.expires_within(policy.today, days))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetTotal {
    pub cabinet: CabinetId,
    pub total: i64,
}

/// How stock splits between general medicines, individual medicines and inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDistribution {
    pub general_medicines: i64,
    pub individual_medicines: i64,
    pub inputs: i64,
}

impl StockDistribution {
    pub fn total(&self) -> i64 {
        self.general_medicines
            .saturating_add(self.individual_medicines)
            .saturating_add(self.inputs)
    }

    /// Share of the total as a percentage, 0 when there is no stock at all.
    pub fn percent(&self, part: i64) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            part as f64 * 100.0 / total as f64
        }
    }
}

/// Dashboard counters over a stock snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub rows: usize,
    pub zero_quantity: usize,
    pub below_minimum: usize,
    pub near_minimum: usize,
    pub expired: usize,
    pub expiring_soon: usize,
    pub cabinets: Vec<CabinetTotal>,
    pub distribution: StockDistribution,
}

pub fn summarize(views: &[StockView], policy: &StockPolicy) -> StockSummary {
    let mut per_cabinet: BTreeMap<CabinetId, i64> = BTreeMap::new();
    let mut distribution = StockDistribution::default();

    for v in views {
        let quantity = v.row.quantity;
        let cabinet_total = per_cabinet.entry(v.row.cabinet).or_default();
        *cabinet_total = cabinet_total.saturating_add(quantity);
        let bucket = match (v.row.item.kind(), v.row.stock_type) {
            (ItemKind::Input, _) => &mut distribution.inputs,
            (ItemKind::Medicine, Some(StockType::Individual)) => {
                &mut distribution.individual_medicines
            }
            (ItemKind::Medicine, _) => &mut distribution.general_medicines,
        };
        *bucket = bucket.saturating_add(quantity);
    }

    StockSummary {
        rows: views.len(),
        zero_quantity: views.iter().filter(|v| v.is_empty()).count(),
        below_minimum: views.iter().filter(|v| v.is_below_minimum()).count(),
        near_minimum: views
            .iter()
            .filter(|v| v.is_near_minimum(policy.near_minimum_margin_percent))
            .count(),
        expired: views.iter().filter(|v| v.is_expired(policy.today)).count(),
        expiring_soon: views
            .iter()
            .filter(|v| v.expires_within(policy.today, policy.expiring_soon_days))
            .count(),
        cabinets: per_cabinet
            .into_iter()
            .map(|(cabinet, total)| CabinetTotal { cabinet, total })
            .collect(),
        distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medstock_core::{InputId, MedicineId, StockRowId};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn view(item: ItemRef, cabinet: i32, quantity: i64, minimum: i64, expiry: Option<&str>) -> StockView {
        let medicine = item.kind() == ItemKind::Medicine;
        StockView {
            row: StockRow {
                id: StockRowId::new(1),
                item,
                cabinet: CabinetId::new(cabinet),
                quantity,
                expiry: expiry.map(date),
                origin: None,
                stock_type: medicine.then_some(StockType::General),
                casela: None,
            },
            item_name: "x".to_string(),
            item_detail: None,
            minimum_stock: minimum,
            resident_name: None,
        }
    }

    #[test]
    fn near_minimum_uses_rounded_up_margin() {
        // minimum 10, margin 50% → (10, 15]
        assert!(!is_near_minimum(10, 10, 50));
        assert!(is_near_minimum(11, 10, 50));
        assert!(is_near_minimum(15, 10, 50));
        assert!(!is_near_minimum(16, 10, 50));
        // minimum 3, margin 50% → ceil(1.5) = 2 → (3, 5]
        assert!(is_near_minimum(5, 3, 50));
        assert!(!is_near_minimum(6, 3, 50));
        // no minimum configured → never near
        assert!(!is_near_minimum(1, 0, 50));
    }

    #[test]
    fn expiry_predicates_are_relative_to_today() {
        let today = date("2025-03-10");
        let med = ItemRef::Medicine(MedicineId::new(1));

        let expired = view(med, 1, 5, 0, Some("2025-03-09"));
        let today_exp = view(med, 1, 5, 0, Some("2025-03-10"));
        let soon = view(med, 1, 5, 0, Some("2025-04-24"));
        let undated = view(med, 1, 5, 0, None);

        assert!(expired.is_expired(today));
        assert!(!expired.expires_within(today, 45));
        assert!(!today_exp.is_expired(today));
        assert!(today_exp.expires_within(today, 0));
        assert!(soon.expires_within(today, 45));
        assert!(!soon.expires_within(today, 44));
        assert!(!undated.is_expired(today));
        assert!(!undated.expires_within(today, 365));
    }

    #[test]
    fn filter_combines_row_and_relative_predicates() {
        let policy = StockPolicy::new(date("2025-03-10"));
        let med = ItemRef::Medicine(MedicineId::new(1));
        let input = ItemRef::Input(InputId::new(1));

        let filter = StockFilter {
            cabinet: Some(CabinetId::new(3)),
            below_minimum: true,
            ..StockFilter::default()
        };

        assert!(filter.matches(&view(med, 3, 4, 5, None), &policy));
        assert!(filter.matches(&view(input, 3, 5, 5, None), &policy));
        assert!(!filter.matches(&view(med, 3, 6, 5, None), &policy));
        assert!(!filter.matches(&view(med, 4, 1, 5, None), &policy));

        let zero = StockFilter {
            zero_quantity: true,
            item_kind: Some(ItemKind::Input),
            ..StockFilter::default()
        };
        assert!(zero.matches(&view(input, 1, 0, 0, None), &policy));
        assert!(!zero.matches(&view(med, 1, 0, 0, None), &policy));
    }

    #[test]
    fn summary_totals_per_cabinet_and_distribution() {
        let policy = StockPolicy::new(date("2025-03-10"));
        let med = ItemRef::Medicine(MedicineId::new(1));
        let input = ItemRef::Input(InputId::new(1));

        let mut individual = view(med, 2, 6, 0, Some("2025-01-01"));
        individual.row.stock_type = Some(StockType::Individual);
        individual.row.casela = Some(Casela::new(8));

        let views = vec![
            view(med, 1, 10, 20, Some("2025-04-01")),
            individual,
            view(input, 1, 4, 0, None),
            view(input, 2, 0, 0, None),
        ];
        let s = summarize(&views, &policy);

        assert_eq!(s.rows, 4);
        assert_eq!(s.zero_quantity, 1);
        assert_eq!(s.expired, 1);
        assert_eq!(s.expiring_soon, 1);
        assert_eq!(
            s.cabinets,
            vec![
                CabinetTotal { cabinet: CabinetId::new(1), total: 14 },
                CabinetTotal { cabinet: CabinetId::new(2), total: 6 },
            ]
        );
        assert_eq!(s.distribution.general_medicines, 10);
        assert_eq!(s.distribution.individual_medicines, 6);
        assert_eq!(s.distribution.inputs, 4);
        assert_eq!(s.distribution.total(), 20);
        assert!((s.distribution.percent(10) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_saturates_on_huge_quantities() {
        let policy = StockPolicy::new(date("2025-03-10"));
        let input = ItemRef::Input(InputId::new(1));
        let views = vec![
            view(input, 1, i64::MAX, 0, None),
            view(input, 1, 5, 0, None),
        ];
        let s = summarize(&views, &policy);

        assert_eq!(s.cabinets, vec![CabinetTotal { cabinet: CabinetId::new(1), total: i64::MAX }]);
        assert_eq!(s.distribution.inputs, i64::MAX);
        assert!(is_near_minimum(i64::MAX, i64::MAX - 1, 50));
    }
}
