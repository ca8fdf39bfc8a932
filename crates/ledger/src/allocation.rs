//! FIFO exit allocation.
//!
//! An exit may span several batches of the same item in the same cabinet.
//! Batches are consumed earliest-expiry first; a batch is only touched once
//! every batch ahead of it is drained.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medstock_core::{DomainError, DomainResult, StockRowId, ensure_positive_quantity};

use crate::stock::{StockRow, fifo_cmp};

/// Quantity taken from one stock row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub row_id: StockRowId,
    pub expiry: Option<NaiveDate>,
    pub taken: i64,
    /// Row quantity after the draw.
    pub remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPlan {
    pub requested: i64,
    pub draws: Vec<Draw>,
}

impl ExitPlan {
    /// Expiry of the first batch consumed; snapshotted on the movement record.
    pub fn first_expiry(&self) -> Option<NaiveDate> {
        self.draws.first().and_then(|d| d.expiry)
    }

    pub fn total_taken(&self) -> i64 {
        self.draws.iter().map(|d| d.taken).sum()
    }
}

/// Total quantity held by `rows`, saturating at `i64::MAX`.
pub fn available(rows: &[StockRow]) -> i64 {
    rows.iter()
        .fold(0i64, |total, r| total.saturating_add(r.quantity.max(0)))
}

/// Plan an exit of `requested` units across `rows` (any order; sorted here).
///
/// Fails with `InsufficientStock` without planning anything when the rows
/// hold less than requested.
pub fn plan_exit(rows: &[StockRow], requested: i64) -> DomainResult<ExitPlan> {
    ensure_positive_quantity(requested)?;

    let total = available(rows);
    if total < requested {
        return Err(DomainError::InsufficientStock {
            requested,
            available: total,
        });
    }

    let mut ordered: Vec<&StockRow> = rows.iter().filter(|r| r.quantity > 0).collect();
    ordered.sort_by(|a, b| fifo_cmp(a, b));

    let mut outstanding = requested;
    let mut draws = Vec::new();
    for row in ordered {
        if outstanding == 0 {
            break;
        }
        let taken = row.quantity.min(outstanding);
        outstanding -= taken;
        draws.push(Draw {
            row_id: row.id,
            expiry: row.expiry,
            taken,
            remaining: row.quantity - taken,
        });
    }

    Ok(ExitPlan { requested, draws })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemRef;
    use crate::stock::StockType;
    use medstock_core::{CabinetId, MedicineId};
    use proptest::prelude::*;

    fn batch(id: i64, quantity: i64, expiry: Option<&str>) -> StockRow {
        StockRow {
            id: StockRowId::new(id),
            item: ItemRef::Medicine(MedicineId::new(1)),
            cabinet: CabinetId::new(3),
            quantity,
            expiry: expiry.map(|e| e.parse().unwrap()),
            origin: None,
            stock_type: Some(StockType::General),
            casela: None,
        }
    }

    #[test]
    fn exit_spanning_two_batches_drains_earliest_first() {
        let rows = vec![
            batch(2, 30, Some("2025-06-01")),
            batch(1, 50, Some("2025-01-01")),
        ];
        let plan = plan_exit(&rows, 60).unwrap();

        assert_eq!(plan.draws.len(), 2);
        assert_eq!(plan.draws[0].row_id, StockRowId::new(1));
        assert_eq!(plan.draws[0].taken, 50);
        assert_eq!(plan.draws[0].remaining, 0);
        assert_eq!(plan.draws[1].row_id, StockRowId::new(2));
        assert_eq!(plan.draws[1].taken, 10);
        assert_eq!(plan.draws[1].remaining, 20);
        assert_eq!(plan.first_expiry(), Some("2025-01-01".parse().unwrap()));
    }

    #[test]
    fn exit_within_first_batch_touches_only_that_batch() {
        let rows = vec![batch(1, 50, Some("2025-01-01")), batch(2, 30, Some("2025-06-01"))];
        let plan = plan_exit(&rows, 50).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].row_id, StockRowId::new(1));
    }

    #[test]
    fn empty_batches_are_skipped() {
        let rows = vec![batch(1, 0, Some("2024-01-01")), batch(2, 5, Some("2025-01-01"))];
        let plan = plan_exit(&rows, 5).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].row_id, StockRowId::new(2));
    }

    #[test]
    fn exit_beyond_available_is_insufficient_stock() {
        let rows = vec![batch(1, 4, None), batch(2, 3, None)];
        let err = plan_exit(&rows, 8).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 8,
                available: 7
            }
        );
    }

    #[test]
    fn exit_from_nothing_is_insufficient_stock() {
        let err = plan_exit(&[], 1).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { available: 0, .. }));
    }

    #[test]
    fn huge_batches_saturate_instead_of_overflowing() {
        let rows = vec![batch(1, i64::MAX, Some("2025-01-01")), batch(2, i64::MAX, None)];
        assert_eq!(available(&rows), i64::MAX);

        let plan = plan_exit(&rows, i64::MAX).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].remaining, 0);
        assert_eq!(plan.total_taken(), i64::MAX);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a successful plan takes exactly the requested amount and
        /// never leaves a row negative.
        #[test]
        fn plan_takes_exactly_requested(
            quantities in prop::collection::vec(0i64..200, 1..8),
            requested in 1i64..800,
        ) {
            let rows: Vec<StockRow> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| batch(i as i64 + 1, *q, None))
                .collect();
            let total: i64 = quantities.iter().sum();

            match plan_exit(&rows, requested) {
                Ok(plan) => {
                    prop_assert!(requested <= total);
                    prop_assert_eq!(plan.total_taken(), requested);
                    prop_assert!(plan.draws.iter().all(|d| d.remaining >= 0 && d.taken > 0));
                }
                Err(DomainError::InsufficientStock { requested: r, available }) => {
                    prop_assert_eq!(r, requested);
                    prop_assert_eq!(available, total);
                    prop_assert!(requested > total);
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }
        }

        /// Property: every draw except the last drains its row completely.
        #[test]
        fn only_the_last_draw_may_be_partial(
            quantities in prop::collection::vec(1i64..100, 1..8),
            fraction in 1u8..=100,
        ) {
            let rows: Vec<StockRow> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| batch(i as i64 + 1, *q, None))
                .collect();
            let total: i64 = quantities.iter().sum();
            let requested = (total * fraction as i64 / 100).max(1);

            let plan = plan_exit(&rows, requested).unwrap();
            let (last, rest) = plan.draws.split_last().unwrap();
            prop_assert!(rest.iter().all(|d| d.remaining == 0));
            prop_assert!(last.remaining >= 0);
        }
    }
}
