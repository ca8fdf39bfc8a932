//! Stock ledger domain module.
//!
//! Stock rows per cabinet, entry/exit commands, FIFO exit allocation, the
//! movement log model and cabinet relocation planning. Deterministic domain
//! logic only (no IO, no HTTP, no storage).

pub mod allocation;
pub mod command;
pub mod item;
pub mod movement;
pub mod query;
pub mod relocation;
pub mod stock;

pub use allocation::{Draw, ExitPlan, available, plan_exit};
pub use command::{ExitMatch, RecordEntry, RecordExit};
pub use item::{ItemKind, ItemRef};
pub use movement::{
    Direction, MovementFilter, MovementRecord, MovementType, NewMovement, sort_newest_first,
};
pub use query::{
    CabinetTotal, StockDistribution, StockFilter, StockPolicy, StockSummary, StockView,
    is_near_minimum, summarize,
};
pub use relocation::{
    CabinetStockInfo, Destinations, RelocateCabinet, RelocationMove, RelocationOutcome,
    RelocationPlan, RelocationState, plan_relocation,
};
pub use stock::{MedicineAttrs, NewStockRow, StockKey, StockRow, StockType, fifo_cmp};
