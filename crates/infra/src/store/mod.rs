//! Storage boundary for the catalog, the stock ledger and the movement log.
//!
//! Services only see `Store`/`StoreTx`; the in-memory backend serves tests and
//! local runs, the Postgres backend everything else.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{StockReference, Store, StoreError, StoreTx};
