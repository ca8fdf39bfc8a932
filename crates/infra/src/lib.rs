//! Infrastructure layer: storage backends, application services, config.

pub mod config;
pub mod services;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{AppConfig, ConfigLoadError, StockSettings};
pub use services::{
    CabinetInspection, CatalogService, LedgerReceipt, MovementLog, OperatorDirectory,
    RelocationCoordinator, ServiceError, StockLedger,
};
pub use store::{InMemoryStore, PostgresStore, StockReference, Store, StoreError, StoreTx};
