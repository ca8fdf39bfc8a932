use std::sync::Arc;

use medstock_auth::Hs256Jwt;
use medstock_infra::{
    CatalogService, InMemoryStore, MovementLog, OperatorDirectory, RelocationCoordinator,
    StockLedger, StockSettings, Store,
};

/// Everything the handlers need, shared behind one `Arc` extension.
///
/// All services hold the same injected store handle.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub ledger: StockLedger,
    pub movements: MovementLog,
    pub relocation: RelocationCoordinator,
    pub operators: OperatorDirectory,
    pub jwt: Arc<Hs256Jwt>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, jwt: Arc<Hs256Jwt>, settings: StockSettings) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            ledger: StockLedger::new(store.clone(), settings),
            movements: MovementLog::new(store.clone()),
            relocation: RelocationCoordinator::new(store.clone()),
            operators: OperatorDirectory::new(store),
            jwt,
        }
    }

    /// Services over a fresh in-memory store (tests and database-less runs).
    pub fn in_memory(jwt: Arc<Hs256Jwt>, settings: StockSettings) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), jwt, settings)
    }
}
