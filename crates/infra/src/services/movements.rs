use std::sync::Arc;

use tracing::instrument;

use medstock_ledger::{MovementFilter, MovementRecord};

use super::{ServiceError, finish};
use crate::store::Store;

/// Read side of the append-only movement log. There is no
/// update or delete operation.
#[derive(Clone)]
pub struct MovementLog {
    store: Arc<dyn Store>,
}

impl MovementLog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Matching movements, newest first.
    #[instrument(skip(self), err)]
    pub async fn list(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_movements(filter).await.map_err(ServiceError::from);
        finish(tx, result).await
    }
}
