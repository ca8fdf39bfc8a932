//! Application services.
//!
//! Each service holds an injected `Arc<dyn Store>` and runs every public
//! operation as exactly one unit of work: begin, do the work, then commit on
//! success or roll back on any error. Services never call each other while a
//! unit of work is open.

pub mod catalog;
pub mod ledger;
pub mod movements;
pub mod operators;
pub mod relocation;

use thiserror::Error;
use tracing::warn;

use medstock_auth::AuthError;
use medstock_core::DomainError;

use crate::store::{StoreError, StoreTx};

pub use catalog::CatalogService;
pub use ledger::{LedgerReceipt, StockLedger};
pub use movements::MovementLog;
pub use operators::OperatorDirectory;
pub use relocation::{CabinetInspection, RelocationCoordinator};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

/// Commit on `Ok`, roll back on `Err`.
pub(crate) async fn finish<T>(
    tx: Box<dyn StoreTx>,
    result: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
