use std::sync::Arc;

use tracing::{info, instrument, warn};

use medstock_auth::{
    AuthError, Operator, OperatorDraft, Role, hash_password, validate_password, verify_against_dummy,
    verify_password,
};
use medstock_core::DomainError;

use super::{ServiceError, finish};
use crate::store::{Store, StoreError};

/// Operator accounts: registration, password login and the first admin.
#[derive(Clone)]
pub struct OperatorDirectory {
    store: Arc<dyn Store>,
}

impl OperatorDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, draft), fields(login = %draft.login), err)]
    pub async fn register(&self, draft: OperatorDraft) -> Result<Operator, ServiceError> {
        let draft = draft.validated()?;
        let hash = hash_password(&draft.password)?;

        let mut tx = self.store.begin().await?;
        let result = match tx.insert_operator(&draft.login, &hash, &draft.role).await {
            Ok(operator) => Ok(operator),
            Err(StoreError::Duplicate(_)) => Err(DomainError::duplicate(format!(
                "login '{}' is taken",
                draft.login
            ))
            .into()),
            Err(e) => Err(e.into()),
        };
        let operator = finish(tx, result).await?;
        info!(operator_id = %operator.id, role = %operator.role, "operator registered");
        Ok(operator)
    }

    /// Check a login/password pair. Unknown logins and wrong passwords are
    /// indistinguishable to the caller.
    #[instrument(skip(self, password), err)]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Operator, ServiceError> {
        let login = login.trim().to_lowercase();
        let mut tx = self.store.begin().await?;
        let result = tx.find_operator(&login).await.map_err(ServiceError::from);
        let operator = finish(tx, result).await?;

        let Some(operator) = operator else {
            verify_against_dummy(password);
            warn!(login = %login, "login for unknown operator");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(password, &operator.password_hash)? {
            warn!(login = %login, "wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(operator)
    }

    /// Every operator account, ordered by login.
    pub async fn list(&self) -> Result<Vec<Operator>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_operators().await.map_err(ServiceError::from);
        finish(tx, result).await
    }

    /// Set a new password for `login`. Existing tokens stay valid until they expire.
    #[instrument(skip(self, new_password), err)]
    pub async fn reset_password(&self, login: &str, new_password: &str) -> Result<Operator, ServiceError> {
        let login = login.trim().to_lowercase();
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;

        let mut tx = self.store.begin().await?;
        let result = match tx.set_operator_password(&login, &hash).await {
            Ok(Some(operator)) => Ok(operator),
            Ok(None) => Err(DomainError::not_found(format!("operator '{login}'")).into()),
            Err(e) => Err(e.into()),
        };
        let operator = finish(tx, result).await?;
        info!(operator_id = %operator.id, "operator password reset");
        Ok(operator)
    }

    /// Create an admin when the directory is empty. Returns the new operator,
    /// or `None` if operators already exist.
    pub async fn ensure_bootstrap_admin(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<Operator>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.count_operators().await.map_err(ServiceError::from);
        let existing = finish(tx, result).await?;
        if existing > 0 {
            return Ok(None);
        }

        let admin = self
            .register(OperatorDraft {
                login: login.to_string(),
                password: password.to_string(),
                role: Role::ADMIN,
            })
            .await?;
        info!(login = %admin.login, "bootstrap admin created");
        Ok(Some(admin))
    }
}
