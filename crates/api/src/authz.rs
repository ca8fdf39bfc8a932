//! Request-level authorization guard.
//!
//! Handlers call this before touching a service, so services stay
//! auth-agnostic.

use medstock_auth::{AuthzError, Permission, authorize};

use crate::context::OperatorContext;

pub fn authorize_request(
    operator: &OperatorContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    authorize(operator.principal(), required)
}
