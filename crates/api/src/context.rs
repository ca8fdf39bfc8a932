use medstock_auth::{JwtClaims, Principal, Role};
use medstock_core::OperatorId;

/// Authenticated operator for a request.
///
/// Built from validated token claims by the auth middleware and present on
/// every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContext {
    principal: Principal,
}

impl OperatorContext {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            principal: Principal::from_claims(claims),
        }
    }

    pub fn operator_id(&self) -> OperatorId {
        self.principal.operator_id
    }

    pub fn login(&self) -> &str {
        &self.principal.login
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
