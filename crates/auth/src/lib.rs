//! `medstock-auth`: operator authentication and authorization.
//!
//! Decoupled from HTTP and storage: claims, roles and permissions, HS256
//! tokens and argon2 password hashing.

pub mod authorize;
pub mod claims;
pub mod operator;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;

use thiserror::Error;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use operator::{MIN_PASSWORD_LEN, Operator, OperatorDraft, validate_password};
pub use password::{hash_password, verify_against_dummy, verify_password};
pub use permissions::Permission;
pub use roles::{Role, permissions_from_roles};
pub use token::{Hs256Jwt, JwtValidator};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Token(#[from] TokenValidationError),
}
