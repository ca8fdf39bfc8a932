use serde::{Deserialize, Serialize};

use medstock_core::{DomainError, DomainResult, Entity, OperatorId};

use crate::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A staff account. The password is only ever held as an argon2 hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub id: OperatorId,
    pub login: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
}

impl Entity for Operator {
    type Id = OperatorId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Registration input (plaintext password, hashed before storage).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperatorDraft {
    pub login: String,
    pub password: String,
    pub role: Role,
}

impl OperatorDraft {
    pub fn validated(self) -> DomainResult<Self> {
        let login = self.login.trim().to_lowercase();
        if login.is_empty() {
            return Err(DomainError::validation("login cannot be empty"));
        }
        if login.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("login cannot contain whitespace"));
        }
        validate_password(&self.password)?;
        if !self.role.is_admin() && self.role != Role::OPERATOR {
            return Err(DomainError::validation(format!("unknown role '{}'", self.role)));
        }
        Ok(Self { login, ..self })
    }
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(login: &str, password: &str, role: Role) -> OperatorDraft {
        OperatorDraft {
            login: login.to_string(),
            password: password.to_string(),
            role,
        }
    }

    #[test]
    fn login_is_normalised() {
        let d = draft("  Maria ", "abcdef", Role::OPERATOR).validated().unwrap();
        assert_eq!(d.login, "maria");
    }

    #[test]
    fn short_password_and_unknown_role_are_rejected() {
        assert!(draft("maria", "abc", Role::OPERATOR).validated().is_err());
        assert!(draft("maria", "abcdef", Role::new("root")).validated().is_err());
        assert!(draft("ma ria", "abcdef", Role::ADMIN).validated().is_err());
    }
}
