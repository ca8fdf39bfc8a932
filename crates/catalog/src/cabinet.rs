use serde::{Deserialize, Serialize};

use medstock_core::{CabinetId, DomainError, DomainResult, Entity};

use crate::required_text;

/// A physical storage location identified by a user-assigned number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cabinet {
    pub id: CabinetId,
    pub category: String,
}

impl Entity for Cabinet {
    type Id = CabinetId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Cabinet registration. The number is the key and cannot change afterwards;
/// edits only touch the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetDraft {
    pub id: CabinetId,
    pub category: String,
}

impl CabinetDraft {
    pub fn validated(self) -> DomainResult<Cabinet> {
        if self.id.get() <= 0 {
            return Err(DomainError::validation("cabinet number must be positive"));
        }
        Ok(Cabinet {
            id: self.id,
            category: required_text("category", &self.category)?,
        })
    }
}

pub fn validate_category(category: &str) -> DomainResult<String> {
    required_text("category", category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cabinet_numbers_must_be_positive() {
        let err = CabinetDraft {
            id: CabinetId::new(0),
            category: "Geral".to_string(),
        }
        .validated()
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
