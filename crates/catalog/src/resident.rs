use serde::{Deserialize, Serialize};

use medstock_core::{Casela, DomainError, DomainResult, Entity};

use crate::required_text;

/// A resident, keyed by the casela (slot) their individual stock is kept in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub casela: Casela,
    pub name: String,
}

impl Entity for Resident {
    type Id = Casela;

    fn id(&self) -> Self::Id {
        self.casela
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentDraft {
    pub casela: Casela,
    pub name: String,
}

impl ResidentDraft {
    pub fn validated(self) -> DomainResult<Resident> {
        if self.casela.get() <= 0 {
            return Err(DomainError::validation("casela must be positive"));
        }
        Ok(Resident {
            casela: self.casela,
            name: validate_name(&self.name)?,
        })
    }
}

pub fn validate_name(name: &str) -> DomainResult<String> {
    required_text("name", name)
}
