use serde::{Deserialize, Serialize};

use medstock_core::{DomainResult, Entity, InputId};

use crate::{non_negative, optional_text, required_text};

/// A consumable input (gloves, gauze, syringes, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub id: InputId,
    pub name: String,
    pub description: Option<String>,
    pub minimum_stock: i64,
}

impl Entity for Input {
    type Id = InputId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub minimum_stock: i64,
}

impl InputDraft {
    pub fn validated(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("name", &self.name)?,
            description: optional_text(self.description.as_deref()),
            minimum_stock: non_negative("minimum_stock", self.minimum_stock)?,
        })
    }

    pub fn into_input(self, id: InputId) -> Input {
        Input {
            id,
            name: self.name,
            description: self.description,
            minimum_stock: self.minimum_stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_description_collapses_to_none() {
        let d = InputDraft {
            name: "Luva".to_string(),
            description: Some("  ".to_string()),
            minimum_stock: 0,
        }
        .validated()
        .unwrap();
        assert_eq!(d.description, None);
    }
}
