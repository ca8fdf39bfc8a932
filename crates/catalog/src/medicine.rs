use serde::{Deserialize, Serialize};

use medstock_core::{DomainResult, Entity, MedicineId};

use crate::{non_negative, required_text};

/// A medicine known to the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    pub dosage: String,
    pub unit: String,
    pub active_substance: String,
    /// Stock at or below this quantity is reported as "below minimum".
    pub minimum_stock: i64,
}

impl Entity for Medicine {
    type Id = MedicineId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Fields supplied when creating or editing a medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineDraft {
    pub name: String,
    pub dosage: String,
    pub unit: String,
    pub active_substance: String,
    #[serde(default)]
    pub minimum_stock: i64,
}

impl MedicineDraft {
    /// Validate and normalise (trimmed text, non-negative threshold).
    pub fn validated(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("name", &self.name)?,
            dosage: required_text("dosage", &self.dosage)?,
            unit: required_text("unit", &self.unit)?,
            active_substance: required_text("active_substance", &self.active_substance)?,
            minimum_stock: non_negative("minimum_stock", self.minimum_stock)?,
        })
    }

    pub fn into_medicine(self, id: MedicineId) -> Medicine {
        Medicine {
            id,
            name: self.name,
            dosage: self.dosage,
            unit: self.unit,
            active_substance: self.active_substance,
            minimum_stock: self.minimum_stock,
        }
    }
}
