use serde::{Deserialize, Serialize};

use medstock_core::{InputId, MedicineId, ValueObject};

/// Which half of the catalog a stock row or movement points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Medicine,
    Input,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Medicine => "medicine",
            ItemKind::Input => "input",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "medicine" | "medicines" => Some(ItemKind::Medicine),
            "input" | "inputs" => Some(ItemKind::Input),
            _ => None,
        }
    }
}

/// Reference to a catalog item: a medicine XOR an input, never both.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    Medicine(MedicineId),
    Input(InputId),
}

impl ValueObject for ItemRef {}

impl ItemRef {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemRef::Medicine(_) => ItemKind::Medicine,
            ItemRef::Input(_) => ItemKind::Input,
        }
    }

    pub fn medicine_id(&self) -> Option<MedicineId> {
        match self {
            ItemRef::Medicine(id) => Some(*id),
            ItemRef::Input(_) => None,
        }
    }

    pub fn input_id(&self) -> Option<InputId> {
        match self {
            ItemRef::Input(id) => Some(*id),
            ItemRef::Medicine(_) => None,
        }
    }

    /// Rebuild from the two nullable columns used by relational storage.
    pub fn from_columns(medicine_id: Option<i64>, input_id: Option<i64>) -> Option<Self> {
        match (medicine_id, input_id) {
            (Some(m), None) => Some(ItemRef::Medicine(MedicineId::new(m))),
            (None, Some(i)) => Some(ItemRef::Input(InputId::new(i))),
            _ => None,
        }
    }
}

impl core::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ItemRef::Medicine(id) => write!(f, "medicine {id}"),
            ItemRef::Input(id) => write!(f, "input {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relational_columns_must_hold_exactly_one_item() {
        assert_eq!(
            ItemRef::from_columns(Some(4), None),
            Some(ItemRef::Medicine(MedicineId::new(4)))
        );
        assert_eq!(ItemRef::from_columns(None, Some(9)), Some(ItemRef::Input(InputId::new(9))));
        assert_eq!(ItemRef::from_columns(Some(1), Some(2)), None);
        assert_eq!(ItemRef::from_columns(None, None), None);
    }

    #[test]
    fn item_kind_accepts_singular_and_plural() {
        assert_eq!(ItemKind::parse("Medicines"), Some(ItemKind::Medicine));
        assert_eq!(ItemKind::parse("input"), Some(ItemKind::Input));
        assert_eq!(ItemKind::parse("equipment"), None);
    }
}
