//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**: two values with the same attributes are
//! the same value. In this workspace the item reference carried by a stock row
//! (`medicine 4` / `input 9`) and the merge key of a stock row (item, cabinet,
//! casela, expiry) are value objects, while medicines, cabinets and stock rows
//! themselves are entities.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct ShelfSlot {
///     cabinet: CabinetId,
///     shelf: u8,
/// }
///
/// impl ValueObject for ShelfSlot {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
