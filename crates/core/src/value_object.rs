//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// Journal totals and balance changes are value objects: two totals with the
/// same debit and credit sums are the same totals, wherever they came from.
/// To "modify" one, compute a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
