//! Entity trait: identity that survives state changes.

/// Reference data with a stable business key (an account number, a fiscal
/// year name, an account type name).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
