//! Aggregate vocabulary for ledger documents (journal entries and friends).

/// Aggregate root marker + minimal interface.
///
/// A journal entry is the only aggregate in the ledger today; accounts and
/// fiscal years are reference data owned by the chart of accounts.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied to this aggregate so far.
    fn version(&self) -> u64;
}

/// Command/event execution semantics.
///
/// `handle` decides (no mutation, no IO) and `apply` evolves state from the
/// resulting events. Every applied event bumps `version()` by one.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
