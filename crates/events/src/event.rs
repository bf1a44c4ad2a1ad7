use chrono::{DateTime, Utc};

/// A fact recorded by the ledger (an entry was created, an entry was posted).
///
/// Events are immutable and versioned; consumers key on `event_type()`.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable type identifier, e.g. `"accounting.journal_entry.posted"`.
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
