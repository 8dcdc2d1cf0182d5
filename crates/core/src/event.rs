use chrono::{DateTime, Utc};

/// A fact appended to an aggregate stream.
///
/// `event_type` is the stable name persisted next to the payload
/// (e.g. "sales.order.payment_applied"); `version` is its schema revision.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
