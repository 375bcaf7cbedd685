//! Reconciliation store
//!
//! Idempotent "must exist" operations keyed by the schema's dedup
//! constraints. The `*_must_exist` functions take a connection so the caller
//! can run venue, performers and event inside one transaction; concurrent
//! writers are reconciled by `ON CONFLICT DO NOTHING` rather than by
//! check-then-insert.

pub mod events;
pub mod performers;
pub mod retry;
pub mod venues;

pub use events::{event_must_exist, find_events, mark_past_events_deleted, EventFilter};
pub use performers::{find_performers, performer_must_exist, PerformerFilter};
pub use retry::{is_lock_error, retry_on_lock};
pub use venues::{create_venue, find_venues, venue_must_exist};
