//! Ordered mock entry storage.
//!
//! This module provides:
//! - `MockEntry`: a rule, its enabled flag and its response bytes
//! - `MockRepository`: the ordered, identity-indexed rule set and every mutation on it
//! - `Snapshot`: the point-in-time view used for matching
//! - persistence of the rule set as JSON records
//!
//! ## Module Structure
//!
//! - `entry`: `EntryId` and `MockEntry`
//! - `events`: change notifications for observers
//! - `store`: `MockRepository` and `Snapshot`
//! - `persistence`: record layout, serialize/deserialize, file load/save

mod entry;
mod events;
mod persistence;
mod store;


pub use entry::{EntryId, MockEntry};
pub use events::RepositoryEvent;
pub use persistence::{DroppedRecord, LoadReport};
pub use store::{MockRepository, Snapshot};
