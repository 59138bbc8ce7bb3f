//! Change notifications published by the repository.

use super::entry::EntryId;

/// A committed change to the rule set.
///
/// Published after the new state is visible to snapshots. Indices refer to
/// positions in that new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEvent {
    Added { id: EntryId, index: usize },
    Removed { id: EntryId, index: usize },
    /// Rows `from..=to` now start at `dest`
    Moved { from: usize, to: usize, dest: usize },
    /// Flag, rule or response of an entry changed in place
    Updated { id: EntryId, index: usize },
    /// The whole rule set was replaced
    Reloaded { len: usize },
}
