//! First-match lookup of the mock entry answering a request.

use crate::repository::{EntryId, MockEntry, MockRepository};
use crate::rule::RequestTarget;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// The entry chosen for a request.
///
/// Holds the entry as it was in the snapshot the lookup ran against, so the
/// response stays valid even if the entry is edited or removed afterwards.
#[derive(Debug, Clone)]
pub struct MockDecision {
    entry: Arc<MockEntry>,
    position: usize,
}

impl MockDecision {
    pub fn entry(&self) -> &MockEntry {
        &self.entry
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry.id()
    }

    /// Position of the entry when the lookup ran
    pub fn position(&self) -> usize {
        self.position
    }

    /// Response to substitute; `None` when the entry has no body yet
    pub fn response(&self) -> Option<&Bytes> {
        self.entry.response().filter(|r| !r.is_empty())
    }
}

/// Scans the repository in priority order for the first enabled match.
#[derive(Debug, Clone)]
pub struct Matcher {
    repository: Arc<MockRepository>,
}

impl Matcher {
    pub fn new(repository: Arc<MockRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<MockRepository> {
        &self.repository
    }

    /// Find the entry that answers `request`.
    ///
    /// Disabled entries are skipped and the first enabled match wins. A
    /// match whose entry has no response is still returned; it is up to
    /// the caller what to do with it. `None` means forward unmodified.
    pub fn decide(&self, request: &RequestTarget) -> Option<MockDecision> {
        let snapshot = self.repository.snapshot();
        let found = snapshot
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.is_enabled() && entry.rule().matches(request))
            .map(|(position, entry)| MockDecision {
                entry: Arc::clone(entry),
                position,
            });

        match &found {
            Some(decision) => debug!(
                "Mock entry {} at {} matches {}://{}{}",
                decision.entry_id(),
                decision.position,
                request.protocol(),
                request.host(),
                request.path_and_query()
            ),
            None => debug!(
                "No mock entry for {}://{}{}",
                request.protocol(),
                request.host(),
                request.path_and_query()
            ),
        }
        found
    }
}
