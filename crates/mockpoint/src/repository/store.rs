//! The ordered, concurrently readable rule set.

use super::entry::{EntryId, MockEntry};
use super::events::RepositoryEvent;
use crate::error::{Lookup, MockError, Result};
use crate::rule::MockRule;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Entries in priority order plus the id -> position index.
#[derive(Debug, Clone, Default)]
pub(crate) struct RepositoryState {
    entries: Vec<Arc<MockEntry>>,
    positions: HashMap<EntryId, usize>,
}

impl RepositoryState {
    fn from_entries(entries: Vec<Arc<MockEntry>>) -> Self {
        let mut state = Self {
            entries,
            positions: HashMap::new(),
        };
        state.reindex();
        state
    }

    fn reindex(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.id(), index))
            .collect();
        debug_assert_eq!(self.positions.len(), self.entries.len(), "duplicate entry id");
    }

    fn position(&self, id: EntryId) -> Result<usize> {
        self.positions
            .get(&id)
            .copied()
            .ok_or(MockError::NotFound(Lookup::Id(id)))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(MockError::NotFound(Lookup::Index(index)))
        }
    }

    /// Replace the entry with `id` by an edited copy.
    fn update(&mut self, id: EntryId, edit: impl FnOnce(&mut MockEntry)) -> Result<usize> {
        let index = self.position(id)?;
        let mut entry = MockEntry::clone(&self.entries[index]);
        edit(&mut entry);
        self.entries[index] = Arc::new(entry);
        Ok(index)
    }

    /// Lowest id not held by any entry.
    fn first_free_id(&self) -> EntryId {
        // At most `len` ids are taken, so this stops within `len + 1` steps.
        let mut candidate = 1;
        while self.positions.contains_key(&EntryId::new(candidate)) {
            candidate += 1;
        }
        EntryId::new(candidate)
    }
}

/// Point-in-time view of the repository.
///
/// Holding a snapshot never blocks writers, and no later mutation is
/// visible through it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    state: Arc<RepositoryState>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    /// Entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MockEntry>> {
        self.state.entries.iter()
    }

    pub fn entries(&self) -> &[Arc<MockEntry>] {
        &self.state.entries
    }

    pub fn get(&self, index: usize) -> Option<&Arc<MockEntry>> {
        self.state.entries.get(index)
    }

    pub fn get_by_id(&self, id: EntryId) -> Option<&Arc<MockEntry>> {
        self.state
            .positions
            .get(&id)
            .and_then(|index| self.state.entries.get(*index))
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.state.entries.iter().map(|e| e.id()).collect()
    }
}

/// `next_id` value once the counter has handed out `u64::MAX`.
const IDS_EXHAUSTED: u64 = 0;

/// Ordered, identity-indexed collection of mock entries.
///
/// Position is match priority: index 0 is tried first. Mutations are
/// serialized by a writer lock and build a new state that is published in
/// one step (copy-on-write); readers take a [`Snapshot`] and iterate it
/// without holding any lock.
#[derive(Debug)]
pub struct MockRepository {
    current: RwLock<Arc<RepositoryState>>,
    writer: Mutex<()>,
    next_id: AtomicU64,
    events: broadcast::Sender<RepositoryEvent>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::with_state(RepositoryState::default(), 1)
    }

    /// Build a repository from entries that already carry their ids.
    pub(crate) fn from_restored(entries: Vec<MockEntry>) -> Self {
        let next_id = entries
            .iter()
            .map(|e| e.id().get())
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .unwrap_or(IDS_EXHAUSTED);
        let entries = entries.into_iter().map(Arc::new).collect();
        Self::with_state(RepositoryState::from_entries(entries), next_id)
    }

    fn with_state(state: RepositoryState, next_id: u64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            current: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
            next_id: AtomicU64::new(next_id),
            events,
        }
    }

    /// Receive an event for every committed mutation from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RepositoryEvent> {
        self.events.subscribe()
    }

    /// Consistent view for matching; cheap to take on every request.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: Arc::clone(&*self.current.read()),
        }
    }

    pub fn len(&self) -> usize {
        self.current.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_by_index(&self, index: usize) -> Result<Arc<MockEntry>> {
        self.snapshot()
            .get(index)
            .cloned()
            .ok_or(MockError::NotFound(Lookup::Index(index)))
    }

    pub fn get_by_id(&self, id: EntryId) -> Result<Arc<MockEntry>> {
        self.snapshot()
            .get_by_id(id)
            .cloned()
            .ok_or(MockError::NotFound(Lookup::Id(id)))
    }

    pub fn position_of(&self, id: EntryId) -> Result<usize> {
        self.current.read().position(id)
    }

    /// Append an entry, assigning it a fresh id.
    pub fn add(&self, entry: MockEntry) -> EntryId {
        let Ok(id) = self.apply::<_, Infallible>(|state, events| {
            let id = self.allocate_id(state);
            let index = state.entries.len();
            state.entries.push(Arc::new(entry.with_id(id)));
            state.positions.insert(id, index);
            events.push(RepositoryEvent::Added { id, index });
            Ok(id)
        });
        debug!("Added mock entry {}", id);
        id
    }

    /// Append a batch of entries in order under a single mutation.
    pub fn add_all(&self, entries: impl IntoIterator<Item = MockEntry>) -> Vec<EntryId> {
        let Ok(ids) = self.apply::<_, Infallible>(|state, events| {
            let mut ids = Vec::new();
            for entry in entries {
                let id = self.allocate_id(state);
                let index = state.entries.len();
                state.entries.push(Arc::new(entry.with_id(id)));
                state.positions.insert(id, index);
                events.push(RepositoryEvent::Added { id, index });
                ids.push(id);
            }
            Ok(ids)
        });
        debug!("Added {} mock entries", ids.len());
        ids
    }

    /// Remove the entry at `index`, returning it.
    pub fn remove_at(&self, index: usize) -> Result<Arc<MockEntry>> {
        self.apply(|state, events| {
            state.check_index(index)?;
            let removed = state.entries.remove(index);
            state.reindex();
            events.push(RepositoryEvent::Removed {
                id: removed.id(),
                index,
            });
            debug!("Removed mock entry {} at {}", removed.id(), index);
            Ok(removed)
        })
    }

    pub fn remove_by_id(&self, id: EntryId) -> Result<Arc<MockEntry>> {
        self.apply(|state, events| {
            let index = state.position(id)?;
            let removed = state.entries.remove(index);
            state.reindex();
            events.push(RepositoryEvent::Removed { id, index });
            debug!("Removed mock entry {} at {}", id, index);
            Ok(removed)
        })
    }

    /// Relocate rows `from..=to` so that row `from` ends up at `dest`.
    ///
    /// Relative order inside the block is kept and the rows in between
    /// shift to fill the gap, e.g. `move_range(2, 2, 0)` turns
    /// `[A, B, C, D]` into `[C, A, B, D]`. The block must fit at `dest`:
    /// `dest + (to - from) < len`.
    pub fn move_range(&self, from: usize, to: usize, dest: usize) -> Result<()> {
        self.apply(|state, events| {
            let len = state.entries.len();
            let valid = from <= to
                && to < len
                && dest.checked_add(to - from).is_some_and(|end| end < len);
            if !valid {
                return Err(MockError::InvalidRange { from, to, dest, len });
            }
            if from == dest {
                return Ok(());
            }
            let block: Vec<_> = state.entries.drain(from..=to).collect();
            state.entries.splice(dest..dest, block);
            state.reindex();
            events.push(RepositoryEvent::Moved { from, to, dest });
            debug!("Moved mock entries {}..={} to {}", from, to, dest);
            Ok(())
        })
    }

    /// Swap the entry at `index` with the one above it; returns its new index.
    pub fn move_up(&self, index: usize) -> Result<usize> {
        let dest = index.checked_sub(1).ok_or(MockError::InvalidRange {
            from: index,
            to: index,
            dest: index,
            len: self.len(),
        })?;
        self.move_range(index, index, dest)?;
        Ok(dest)
    }

    /// Swap the entry at `index` with the one below it; returns its new index.
    pub fn move_down(&self, index: usize) -> Result<usize> {
        let dest = index.checked_add(1).ok_or(MockError::InvalidRange {
            from: index,
            to: index,
            dest: index,
            len: self.len(),
        })?;
        self.move_range(index, index, dest)?;
        Ok(dest)
    }

    /// Insert a copy of the entry at `index` right after it.
    pub fn duplicate(&self, index: usize) -> Result<EntryId> {
        self.apply(|state, events| {
            state.check_index(index)?;
            let id = self.allocate_id(state);
            let copy = state.entries[index].duplicate().with_id(id);
            state.entries.insert(index + 1, Arc::new(copy));
            state.reindex();
            events.push(RepositoryEvent::Added {
                id,
                index: index + 1,
            });
            debug!("Duplicated mock entry at {} as {}", index, id);
            Ok(id)
        })
    }

    pub fn set_enabled(&self, id: EntryId, enabled: bool) -> Result<()> {
        self.update(id, |entry| entry.set_enabled(enabled))
    }

    /// Replace the response bytes; `None` clears them.
    pub fn set_response(&self, id: EntryId, response: Option<Bytes>) -> Result<()> {
        self.update(id, |entry| entry.set_response(response))
    }

    pub fn set_rule(&self, id: EntryId, rule: MockRule) -> Result<()> {
        self.update(id, |entry| entry.set_rule(rule))
    }

    /// Swap in the contents of another repository (typically freshly loaded).
    pub fn replace_all(&self, loaded: MockRepository) {
        let restored = loaded.snapshot();
        let restored_next = loaded.next_id.load(Ordering::Relaxed);
        let Ok(()) = self.apply::<_, Infallible>(|state, events| {
            *state = RepositoryState::from_entries(restored.entries().to_vec());
            if restored_next == IDS_EXHAUSTED {
                self.next_id.store(IDS_EXHAUSTED, Ordering::Relaxed);
            } else {
                self.next_id.fetch_max(restored_next, Ordering::Relaxed);
            }
            events.push(RepositoryEvent::Reloaded {
                len: state.entries.len(),
            });
            Ok(())
        });
        debug!("Replaced rule set with {} entries", restored.len());
    }

    fn update(&self, id: EntryId, edit: impl FnOnce(&mut MockEntry)) -> Result<()> {
        self.apply(|state, events| {
            let index = state.update(id, edit)?;
            events.push(RepositoryEvent::Updated { id, index });
            debug!("Updated mock entry {} at {}", id, index);
            Ok(())
        })
    }

    /// Next id from the counter, or the lowest free one once it is exhausted.
    fn allocate_id(&self, state: &RepositoryState) -> EntryId {
        let issued = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next != IDS_EXHAUSTED).then_some(next.wrapping_add(1))
            });
        match issued {
            Ok(raw) => EntryId::new(raw),
            Err(_) => {
                let id = state.first_free_id();
                warn!("Entry id counter exhausted, reusing free id {}", id);
                id
            }
        }
    }

    /// Run one mutation against a private copy of the state and publish it.
    ///
    /// Writers are serialized by `writer`; the read lock is only held long
    /// enough to clone the current `Arc`, and the write lock only for the
    /// pointer swap. A failed mutation publishes nothing.
    fn apply<T, E>(
        &self,
        mutate: impl FnOnce(&mut RepositoryState, &mut Vec<RepositoryEvent>) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let _writer = self.writer.lock();
        let mut next = RepositoryState::clone(&**self.current.read());
        let mut events = Vec::new();
        let value = mutate(&mut next, &mut events)?;
        *self.current.write() = Arc::new(next);
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        Ok(value)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}
