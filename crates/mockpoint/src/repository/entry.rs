//! Mock entries: a rule, its enabled flag and the response served for it.

use crate::rule::MockRule;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an entry, independent of its position.
///
/// Assigned by the repository on insertion and never reused. Zero is the
/// "not yet added" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub const UNASSIGNED: EntryId = EntryId(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rule plus the raw HTTP response bytes served when it matches.
///
/// Producers build entries with [`MockEntry::new`] and hand them to the
/// repository, which assigns the id. All later changes go through the
/// repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MockEntry {
    id: EntryId,
    enabled: bool,
    rule: MockRule,
    response: Option<Bytes>,
}

impl MockEntry {
    /// New enabled entry, not yet owned by a repository
    pub fn new(rule: MockRule, response: Option<Bytes>) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            enabled: true,
            rule,
            response,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn rule(&self) -> &MockRule {
        &self.rule
    }

    /// Stored response, `None` when no body has been attached yet
    pub fn response(&self) -> Option<&Bytes> {
        self.response.as_ref()
    }

    /// Whether there is a non-empty response to substitute
    pub fn has_response(&self) -> bool {
        self.response.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Copy with the same rule, flag and response, owning its own bytes.
    /// The copy has no id until it is inserted.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            enabled: self.enabled,
            rule: self.rule.clone(),
            response: self.response.as_ref().map(|r| Bytes::copy_from_slice(r)),
        }
    }

    pub(crate) fn with_id(mut self, id: EntryId) -> Self {
        self.id = id;
        self
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_rule(&mut self, rule: MockRule) {
        self.rule = rule;
    }

    pub(crate) fn set_response(&mut self, response: Option<Bytes>) {
        self.response = response;
    }
}

impl fmt::Display for MockEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}] {} ({} response bytes)",
            self.id,
            if self.enabled { "on" } else { "off" },
            self.rule,
            self.response.as_ref().map_or(0, |r| r.len())
        )
    }
}
