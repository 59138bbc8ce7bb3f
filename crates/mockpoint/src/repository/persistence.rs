//! Persisted form of the rule set.
//!
//! The store is a JSON array of records in priority order, one per entry.
//! Loading salvages every well-formed record: a record that cannot be
//! decoded is dropped and reported, never failing the whole load.

use super::entry::{EntryId, MockEntry};
use super::store::MockRepository;
use crate::error::{MockError, Result};
use crate::rule::{MockRule, Protocol};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_PORT_KEYWORD: &str = "default";

/// One persisted entry. Field order is the on-disk order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    id: u64,
    enabled: bool,
    protocol: Protocol,
    host: String,
    port: StoredPort,
    path: String,
    path_includes_query: bool,
    /// Standard base64, `null` when the entry has no response yet
    #[serde(default)]
    response: Option<String>,
}

/// Either an explicit port number or the `"default"` keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredPort {
    Number(u64),
    Keyword(String),
}

impl StoredPort {
    fn from_rule(rule: &MockRule) -> Self {
        match rule.port() {
            Some(port) => StoredPort::Number(u64::from(port)),
            None => StoredPort::Keyword(DEFAULT_PORT_KEYWORD.to_string()),
        }
    }

    fn resolve(&self) -> std::result::Result<Option<u16>, String> {
        match self {
            StoredPort::Number(n) => match u16::try_from(*n) {
                Ok(port) if port != 0 => Ok(Some(port)),
                _ => Err(format!("port {n} is outside 1-65535")),
            },
            StoredPort::Keyword(k) if k.eq_ignore_ascii_case(DEFAULT_PORT_KEYWORD) => Ok(None),
            StoredPort::Keyword(k) => Err(format!("port {k:?} is neither a number nor \"default\"")),
        }
    }
}

impl StoredRecord {
    fn from_entry(entry: &MockEntry) -> Self {
        let rule = entry.rule();
        Self {
            id: entry.id().get(),
            enabled: entry.is_enabled(),
            protocol: rule.protocol(),
            host: rule.host().to_string(),
            port: StoredPort::from_rule(rule),
            path: rule.path().to_string(),
            path_includes_query: rule.path_includes_query(),
            response: entry.response().map(|bytes| STANDARD.encode(bytes)),
        }
    }

    fn into_entry(self) -> std::result::Result<MockEntry, String> {
        if self.id == 0 {
            return Err("id 0 is reserved for unsaved entries".to_string());
        }
        if self.id == u64::MAX {
            return Err(format!("id {} leaves no room for new entries", self.id));
        }
        let port = self.port.resolve()?;
        let response = match self.response {
            Some(encoded) => Some(Bytes::from(
                STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| format!("response is not valid base64: {e}"))?,
            )),
            None => None,
        };
        let rule = MockRule::from_parts(
            self.protocol,
            self.host,
            port,
            self.path,
            self.path_includes_query,
        );
        Ok(MockEntry::new(rule, response)
            .with_enabled(self.enabled)
            .with_id(EntryId::new(self.id)))
    }
}

/// A persisted record that was skipped while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    /// Position of the record in the persisted array
    pub position: usize,
    pub reason: String,
}

/// Result of loading a persisted rule set
#[derive(Debug)]
pub struct LoadReport {
    pub repository: MockRepository,
    pub dropped: Vec<DroppedRecord>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

impl MockRepository {
    /// Canonical persisted form of the current rule set.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let snapshot = self.snapshot();
        let records: Vec<StoredRecord> = snapshot
            .iter()
            .map(|entry| StoredRecord::from_entry(entry))
            .collect();
        serde_json::to_vec_pretty(&records)
            .map_err(|e| MockError::CorruptData(format!("cannot encode mock records: {e}")))
    }

    /// Rebuild a repository from its persisted form.
    ///
    /// Fails with `CorruptData` only when the blob is not a JSON array.
    /// Records that fail to decode, or that repeat an earlier id, are
    /// dropped and listed in the report.
    pub fn deserialize(blob: &[u8]) -> Result<LoadReport> {
        let rows: Vec<serde_json::Value> = serde_json::from_slice(blob).map_err(|e| {
            MockError::CorruptData(format!("expected a JSON array of mock records: {e}"))
        })?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(rows.len());
        let mut dropped = Vec::new();

        for (position, row) in rows.into_iter().enumerate() {
            let decoded = serde_json::from_value::<StoredRecord>(row)
                .map_err(|e| e.to_string())
                .and_then(StoredRecord::into_entry);
            let reason = match decoded {
                Ok(entry) if seen.insert(entry.id()) => {
                    entries.push(entry);
                    continue;
                }
                Ok(entry) => format!("duplicate id {}", entry.id()),
                Err(reason) => reason,
            };
            warn!("Dropping persisted mock record {}: {}", position, reason);
            dropped.push(DroppedRecord { position, reason });
        }

        debug!(
            "Decoded {} mock records, dropped {}",
            entries.len(),
            dropped.len()
        );
        Ok(LoadReport {
            repository: MockRepository::from_restored(entries),
            dropped,
        })
    }

    /// Save the rule set to a file (JSON format)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let blob = self.serialize()?;
        fs::write(path, blob)?;
        info!("Saved {} mock entries to {:?}", self.len(), path);
        Ok(())
    }

    /// Load a rule set from a file; a missing file yields an empty repository.
    pub fn load_from_file(path: &Path) -> Result<LoadReport> {
        if !path.exists() {
            debug!("Mock store {:?} does not exist, starting fresh", path);
            return Ok(LoadReport {
                repository: MockRepository::new(),
                dropped: Vec::new(),
            });
        }

        let blob = fs::read(path)?;
        let report = Self::deserialize(&blob)?;
        info!(
            "Loaded {} mock entries from {:?} ({} dropped)",
            report.repository.len(),
            path,
            report.dropped.len()
        );
        Ok(report)
    }
}
