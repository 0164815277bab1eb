use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::data::{ShotLog, ShotLogPatch};
use super::edit::ShotDraft;
use super::slot::KeyValueSlot;
use crate::error::StoreError;
use crate::exposure::Ev;

/// Slot key the whole log collection is stored under
pub const LOG_SLOT_KEY: &str = "film-logs";

/// Outcome of persisting a change
///
/// The in-memory collection is updated before the write is attempted and is
/// never rolled back, so `Failed` only means the change may not survive a
/// restart.
#[must_use = "a failed save means the change is only held in memory"]
#[derive(Debug)]
pub enum SaveStatus {
    /// The change was written to the slot
    Saved,
    /// Nothing matched, nothing was written
    Unchanged,
    /// The change is in memory but the write failed
    Failed(StoreError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// The LogStore owns the shot log collection and mirrors it to a slot.
/// Logs are kept newest first.
pub struct LogStore<S: KeyValueSlot> {
    slot: S,
    logs: Vec<ShotLog>,
}

impl<S: KeyValueSlot> LogStore<S> {
    /// Load the collection from `slot`
    ///
    /// Missing or unreadable data gives an empty collection; the problem is
    /// logged and otherwise ignored.
    pub fn open(slot: S) -> Self {
        let logs = match Self::load(&slot) {
            Ok(logs) => {
                debug!(count = logs.len(), "shot logs loaded");
                logs
            }
            Err(e) => {
                warn!(error = %e, "stored shot logs unreadable, starting empty");
                Vec::new()
            }
        };

        Self { slot, logs }
    }

    fn load(slot: &S) -> Result<Vec<ShotLog>, StoreError> {
        match slot.get(LOG_SLOT_KEY)? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    /// Write the full collection to the slot
    fn persist(&mut self) -> SaveStatus {
        let result = serde_json::to_string(&self.logs)
            .map_err(StoreError::from)
            .and_then(|blob| self.slot.set(LOG_SLOT_KEY, &blob));

        match result {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                error!(error = %e, "failed to save shot logs");
                SaveStatus::Failed(e)
            }
        }
    }

    /// All logs, newest first
    pub fn list(&self) -> &[ShotLog] {
        &self.logs
    }

    pub fn get(&self, id: i64) -> Option<&ShotLog> {
        self.logs.iter().find(|log| log.id == id)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// An ID derived from the current time, bumped past every existing ID
    pub fn next_id(&self) -> i64 {
        self.next_id_at(Utc::now())
    }

    fn next_id_at(&self, now: DateTime<Utc>) -> i64 {
        let newest = self.logs.iter().map(|log| log.id).max().unwrap_or(i64::MIN);
        now.timestamp_millis().max(newest.saturating_add(1))
    }

    /// Add a log at the front
    ///
    /// IDs are unique: an entry whose ID is already stored is not added and
    /// the result is `Unchanged`.
    pub fn append(&mut self, entry: ShotLog) -> SaveStatus {
        if self.get(entry.id).is_some() {
            warn!(id = entry.id, "shot log with this id already exists, not added");
            return SaveStatus::Unchanged;
        }
        self.logs.insert(0, entry);
        self.persist()
    }

    /// Save a draft as a new log, stamped now, with the given EV
    pub fn log_shot(&mut self, draft: ShotDraft, ev: Ev) -> (ShotLog, SaveStatus) {
        let now = Utc::now();
        let log = draft.into_log(self.next_id_at(now), now, ev);
        let status = self.append(log.clone());
        (log, status)
    }

    /// Apply `patch` to the log with `id`, keeping its position
    ///
    /// An unknown ID or an empty patch writes nothing.
    pub fn update(&mut self, id: i64, patch: &ShotLogPatch) -> SaveStatus {
        if patch.is_empty() {
            return SaveStatus::Unchanged;
        }
        let Some(log) = self.logs.iter_mut().find(|log| log.id == id) else {
            debug!(id, "update for unknown shot log ignored");
            return SaveStatus::Unchanged;
        };

        patch.apply(log);
        self.persist()
    }

    /// Delete the log with `id`
    pub fn remove(&mut self, id: i64) -> SaveStatus {
        let before = self.logs.len();
        self.logs.retain(|log| log.id != id);

        if self.logs.len() == before {
            debug!(id, "delete for unknown shot log ignored");
            return SaveStatus::Unchanged;
        }
        self.persist()
    }

    /// Give back the slot, e.g. to reopen it
    pub fn into_slot(self) -> S {
        self.slot
    }
}

impl<S: KeyValueSlot> std::fmt::Debug for LogStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("logs", &self.logs.len())
            .finish()
    }
}
