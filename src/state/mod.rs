/// State management module
///
/// This module handles the shot log, including:
/// - The log collection and its persistence (library.rs)
/// - Shared data structures (data.rs)
/// - New-shot drafts and edit buffers (edit.rs)
/// - Key-value slot backends (slot.rs)

pub mod data;
pub mod edit;
pub mod library;
pub mod slot;

pub use data::{ShotLog, ShotLogPatch};
pub use edit::{LogEditor, ShotDraft};
pub use library::{LogStore, SaveStatus, LOG_SLOT_KEY};
pub use slot::{KeyValueSlot, MemorySlot, SqliteSlot};
