//! Persisted record of which data migrations ran against which context.

pub mod memory;
pub mod sql;

pub use memory::MemoryHistoryStore;
pub use sql::{SqlExecutor, SqlHistoryStore};

use crate::core::Result;
use serde::{Deserialize, Serialize};

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryRecord {
    pub migration_id: String,
    pub context_key: String,
}

impl HistoryRecord {
    pub fn new(migration_id: impl Into<String>, context_key: impl Into<String>) -> Self {
        Self {
            migration_id: migration_id.into(),
            context_key: context_key.into(),
        }
    }

    pub fn matches(&self, migration_id: &str, context_key: &str) -> bool {
        self.migration_id == migration_id && self.context_key == context_key
    }
}

/// Storage for [`HistoryRecord`]s.
///
/// The store enforces no uniqueness: recording the same pair twice leaves
/// two rows, exactly like the backing table.
pub trait HistoryStore {
    /// Creates the backing table if the store needs one.
    fn ensure_schema(&mut self) -> Result<()>;

    fn contains(&mut self, migration_id: &str, context_key: &str) -> Result<bool>;

    fn record(&mut self, record: HistoryRecord) -> Result<()>;

    fn records(&mut self) -> Result<Vec<HistoryRecord>>;
}
