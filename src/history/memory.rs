use super::{HistoryRecord, HistoryStore};
use crate::core::Result;

/// In-process history table.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    rows: Vec<HistoryRecord>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with rows written by an earlier run.
    pub fn with_records(records: impl IntoIterator<Item = HistoryRecord>) -> Self {
        Self {
            rows: records.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[HistoryRecord] {
        &self.rows
    }

    pub fn count(&self, migration_id: &str, context_key: &str) -> usize {
        self.rows
            .iter()
            .filter(|row| row.matches(migration_id, context_key))
            .count()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn ensure_schema(&mut self) -> Result<()> {
        Ok(())
    }

    fn contains(&mut self, migration_id: &str, context_key: &str) -> Result<bool> {
        Ok(self
            .rows
            .iter()
            .any(|row| row.matches(migration_id, context_key)))
    }

    fn record(&mut self, record: HistoryRecord) -> Result<()> {
        self.rows.push(record);
        Ok(())
    }

    fn records(&mut self) -> Result<Vec<HistoryRecord>> {
        Ok(self.rows.clone())
    }
}
