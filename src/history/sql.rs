use super::{HistoryRecord, HistoryStore};
use crate::config::SeedConfig;
use crate::core::{Result, SeedError, Value};
use crate::result::QueryResult;
use async_trait::async_trait;
use log::debug;
use tokio::runtime::{Builder, Runtime};

/// SQL surface of the data context's connection.
///
/// Parameters are positional (`$1`, `$2`, ...).
#[async_trait]
pub trait SqlExecutor: Send {
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;
}

/// History table accessed through a [`SqlExecutor`].
///
/// The runner is synchronous, so every call blocks on the executor's future
/// with a private current-thread runtime. Do not use it from inside another
/// tokio runtime.
pub struct SqlHistoryStore<E> {
    executor: E,
    table: String,
    runtime: Runtime,
}

impl<E: SqlExecutor> SqlHistoryStore<E> {
    pub fn new(executor: E, config: &SeedConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SeedError::History(format!("failed to start runtime: {}", e)))?;

        Ok(Self {
            executor,
            table: config.history_table.clone(),
            runtime,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (MigrationId TEXT NOT NULL, ContextKey TEXT NOT NULL)",
            self.table
        )
    }

    fn lookup_sql(&self) -> String {
        format!(
            "SELECT MigrationId, ContextKey FROM {} WHERE MigrationId = $1 AND ContextKey = $2 LIMIT 1",
            self.table
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (MigrationId, ContextKey) VALUES ($1, $2)",
            self.table
        )
    }

    fn select_all_sql(&self) -> String {
        format!("SELECT MigrationId, ContextKey FROM {}", self.table)
    }
}

fn text_column(result: &QueryResult, row: usize, column: &str) -> Result<String> {
    match result.get(row, column) {
        Some(Value::Text(text)) => Ok(text.clone()),
        Some(other) => Err(SeedError::History(format!(
            "column {} holds {}, expected TEXT",
            column,
            other.type_name()
        ))),
        None => Err(SeedError::History(format!(
            "history query returned no {} column",
            column
        ))),
    }
}

impl<E: SqlExecutor> HistoryStore for SqlHistoryStore<E> {
    fn ensure_schema(&mut self) -> Result<()> {
        let sql = self.create_table_sql();
        debug!("ensuring history table: {}", sql);
        self.runtime.block_on(self.executor.execute(&sql, &[]))?;
        Ok(())
    }

    fn contains(&mut self, migration_id: &str, context_key: &str) -> Result<bool> {
        let sql = self.lookup_sql();
        let params = [Value::from(migration_id), Value::from(context_key)];
        let result = self.runtime.block_on(self.executor.query(&sql, &params))?;
        Ok(!result.is_empty())
    }

    fn record(&mut self, record: HistoryRecord) -> Result<()> {
        let sql = self.insert_sql();
        let params = [
            Value::Text(record.migration_id),
            Value::Text(record.context_key),
        ];
        self.runtime.block_on(self.executor.execute(&sql, &params))?;
        Ok(())
    }

    fn records(&mut self) -> Result<Vec<HistoryRecord>> {
        let sql = self.select_all_sql();
        let result = self.runtime.block_on(self.executor.query(&sql, &[]))?;
        (0..result.row_count())
            .map(|row| {
                Ok(HistoryRecord {
                    migration_id: text_column(&result, row, "MigrationId")?,
                    context_key: text_column(&result, row, "ContextKey")?,
                })
            })
            .collect()
    }
}
