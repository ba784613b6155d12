use super::{DataMigration, MigrationConfiguration};
use crate::config::SeedConfig;
use crate::context::MigrationContext;
use crate::core::{Result, SeedError};
use crate::history::HistoryRecord;
use serde::Serialize;
use tracing::{debug, info, info_span};

/// What the runner did with one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationOutcome {
    /// Not recorded before; applied and recorded.
    Applied,
    /// Already recorded; only the cleanup hook ran.
    Skipped,
    /// Already recorded but flagged always-run; cleanup and apply both ran.
    Reapplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationEntry {
    pub migration_id: String,
    pub order: i32,
    pub outcome: MigrationOutcome,
}

/// Result of one [`MigrationRunner::apply_all`] call, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub context_key: String,
    pub entries: Vec<MigrationEntry>,
}

impl MigrationReport {
    fn new(context_key: &str) -> Self {
        Self {
            context_key: context_key.to_string(),
            entries: Vec::new(),
        }
    }

    fn ids_with(&self, outcome: MigrationOutcome) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == outcome)
            .map(|entry| entry.migration_id.as_str())
            .collect()
    }

    pub fn applied(&self) -> Vec<&str> {
        self.ids_with(MigrationOutcome::Applied)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.ids_with(MigrationOutcome::Skipped)
    }

    pub fn reapplied(&self) -> Vec<&str> {
        self.ids_with(MigrationOutcome::Reapplied)
    }
}

/// Applies data migrations at most once per (migration id, context key).
///
/// Migrations run one at a time in ascending `order()`. Each is looked up in
/// the history store first: recorded ones get their cleanup hook instead of
/// `apply`. Newly applied migrations are recorded after `apply` returns, so a
/// failure between the two re-applies the migration on the next run.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    context_key: String,
    config: SeedConfig,
}

impl MigrationRunner {
    pub fn new(context_key: impl Into<String>) -> Self {
        Self {
            context_key: context_key.into(),
            config: SeedConfig::default(),
        }
    }

    pub fn for_configuration<M: MigrationConfiguration>(configuration: &M) -> Self {
        Self {
            context_key: configuration.context_key(),
            config: configuration.settings(),
        }
    }

    pub fn with_config(mut self, config: SeedConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    pub fn apply_all<C, I>(&self, context: &mut C, migrations: I) -> Result<MigrationReport>
    where
        C: MigrationContext + ?Sized,
        I: IntoIterator<Item = Box<dyn DataMigration<C>>>,
    {
        let mut units: Vec<_> = migrations.into_iter().collect();
        // stable: equal orders keep their input sequence
        units.sort_by_key(|unit| unit.order());

        let span = info_span!("apply_all", context_key = %self.context_key, migrations = units.len());
        let _enter = span.enter();

        if self.config.ensure_history_table {
            context.history_store().ensure_schema()?;
        }

        let mut report = MigrationReport::new(&self.context_key);
        for unit in units {
            let outcome = self.apply_one(context, unit.as_ref())?;
            report.entries.push(MigrationEntry {
                migration_id: unit.migration_id(),
                order: unit.order(),
                outcome,
            });
        }

        info!(
            applied = report.applied().len(),
            skipped = report.skipped().len(),
            "data migrations finished"
        );
        Ok(report)
    }

    fn apply_one<C>(&self, context: &mut C, unit: &dyn DataMigration<C>) -> Result<MigrationOutcome>
    where
        C: MigrationContext + ?Sized,
    {
        let migration_id = unit.migration_id();
        let already_applied = context
            .history_store()
            .contains(&migration_id, &self.context_key)?;

        if already_applied {
            unit.cleanup(context)
                .map_err(|source| migration_error(&migration_id, source))?;
            if !unit.always_run() {
                debug!(migration = %migration_id, "already applied, skipped");
                return Ok(MigrationOutcome::Skipped);
            }
        }

        debug!(migration = %migration_id, order = unit.order(), "applying");
        unit.apply(context)
            .map_err(|source| migration_error(&migration_id, source))?;

        if already_applied {
            return Ok(MigrationOutcome::Reapplied);
        }

        context
            .history_store()
            .record(HistoryRecord::new(migration_id.as_str(), self.context_key.as_str()))?;
        info!(migration = %migration_id, "applied and recorded");
        Ok(MigrationOutcome::Applied)
    }
}

fn migration_error(migration_id: &str, source: anyhow::Error) -> SeedError {
    SeedError::Migration {
        migration: migration_id.to_string(),
        source,
    }
}
