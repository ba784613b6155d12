//! Data migrations: idempotent seeding and fix-up routines tracked in a
//! history store.

pub mod runner;

pub use runner::{MigrationEntry, MigrationOutcome, MigrationReport, MigrationRunner};

use crate::config::SeedConfig;
use crate::context::MigrationContext;
use crate::core::Result;

/// A named, ordered unit of data work bound to a context type `C`.
///
/// ```
/// use dataseed::{DataMigration, MemoryContext};
///
/// struct SeedCountries;
///
/// impl DataMigration<MemoryContext> for SeedCountries {
///     fn order(&self) -> i32 {
///         1
///     }
///
///     fn apply(&self, _context: &mut MemoryContext) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// assert_eq!(SeedCountries.migration_id(), "seedcountries");
/// ```
pub trait DataMigration<C: ?Sized> {
    /// Position in the run; lower values apply first.
    fn order(&self) -> i32;

    /// Identifier stored in the history table.
    ///
    /// Defaults to the lower-cased type name without module path.
    fn migration_id(&self) -> String {
        default_migration_id(std::any::type_name::<Self>())
    }

    /// Apply on every run, even when already recorded.
    fn always_run(&self) -> bool {
        false
    }

    fn apply(&self, context: &mut C) -> anyhow::Result<()>;

    /// Called instead of `apply` when the migration is already recorded.
    fn cleanup(&self, _context: &mut C) -> anyhow::Result<()> {
        Ok(())
    }
}

/// `my_app::seed::SeedUsers<T>` -> `seedusers`
pub fn default_migration_id(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let short = base.rsplit("::").next().unwrap_or(base);
    short.to_lowercase()
}

/// Ordered collection of migrations owned by one configuration.
pub struct MigrationSet<C: ?Sized> {
    migrations: Vec<Box<dyn DataMigration<C>>>,
}

impl<C: ?Sized> MigrationSet<C> {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn register(&mut self, migration: impl DataMigration<C> + 'static) {
        self.migrations.push(Box::new(migration));
    }

    pub fn with(mut self, migration: impl DataMigration<C> + 'static) -> Self {
        self.register(migration);
        self
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl<C: ?Sized> Default for MigrationSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> IntoIterator for MigrationSet<C> {
    type Item = Box<dyn DataMigration<C>>;
    type IntoIter = std::vec::IntoIter<Box<dyn DataMigration<C>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.into_iter()
    }
}

impl<C: ?Sized> FromIterator<Box<dyn DataMigration<C>>> for MigrationSet<C> {
    fn from_iter<I: IntoIterator<Item = Box<dyn DataMigration<C>>>>(iter: I) -> Self {
        Self {
            migrations: iter.into_iter().collect(),
        }
    }
}

/// Owner of a context's data migrations.
///
/// The configuration type's path is the context key recorded in the history
/// table, so two configurations over the same database keep separate
/// histories.
pub trait MigrationConfiguration: 'static {
    type Context: MigrationContext;

    fn context_key(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn settings(&self) -> SeedConfig {
        SeedConfig::default()
    }

    fn migrations(&self) -> MigrationSet<Self::Context>;

    /// Runs this configuration's migrations against `context`.
    fn seed(&self, context: &mut Self::Context) -> Result<MigrationReport>
    where
        Self: Sized,
    {
        MigrationRunner::for_configuration(self).apply_all(context, self.migrations())
    }
}
